//! Generic HTTP handlers shared by every entity collection.
//!
//! Handlers only decode the request, check that required input is present and
//! translate service outcomes into status codes. All rules live in the services.

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::Entity;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use service::{parse_id, BulkMode, DynCrud, ListQuery};

use crate::errors::ApiError;

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
pub const DEFAULT_AUDIT_LIMIT: usize = 50;

type Params = Query<HashMap<String, String>>;
type Body = Result<Json<Value>, JsonRejection>;
type IdPath = Result<Path<String>, PathRejection>;

fn object(body: Body) -> Result<Map<String, Value>, ApiError> {
    let Json(value) = body.map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e.body_text())))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))
}

/// Pull the array stored under `key`, as bulk bodies carry their elements.
fn array(mut body: Map<String, Value>, key: &str) -> Result<Vec<Value>, ApiError> {
    match body.remove(key) {
        Some(Value::Array(values)) => Ok(values),
        _ => Err(ApiError::bad_request(format!("{key} must be an array"))),
    }
}

/// Undecodable path segments (e.g. invalid percent escapes) are reported like any other bad id.
fn path_id(path: IdPath) -> Result<u64, ApiError> {
    let Path(raw) = path.map_err(|_| ApiError::bad_request("Invalid id: must be a positive integer"))?;
    Ok(parse_id(&raw)?)
}

fn bulk_mode(params: &HashMap<String, String>) -> Result<BulkMode, ApiError> {
    match params.get("atomic").map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(BulkMode::Independent),
        Some("true") | Some("1") => Ok(BulkMode::Atomic),
        Some(_) => Err(ApiError::bad_request("atomic must be true or false")),
    }
}

pub async fn list<E: Entity>(State(crud): State<DynCrud<E>>, Query(params): Params) -> Result<Response, ApiError> {
    let query = ListQuery::from_params(&params)?;
    let listing = crud.get_all(query).await?;
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(listing.total));
    Ok((headers, Json(listing.records)).into_response())
}

pub async fn get_one<E: Entity>(State(crud): State<DynCrud<E>>, path: IdPath) -> Result<Json<E>, ApiError> {
    let id = path_id(path)?;
    Ok(Json(crud.get_by_id(id).await?))
}

pub async fn create<E: Entity>(State(crud): State<DynCrud<E>>, body: Body) -> Result<Response, ApiError> {
    let body = object(body)?;
    let missing = E::REQUIRED_FIELDS
        .iter()
        .find(|field| body.get(**field).map_or(true, Value::is_null));
    if let Some(field) = missing {
        return Err(ApiError::bad_request(format!("Missing required field: {field}")));
    }
    let input: E::Create = decode(Value::Object(body))?;
    let record = crud.create(input).await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub async fn update<E: Entity>(
    State(crud): State<DynCrud<E>>,
    path: IdPath,
    body: Body,
) -> Result<Json<E>, ApiError> {
    let id = path_id(path)?;
    let patch: E::Patch = decode(Value::Object(object(body)?))?;
    Ok(Json(crud.update(id, patch).await?))
}

pub async fn remove<E: Entity>(State(crud): State<DynCrud<E>>, path: IdPath) -> Result<StatusCode, ApiError> {
    let id = path_id(path)?;
    crud.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats<E: Entity>(State(crud): State<DynCrud<E>>) -> Json<E::Stats> {
    Json(crud.stats().await)
}

/// `q` must be present; a blank value yields an empty list.
pub async fn search<E: Entity>(State(crud): State<DynCrud<E>>, Query(params): Params) -> Result<Json<Vec<E>>, ApiError> {
    let q = params
        .get("q")
        .cloned()
        .ok_or_else(|| ApiError::bad_request("Query parameter q is required"))?;
    Ok(Json(crud.search(Some(q)).await))
}

pub async fn audit<E: Entity>(State(crud): State<DynCrud<E>>, Query(params): Params) -> Result<Response, ApiError> {
    let limit = match params.get("limit").map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => DEFAULT_AUDIT_LIMIT,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => return Err(ApiError::bad_request("limit must be a positive integer")),
        },
    };
    Ok(Json(crud.audit_log(limit).await).into_response())
}

/// Body: `{"<plural>": [payload, ...]}`.
pub async fn bulk_create<E: Entity>(
    State(crud): State<DynCrud<E>>,
    Query(params): Params,
    body: Body,
) -> Result<Response, ApiError> {
    let mode = bulk_mode(&params)?;
    // 单个元素的解码错误由服务层按下标报告
    let inputs = array(object(body)?, E::PLURAL)?;
    let outcome = crud.bulk_create(inputs, mode).await?;
    Ok(Json(outcome).into_response())
}

/// Body: `{"updates": [{"id": 1, "changes": {...}}, ...]}`.
pub async fn bulk_update<E: Entity>(
    State(crud): State<DynCrud<E>>,
    Query(params): Params,
    body: Body,
) -> Result<Response, ApiError> {
    let mode = bulk_mode(&params)?;
    let changes = array(object(body)?, "updates")?;
    let outcome = crud.bulk_update(changes, mode).await?;
    Ok(Json(outcome).into_response())
}

/// Body: `{"ids": [1, 2, ...]}`.
pub async fn bulk_delete<E: Entity>(
    State(crud): State<DynCrud<E>>,
    Query(params): Params,
    body: Body,
) -> Result<Response, ApiError> {
    let mode = bulk_mode(&params)?;
    let ids = array(object(body)?, "ids")?;
    let outcome = crud.bulk_delete(ids, mode).await?;
    Ok(Json(outcome).into_response())
}
