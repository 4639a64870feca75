//! OpenAPI document served at `/api-docs/openapi.json`.
//!
//! Health is described through the derive; the entity collections share one
//! route shape, so their paths are generated per entity with the builders.

use models::{Entity, Item, Order, Product, Review, User};
use utoipa::openapi::path::{OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathItemType};
use utoipa::openapi::{OpenApi as OpenApiDoc, Required, ResponseBuilder};
use utoipa::{OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Inventory API", description = "In-memory inventory and order management"),
    paths(crate::routes::health),
    components(schemas(HealthResponse, ErrorResponse)),
    tags(
        (name = "health"),
        (name = "items"),
        (name = "users"),
        (name = "products"),
        (name = "orders"),
        (name = "reviews")
    )
)]
pub struct ApiDoc;

struct Op {
    method: PathItemType,
    id: &'static str,
    summary: String,
    success: (&'static str, &'static str),
    path_id: bool,
    query: &'static [&'static str],
}

fn operation<E: Entity>(op: Op) -> utoipa::openapi::path::Operation {
    let mut builder = OperationBuilder::new()
        .tags(Some(vec![E::PLURAL.to_string()]))
        .operation_id(Some(format!("{}_{}", E::PLURAL, op.id)))
        .summary(Some(op.summary))
        .response(op.success.0, ResponseBuilder::new().description(op.success.1).build())
        .response("400", ResponseBuilder::new().description("Validation failed").build());
    if op.path_id {
        builder = builder
            .parameter(
                ParameterBuilder::new()
                    .name("id")
                    .parameter_in(ParameterIn::Path)
                    .required(Required::True)
                    .description(Some("Positive integer id"))
                    .build(),
            )
            .response("404", ResponseBuilder::new().description("Not found").build());
    }
    for name in op.query {
        builder = builder.parameter(
            ParameterBuilder::new()
                .name(*name)
                .parameter_in(ParameterIn::Query)
                .required(Required::False)
                .build(),
        );
    }
    builder.build()
}

fn op(
    method: PathItemType,
    id: &'static str,
    summary: String,
    success: (&'static str, &'static str),
    path_id: bool,
    query: &'static [&'static str],
) -> Op {
    Op { method, id, summary, success, path_id, query }
}

fn group<E: Entity>(ops: Vec<Op>) -> PathItem {
    let mut item = PathItem::default();
    for o in ops {
        item.operations.insert(o.method.clone(), operation::<E>(o));
    }
    item
}

/// Path items of one collection, keyed by their full path.
fn entity_paths<E: Entity>() -> Vec<(String, PathItem)> {
    let base = format!("/api/{}", E::PLURAL);
    let name = E::NAME;
    let plural = E::PLURAL;

    vec![
        (
            base.clone(),
            group::<E>(vec![
                op(PathItemType::Get, "list", format!("List {plural}"), ("200", "Matching records; total in X-Total-Count"), false, &["sort", "order", "page", "limit"]),
                op(PathItemType::Post, "create", format!("Create a {name}"), ("201", "Created record"), false, &[]),
            ]),
        ),
        (
            format!("{base}/stats"),
            group::<E>(vec![op(PathItemType::Get, "stats", format!("{name} statistics"), ("200", "Aggregates"), false, &[])]),
        ),
        (
            format!("{base}/search"),
            group::<E>(vec![op(PathItemType::Get, "search", format!("Search {plural}"), ("200", "Matching records"), false, &["q"])]),
        ),
        (
            format!("{base}/audit"),
            group::<E>(vec![op(PathItemType::Get, "audit", format!("Recent {plural} changes"), ("200", "Audit entries, newest first"), false, &["limit"])]),
        ),
        (
            format!("{base}/bulk"),
            group::<E>(vec![
                op(PathItemType::Post, "bulk_create", format!("Create many {plural}"), ("200", "Per-element outcome"), false, &["atomic"]),
                op(PathItemType::Patch, "bulk_update", format!("Update many {plural}"), ("200", "Per-element outcome"), false, &["atomic"]),
                op(PathItemType::Delete, "bulk_delete", format!("Delete many {plural}"), ("200", "Per-element outcome"), false, &["atomic"]),
            ]),
        ),
        (
            format!("{base}/{{id}}"),
            group::<E>(vec![
                op(PathItemType::Get, "get", format!("Get a {name}"), ("200", "The record"), true, &[]),
                op(PathItemType::Put, "replace", format!("Update a {name}"), ("200", "Updated record"), true, &[]),
                op(PathItemType::Patch, "update", format!("Partially update a {name}"), ("200", "Updated record"), true, &[]),
                op(PathItemType::Delete, "delete", format!("Delete a {name}"), ("204", "Deleted"), true, &[]),
            ]),
        ),
    ]
}

pub fn api_doc() -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();
    doc.paths.paths.extend(entity_paths::<Item>());
    doc.paths.paths.extend(entity_paths::<User>());
    doc.paths.paths.extend(entity_paths::<Product>());
    doc.paths.paths.extend(entity_paths::<Order>());
    doc.paths.paths.extend(entity_paths::<Review>());
    doc
}
