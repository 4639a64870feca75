use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{bump, Entity, SortValue, UniqueKey};
use crate::errors::ValidationError;
use crate::status::{UserRole, UserStatus};
use crate::validation::{self as v, EnumField};

pub const NAME_MAX: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    /// Always stored lower-cased; unique.
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserInput {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub role: Option<Value>,
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_role: BTreeMap<String, usize>,
}

impl Entity for User {
    type Create = UserInput;
    type Patch = UserInput;
    type Stats = UserStats;

    const NAME: &'static str = "User";
    const PLURAL: &'static str = "users";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name", "email"];
    const FILTER_FIELDS: &'static [&'static str] = &["status", "role"];
    const SORT_FIELDS: &'static [&'static str] = &["id", "name", "email", "role", "status", "createdAt", "updatedAt"];

    crate::record_meta!();

    fn from_create(id: u64, input: UserInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: v::required_string("name", input.name.as_ref(), NAME_MAX)?,
            email: v::email("email", input.email.as_ref())?,
            role: match &input.role {
                Some(raw) => v::enum_value(Some(raw))?,
                None => UserRole::default(),
            },
            status: match &input.status {
                Some(raw) => v::enum_value(Some(raw))?,
                None => UserStatus::default(),
            },
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: UserInput) -> Result<Vec<&'static str>, ValidationError> {
        let mut changed = Vec::new();
        if let Some(raw) = &patch.name {
            self.name = v::required_string("name", Some(raw), NAME_MAX)?;
            changed.push("name");
        }
        if let Some(raw) = &patch.email {
            self.email = v::email("email", Some(raw))?;
            changed.push("email");
        }
        if let Some(raw) = &patch.role {
            self.role = v::enum_value(Some(raw))?;
            changed.push("role");
        }
        if let Some(raw) = &patch.status {
            self.status = v::enum_value(Some(raw))?;
            changed.push("status");
        }
        Ok(changed)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("email", &self.email)]
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "status" => Some(self.status.as_str().to_string()),
            "role" => Some(self.role.as_str().to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "id" => SortValue::Int(self.id as i64),
            "name" => SortValue::text(&self.name),
            "email" => SortValue::text(&self.email),
            "role" => SortValue::text(self.role.as_str()),
            "status" => SortValue::text(self.status.as_str()),
            "createdAt" => SortValue::Time(self.created_at),
            "updatedAt" => SortValue::Time(self.updated_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str()]
    }

    fn stats(records: &[Self]) -> UserStats {
        let mut stats = UserStats { total: records.len(), ..Default::default() };
        for user in records {
            bump(&mut stats.by_status, user.status.as_str());
            bump(&mut stats.by_role, user.role.as_str());
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> UserInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn email_is_normalized_and_role_defaults() {
        let user = User::from_create(1, input(json!({"name": "Ann", "email": "ANN@Example.org"})), Utc::now()).unwrap();
        assert_eq!(user.email, "ann@example.org");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.unique_keys(), vec![UniqueKey::new("email", "ann@example.org")]);
    }

    #[test]
    fn invalid_role_lists_choices() {
        let err = User::from_create(1, input(json!({"name": "Ann", "email": "a@b.co", "role": "root"})), Utc::now())
            .unwrap_err();
        assert_eq!(err.message, "Invalid role. Must be one of: admin, manager, user");
    }
}
