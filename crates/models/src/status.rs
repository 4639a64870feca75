//! Enumerated string fields: entity statuses and user roles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::EnumField;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $field:literal, default $default:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl Default for $name {
            fn default() -> Self { Self::$default }
        }

        impl EnumField for $name {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self { $(Self::$variant => $text),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    ItemStatus as "status", default Active {
        Active => "active",
        Inactive => "inactive",
        Archived => "archived",
    }
}

string_enum! {
    UserStatus as "status", default Active {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

string_enum! {
    UserRole as "role", default User {
        Admin => "admin",
        Manager => "manager",
        User => "user",
    }
}

string_enum! {
    ProductStatus as "status", default Active {
        Active => "active",
        Inactive => "inactive",
        Discontinued => "discontinued",
    }
}

string_enum! {
    /// Order lifecycle. `Cancelled` orders are excluded from revenue.
    OrderStatus as "status", default Pending {
        Pending => "pending",
        Processing => "processing",
        Shipped => "shipped",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    ReviewStatus as "status", default Pending {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_lowercase_text() {
        assert_eq!(serde_json::to_value(OrderStatus::Shipped).unwrap(), "shipped");
        assert_eq!(UserRole::default(), UserRole::User);
        assert_eq!(ReviewStatus::Rejected.to_string(), "rejected");
        assert_eq!(OrderStatus::allowed(), "pending, processing, shipped, completed, cancelled");
    }
}
