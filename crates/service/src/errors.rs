use models::errors::ValidationError;
use thiserror::Error;

/// Typed failure of an entity operation. The message is passed to clients unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn not_found(entity: &str, id: u64) -> Self {
        Self::NotFound(format!("{entity} with id {id} not found"))
    }

    /// HTTP status classification.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Internal(_) => 500,
        }
    }

    /// Short label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }

    /// Same classification, message prefixed with the batch position.
    pub fn at_index(self, index: usize) -> Self {
        let wrap = |msg: String| format!("Error at index {index}: {msg}");
        match self {
            Self::Validation(m) => Self::Validation(wrap(m)),
            Self::NotFound(m) => Self::NotFound(wrap(m)),
            Self::Internal(m) => Self::Internal(wrap(m)),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self { Self::Validation(e.message) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_and_index_prefix() {
        let e = ServiceError::not_found("Item", 999);
        assert_eq!(e.to_string(), "Item with id 999 not found");
        assert_eq!(e.status_code(), 404);
        let e = ServiceError::validation("name is required").at_index(3);
        assert_eq!(e, ServiceError::Validation("Error at index 3: name is required".into()));
        assert_eq!(ServiceError::from(ValidationError::new("bad")).status_code(), 400);
    }
}
