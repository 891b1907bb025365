//! Error types for Rolodex operations

use crate::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
///
/// The BaaS reports failures with a generic `{message}` body; those surface
/// as `RequestFailed` with the HTTP status attached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Row not found in {table}: {id}")]
    NotFound { table: Table, id: Uuid },

    #[error("Duplicate key in {table}: {id}")]
    DuplicateKey { table: Table, id: Uuid },

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Transport error: {reason}")]
    Transport { reason: String },

    #[error("Failed to decode {table} row: {reason}")]
    Decode { table: Table, reason: String },

    #[error("Upload to bucket {bucket} failed: {reason}")]
    Upload { bucket: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// A single failed form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("At least one field must be provided for update")]
    EmptyUpdate,

    #[error("Validation failed: {}", join_fields(.0))]
    Fields(Vec<FieldError>),
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Field-level breakdown of this error.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            ValidationError::RequiredFieldMissing { field } => {
                vec![FieldError::new(field.clone(), "is required")]
            }
            ValidationError::InvalidValue { field, reason } => {
                vec![FieldError::new(field.clone(), reason.clone())]
            }
            ValidationError::EmptyUpdate => Vec::new(),
            ValidationError::Fields(fields) => fields.clone(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Authentication errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No credentials provided")]
    MissingCredentials,

    #[error("Invalid access token: {reason}")]
    InvalidToken { reason: String },

    #[error("Unknown or expired OAuth state")]
    UnknownState,

    #[error("Code exchange failed: {reason}")]
    ExchangeFailed { reason: String },

    #[error("Auth provider unavailable: {reason}")]
    ProviderUnavailable { reason: String },
}

/// Master error type for all Rolodex errors.
#[derive(Debug, Clone, Error)]
pub enum RolodexError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Result type alias for Rolodex operations.
pub type RolodexResult<T> = Result<T, RolodexError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            table: Table::Contacts,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("contacts"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_request_failed_carries_message() {
        let err = StorageError::RequestFailed {
            status: 409,
            message: "duplicate key value violates unique constraint".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("409"));
        assert!(msg.contains("duplicate key"));
    }

    #[test]
    fn test_validation_fields_display() {
        let err = ValidationError::Fields(vec![
            FieldError::new("email", "is required"),
            FieldError::new("tag_ids", "at most 3 tags"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("email: is required"));
        assert!(msg.contains("tag_ids: at most 3 tags"));
        assert_eq!(err.field_errors().len(), 2);
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "ROLODEX_BAAS_URL".to_string(),
            value: "bad".to_string(),
            reason: "must be an absolute http(s) URL".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("ROLODEX_BAAS_URL"));
        assert!(msg.contains("bad"));
    }

    #[test]
    fn test_rolodex_error_from_variants() {
        let storage = RolodexError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, RolodexError::Storage(_)));

        let validation = RolodexError::from(ValidationError::EmptyUpdate);
        assert!(matches!(validation, RolodexError::Validation(_)));

        let config = RolodexError::from(ConfigError::MissingRequired {
            field: "ROLODEX_BAAS_ANON_KEY".to_string(),
        });
        assert!(matches!(config, RolodexError::Config(_)));

        let auth = RolodexError::from(AuthError::MissingCredentials);
        assert!(matches!(auth, RolodexError::Auth(_)));
    }
}
