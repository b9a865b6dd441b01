//! Error types for ouroboros

use thiserror::Error;

/// Result type alias for ouroboros operations
pub type Result<T> = std::result::Result<T, DataBridgeError>;

/// Unified error type for all ouroboros builders
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataBridgeError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Search schema errors

    /// Field path is not declared in the search model
    #[error("Field '{field}' is not defined in {model}")]
    UndefinedField { field: String, model: String },

    /// Field is declared but lacks the capability the operation needs
    #[error("Field '{field}' is not configured for {operation} operations")]
    UnsupportedOperation { field: String, operation: String },

    /// Text search requires the string index flag specifically
    #[error("Field '{field}' must have string_index enabled for text search")]
    InvalidTextSearchField { field: String },
}

impl DataBridgeError {
    /// Returns true if this error came from search schema validation
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            DataBridgeError::UndefinedField { .. }
                | DataBridgeError::UnsupportedOperation { .. }
                | DataBridgeError::InvalidTextSearchField { .. }
        )
    }

    /// Field path the error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            DataBridgeError::UndefinedField { field, .. }
            | DataBridgeError::UnsupportedOperation { field, .. }
            | DataBridgeError::InvalidTextSearchField { field } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DataBridgeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            DataBridgeError::Deserialization(err.to_string())
        } else {
            DataBridgeError::Serialization(err.to_string())
        }
    }
}

// BSON error conversions (when bson-errors feature is enabled)
#[cfg(feature = "bson-errors")]
impl From<bson::ser::Error> for DataBridgeError {
    fn from(err: bson::ser::Error) -> Self {
        DataBridgeError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "bson-errors")]
impl From<bson::de::Error> for DataBridgeError {
    fn from(err: bson::de::Error) -> Self {
        DataBridgeError::Deserialization(format!("BSON deserialization error: {}", err))
    }
}
