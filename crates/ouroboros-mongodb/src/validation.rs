//! Field path validation
//!
//! Filter field names and search schema paths are user input that ends up as
//! document keys. A key starting with `$` would be read by MongoDB as an
//! operator, so such names are rejected before anything is built.

use crate::Result;
use ouroboros_common::DataBridgeError;

/// Maximum allowed length for a field path, in bytes
pub const MAX_FIELD_PATH_LENGTH: usize = 1024;

/// Check that a dotted field path is safe to use as a document key.
///
/// # Errors
///
/// Returns `DataBridgeError::Validation` if the path is empty or whitespace
/// only, longer than [`MAX_FIELD_PATH_LENGTH`] bytes, contains a null byte,
/// or starts with `$`.
pub fn validate_field_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(DataBridgeError::Validation(
            "Field name cannot be empty".to_string(),
        ));
    }

    if path.len() > MAX_FIELD_PATH_LENGTH {
        return Err(DataBridgeError::Validation(format!(
            "Field name exceeds maximum length of {} characters",
            MAX_FIELD_PATH_LENGTH
        )));
    }

    if path.contains('\0') {
        return Err(DataBridgeError::Validation(
            "Field name cannot contain null bytes".to_string(),
        ));
    }

    if path.starts_with('$') {
        tracing::debug!(path, "Rejected operator-like field name");
        return Err(DataBridgeError::Validation(format!(
            "Field name cannot start with '$' (reserved for operators): '{}'",
            path
        )));
    }

    Ok(())
}
