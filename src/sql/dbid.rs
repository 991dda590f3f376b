//! Database-id validation: the id becomes a filename component, so it must
//! be safe against path traversal.

use crate::error::{Error, Result};

/// Maximum length, in bytes, of a database id.
pub const MAX_DATABASE_ID_BYTES: usize = 128;

/// Validates a database id: non-empty, at most 128 bytes, no
/// `..`, no `/` or `\`, no NUL byte.
///
/// # Errors
/// Returns a validation error naming which rule was violated.
pub fn validate_database_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::validation("database id must not be empty"));
    }
    if id.len() > MAX_DATABASE_ID_BYTES {
        return Err(Error::validation(format!(
            "database id exceeds {MAX_DATABASE_ID_BYTES} bytes"
        )));
    }
    if id.contains("..") {
        return Err(Error::validation("database id must not contain '..'"));
    }
    if id.contains('/') || id.contains('\\') {
        return Err(Error::validation(
            "database id must not contain '/' or '\\'",
        ));
    }
    if id.contains('\0') {
        return Err(Error::validation("database id must not contain a NUL byte"));
    }
    Ok(())
}

/// Builds the on-disk path for `database_id` under `data_dir`, per the
/// `{data-dir}/sql/{database-id}.db` layout.
///
/// # Errors
/// Returns a validation error if `database_id` itself is invalid.
pub fn database_path(data_dir: &std::path::Path, database_id: &str) -> Result<std::path::PathBuf> {
    validate_database_id(database_id)?;
    Ok(data_dir.join("sql").join(format!("{database_id}.db")))
}
