//! Column limits shared by handlers and the schema in `migrations/`.

use crate::error::AppError;

pub const MAX_NAME_LENGTH: usize = 60;
pub const MAX_USERNAME_LENGTH: usize = 20;
pub const MAX_EMAIL_LENGTH: usize = 128;
pub const MAX_SOURCE_LENGTH: usize = 60;
pub const MAX_SENTIMENT_LENGTH: usize = 60;

/// Postgres counts VARCHAR limits in characters, not bytes.
pub fn max_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Same as [`max_len`] for fields of a partial update.
pub fn max_len_opt(field: &str, value: Option<&str>, max: usize) -> Result<(), AppError> {
    value.map_or(Ok(()), |v| max_len(field, v, max))
}
