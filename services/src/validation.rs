//! Field rules for post and tag input.
//!
//! Lengths are counted in characters (Unicode scalar values) to line up with
//! the `VARCHAR(255)` columns.

use crate::error::ServiceError;

/// Maximum length of a post title or tag label.
pub const MAX_LEN: usize = 255;

fn require_non_blank(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_max_len(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.chars().count() > MAX_LEN {
        return Err(ServiceError::Validation(format!(
            "{field} must be at most {MAX_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ServiceError> {
    require_non_blank("title", title)?;
    require_max_len("title", title)
}

pub fn validate_content(content: &str) -> Result<(), ServiceError> {
    require_non_blank("content", content)
}

/// Labels are stored as given; this only rejects, it never normalizes.
pub fn validate_label(label: &str) -> Result<(), ServiceError> {
    require_non_blank("label", label)?;
    require_max_len("label", label)
}
