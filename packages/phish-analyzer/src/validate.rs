//! Input validation, applied before any I/O.
//!
//! Deliberately shallow: no URL parsing happens here. A string that passes
//! but is not a real URL fails later at fetch time.

use crate::error::ValidationError;

/// Shortest URL accepted, in characters.
pub const MIN_URL_LEN: usize = 10;

const PLACEHOLDERS: [&str; 2] = ["https://", "http://"];

/// Validate a URL. Rules are applied in order and the first failure wins:
///
/// 1. empty, or just the scheme placeholder → [`ValidationError::MissingUrl`]
/// 2. no `http://` / `https://` prefix → [`ValidationError::MissingScheme`]
/// 3. fewer than [`MIN_URL_LEN`] characters → [`ValidationError::TooShort`]
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() || PLACEHOLDERS.contains(&url) {
        return Err(ValidationError::MissingUrl);
    }

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::MissingScheme);
    }

    if url.chars().count() < MIN_URL_LEN {
        return Err(ValidationError::TooShort);
    }

    Ok(())
}

/// Validate a model name: anything non-blank.
pub fn validate_model_name(model: &str) -> Result<(), ValidationError> {
    if model.trim().is_empty() {
        return Err(ValidationError::MissingModel);
    }
    Ok(())
}
