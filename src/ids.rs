use uuid::Uuid;

use crate::error::AppError;

/// Parses a path segment into the canonical id type.
///
/// Hyphenated, simple, braced and urn forms in any letter case all yield the same
/// [`Uuid`], so every later comparison is between values of one type.
pub fn parse_id(kind: &'static str, raw: &str) -> Result<Uuid, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidId {
            kind,
            raw: raw.to_string(),
        });
    }
    Uuid::parse_str(trimmed).map_err(|_| AppError::InvalidId {
        kind,
        raw: raw.to_string(),
    })
}
