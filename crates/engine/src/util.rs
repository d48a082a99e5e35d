//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Trim free text and drop it when empty.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Append a note on a new line, keeping previous notes.
pub(crate) fn append_note(existing: Option<String>, extra: Option<String>) -> Option<String> {
    match (existing, extra) {
        (Some(existing), Some(extra)) => Some(format!("{existing}\n{extra}")),
        (existing, None) => existing,
        (None, extra) => extra,
    }
}
