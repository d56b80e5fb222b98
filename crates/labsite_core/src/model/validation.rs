//! Field validation shared by collection records.
//!
//! # Invariants
//! - Required text fields are non-blank after trim.
//! - Optional links are either empty or absolute `http(s)` URLs.
//! - A DOI, when present, follows `10.<registrant>/<suffix>`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static HTTP_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));
static DOI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^10\.\d{4,9}/\S+$").expect("valid doi regex"));

/// Rejected record content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Required field is blank after trim.
    BlankField(&'static str),
    /// Field must be an absolute http(s) URL.
    InvalidUrl { field: &'static str, value: String },
    /// DOI does not match `10.<registrant>/<suffix>`.
    InvalidDoi(String),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidUrl { field, value } => {
                write!(f, "`{field}` must be an http(s) URL, got `{value}`")
            }
            Self::InvalidDoi(value) => write!(f, "invalid DOI `{value}`"),
        }
    }
}

impl Error for RecordValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), RecordValidationError> {
    if value.trim().is_empty() {
        return Err(RecordValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn check_url(field: &'static str, value: &str) -> Result<(), RecordValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || HTTP_URL_RE.is_match(trimmed) {
        return Ok(());
    }
    Err(RecordValidationError::InvalidUrl {
        field,
        value: trimmed.to_string(),
    })
}

pub(crate) fn check_optional_url(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), RecordValidationError> {
    value.map_or(Ok(()), |value| check_url(field, value))
}

pub(crate) fn check_doi(value: &str) -> Result<(), RecordValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || DOI_RE.is_match(trimmed) {
        return Ok(());
    }
    Err(RecordValidationError::InvalidDoi(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{check_doi, check_optional_url, check_url, require_text, RecordValidationError};

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            require_text("title", "   ").unwrap_err(),
            RecordValidationError::BlankField("title")
        );
        assert!(require_text("title", "Postdoc").is_ok());
    }

    #[test]
    fn urls_must_be_http() {
        assert!(check_url("hyperlink", "").is_ok());
        assert!(check_url("hyperlink", "https://lab.example.org/people").is_ok());
        assert!(check_optional_url("image_url", None).is_ok());
        assert!(matches!(
            check_url("hyperlink", "ftp://example.org"),
            Err(RecordValidationError::InvalidUrl { field: "hyperlink", .. })
        ));
    }

    #[test]
    fn doi_shape_is_checked() {
        assert!(check_doi("10.1038/s41586-020-2649-2").is_ok());
        assert!(check_doi("").is_ok());
        assert_eq!(
            check_doi("doi:abc").unwrap_err(),
            RecordValidationError::InvalidDoi("doi:abc".to_string())
        );
    }
}
