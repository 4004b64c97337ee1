//! Application-level error type returned by every boundary operation.
//!
//! `AppError` is serialized to `{ kind, message }` JSON payloads so an HTTP
//! layer or the CLI can pattern-match on a stable `kind` string.

use crate::pricing::PricingError;
use crate::store::StoreError;
use crate::svg::SvgError;

/// Top-level error returned by the `commands` operations.
///
/// Serialized with serde's adjacently-tagged representation:
/// `{ "kind": "<variant>", "message": "<human-readable text>" }`
#[derive(Debug, thiserror::Error, serde::Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum AppError {
    /// A required input file does not exist on disk.
    #[error("file not found")]
    FileNotFound,

    /// The uploaded markup could not be parsed or has no `<svg>` root.
    #[error("{0}")]
    MalformedDocument(String),

    /// The configuration snapshot could not be loaded. Retryable.
    #[error("{0}")]
    ConfigUnavailable(String),

    /// The configuration snapshot loaded but is invalid.
    #[error("{0}")]
    InvalidConfig(String),

    /// The technology cannot process the material at the requested thickness.
    #[error("{0}")]
    Incompatible(String),

    /// A requested analysis or quote was not found.
    #[error("{0}")]
    NotFound(String),

    /// The persistence backend failed.
    #[error("{0}")]
    Store(String),

    /// A generic I/O error; stringified so it remains serializable.
    #[error("{0}")]
    Io(String),
}

impl From<SvgError> for AppError {
    fn from(e: SvgError) -> Self {
        match e {
            SvgError::MalformedDocument(_) => Self::MalformedDocument(e.to_string()),
        }
    }
}

impl From<PricingError> for AppError {
    /// Each pricing failure keeps its own `kind` so callers can tell a
    /// retryable outage from a bad selection.
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::ConfigUnavailable(_) => Self::ConfigUnavailable(e.to_string()),
            PricingError::Config(_) => Self::InvalidConfig(e.to_string()),
            PricingError::Incompatible(_) => Self::Incompatible(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound(e.to_string()),
            StoreError::Backend(_) => Self::Store(e.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    /// Convert an [`std::io::Error`] into an [`AppError::Io`].
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_document_serializes_to_kind_message() {
        let err = AppError::MalformedDocument("unexpected end of stream".to_string());
        let value = serde_json::to_value(&err).expect("serialize AppError::MalformedDocument");
        assert_eq!(value["kind"], "MalformedDocument");
        assert_eq!(value["message"], "unexpected end of stream");
    }

    #[test]
    fn file_not_found_serializes_with_kind() {
        let err = AppError::FileNotFound;
        let value = serde_json::to_value(&err).expect("serialize AppError::FileNotFound");
        assert_eq!(value["kind"], "FileNotFound");
    }

    #[test]
    fn from_svg_error_produces_malformed_document_variant() {
        let app_err = AppError::from(SvgError::MalformedDocument("root is <html>".to_string()));
        assert!(matches!(app_err, AppError::MalformedDocument(_)));
        let value = serde_json::to_value(&app_err).expect("serialize");
        assert_eq!(value["kind"], "MalformedDocument");
        assert_eq!(value["message"], "malformed document: root is <html>");
    }

    #[test]
    fn from_pricing_error_keeps_distinct_kinds() {
        let cases = [
            (
                PricingError::ConfigUnavailable("store offline".to_string()),
                "ConfigUnavailable",
            ),
            (
                PricingError::Config("overlapping tiers".to_string()),
                "InvalidConfig",
            ),
            (
                PricingError::Incompatible("too thick".to_string()),
                "Incompatible",
            ),
        ];
        for (err, kind) in cases {
            let value = serde_json::to_value(AppError::from(err)).expect("serialize");
            assert_eq!(value["kind"], kind);
        }
    }

    #[test]
    fn from_store_error_maps_not_found_and_backend() {
        let nf = AppError::from(StoreError::NotFound("quote 1".to_string()));
        assert!(matches!(nf, AppError::NotFound(_)));
        let be = AppError::from(StoreError::Backend("down".to_string()));
        assert!(matches!(be, AppError::Store(_)));
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let app_err = AppError::from(io_err);
        assert!(matches!(app_err, AppError::Io(_)));
        let value = serde_json::to_value(&app_err).expect("serialize");
        assert_eq!(value["kind"], "Io");
    }

    #[test]
    fn app_error_display_is_human_readable() {
        assert_eq!(AppError::FileNotFound.to_string(), "file not found");
        assert_eq!(
            AppError::Io("access denied".to_string()).to_string(),
            "access denied"
        );
        assert_eq!(
            AppError::from(PricingError::ConfigUnavailable("timeout".to_string())).to_string(),
            "configuration unavailable: timeout"
        );
    }
}
