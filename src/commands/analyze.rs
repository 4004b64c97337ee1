//! Upload analysis.
//!
//! [`parse_and_analyze`] is the pure entry point. [`analyze_upload`] adds the
//! boundary checks, the per-owner content-hash dedup, and persistence.

use serde::Serialize;

use crate::error::AppError;
use crate::models::Analysis;
use crate::store::{AnalysisRecord, AnalysisStore};
use crate::svg::{content_hash, Analyzer};

/// Largest markup accepted by [`analyze_upload`].
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Result of [`analyze_upload`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub record: AnalysisRecord,
    /// `true` when an earlier analysis of identical markup was returned.
    pub cached: bool,
}

// ── parse_and_analyze ─────────────────────────────────────────────────────────

/// Parse `raw` and compute its [`Analysis`]. Warnings ride on the result.
pub fn parse_and_analyze(raw: &str) -> Result<Analysis, AppError> {
    Ok(Analyzer::new().analyze(raw)?)
}

// ── check_upload ──────────────────────────────────────────────────────────────

/// Cheap pre-filters applied before any parsing: size cap and an `<svg` tag.
pub fn check_upload(raw: &str) -> Result<(), AppError> {
    if raw.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::MalformedDocument(format!(
            "upload is {} bytes; the limit is {MAX_UPLOAD_BYTES}",
            raw.len()
        )));
    }
    if !raw.contains("<svg") {
        return Err(AppError::MalformedDocument(
            "upload does not contain an <svg> element".to_string(),
        ));
    }
    Ok(())
}

// ── analyze_upload ────────────────────────────────────────────────────────────

/// Analyze an upload for `owner`, reusing a stored analysis of identical markup.
///
/// 1. Rejects oversized or non-SVG uploads via [`check_upload`].
/// 2. Looks up `(owner, sha256(raw))`; a hit is returned with `cached = true`.
/// 3. Otherwise parses on the blocking thread pool and persists the record.
pub async fn analyze_upload(
    owner: &str,
    raw: String,
    analyses: &dyn AnalysisStore,
) -> Result<UploadOutcome, AppError> {
    check_upload(&raw)?;

    let hash = content_hash(&raw);
    if let Some(record) = analyses.find_by_content_hash(owner, &hash)? {
        tracing::info!(owner, analysis = %record.id, "identical upload, reusing analysis");
        return Ok(UploadOutcome {
            record,
            cached: true,
        });
    }

    // Flattening large drawings is CPU-bound; keep it off the async workers.
    let analysis = tokio::task::spawn_blocking(move || parse_and_analyze(&raw))
        .await
        .map_err(|e| AppError::MalformedDocument(format!("analysis task panicked: {e}")))??;

    let record = AnalysisRecord::new(owner, analysis);
    analyses.persist_analysis(record.clone())?;
    tracing::info!(
        owner,
        analysis = %record.id,
        elements = record.analysis.element_count,
        "upload analysed"
    );

    Ok(UploadOutcome {
        record,
        cached: false,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const PANEL: &str = include_str!("../../tests/fixtures/panel.svg");

    #[test]
    fn parse_and_analyze_measures_panel() {
        let analysis = parse_and_analyze(PANEL).expect("panel should analyze");
        assert!((analysis.cut_length_mm - 300.0).abs() < 1e-9);
        assert!((analysis.vector_length_mm - 100.0).abs() < 1e-9);
        assert_eq!(analysis.cut_count, 1);
        assert_eq!(analysis.vector_count, 1);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn parse_and_analyze_rejects_malformed_markup() {
        let err = parse_and_analyze("<svg><rect></svg>").expect_err("mismatched tags");
        assert!(matches!(err, AppError::MalformedDocument(_)));
    }

    #[test]
    fn check_upload_requires_svg_tag() {
        assert!(check_upload(PANEL).is_ok());
        assert!(matches!(
            check_upload("<html></html>"),
            Err(AppError::MalformedDocument(_))
        ));
    }

    #[test]
    fn check_upload_enforces_size_cap() {
        let mut raw = String::from("<svg>");
        raw.push_str(&" ".repeat(MAX_UPLOAD_BYTES));
        assert!(matches!(
            check_upload(&raw),
            Err(AppError::MalformedDocument(_))
        ));
    }

    #[tokio::test]
    async fn analyze_upload_persists_then_dedups() {
        let store = MemoryStore::new();

        let first = analyze_upload("alice", PANEL.to_string(), &store)
            .await
            .expect("first upload");
        assert!(!first.cached);

        let second = analyze_upload("alice", PANEL.to_string(), &store)
            .await
            .expect("second upload");
        assert!(second.cached);
        assert_eq!(second.record.id, first.record.id);

        let stored = store.get_analysis(first.record.id).expect("persisted");
        assert_eq!(stored.analysis, first.record.analysis);
    }

    #[tokio::test]
    async fn analyze_upload_does_not_share_across_owners() {
        let store = MemoryStore::new();
        let a = analyze_upload("alice", PANEL.to_string(), &store)
            .await
            .expect("alice upload");
        let b = analyze_upload("bob", PANEL.to_string(), &store)
            .await
            .expect("bob upload");
        assert!(!b.cached);
        assert_ne!(a.record.id, b.record.id);
        assert_eq!(a.record.analysis.content_hash, b.record.analysis.content_hash);
    }

    #[tokio::test]
    async fn analyze_upload_surfaces_malformed_document() {
        let store = MemoryStore::new();
        let err = analyze_upload("alice", "<svg><g></svg>".to_string(), &store)
            .await
            .expect_err("malformed");
        assert!(matches!(err, AppError::MalformedDocument(_)));
    }
}
