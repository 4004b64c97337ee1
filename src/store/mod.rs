//! Persistence seams for analyses and quotes.
//!
//! The engine only needs a handful of operations from the surrounding
//! persistence layer, expressed here as traits. [`MemoryStore`] implements
//! both and backs the CLI and the tests.

pub mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Analysis, PriceResult, QuoteSelection};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// An analysis as persisted for one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub owner: String,
    pub analysis: Analysis,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(owner: impl Into<String>, analysis: Analysis) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            analysis,
            created_at: Utc::now(),
        }
    }
}

/// A priced quote tied to the analysis it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub id: Uuid,
    pub owner: String,
    pub analysis_id: Uuid,
    pub selection: QuoteSelection,
    pub result: PriceResult,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

pub trait AnalysisStore: Send + Sync {
    /// Existing analysis of byte-identical markup uploaded by `owner`.
    fn find_by_content_hash(
        &self,
        owner: &str,
        content_hash: &str,
    ) -> Result<Option<AnalysisRecord>, StoreError>;

    fn persist_analysis(&self, record: AnalysisRecord) -> Result<(), StoreError>;

    fn get_analysis(&self, id: Uuid) -> Result<AnalysisRecord, StoreError>;
}

pub trait QuoteStore: Send + Sync {
    fn persist_quote(&self, record: QuoteRecord) -> Result<(), StoreError>;

    fn get_quote(&self, id: Uuid) -> Result<QuoteRecord, StoreError>;

    /// All quotes priced from one analysis, oldest first.
    fn quotes_for_analysis(&self, analysis_id: Uuid) -> Result<Vec<QuoteRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_messages() {
        assert_eq!(
            StoreError::NotFound("analysis 42".to_string()).to_string(),
            "not found: analysis 42"
        );
        assert_eq!(
            StoreError::Backend("lock poisoned".to_string()).to_string(),
            "store backend error: lock poisoned"
        );
    }

    #[test]
    fn analysis_record_gets_fresh_id() {
        let analysis = crate::svg::Analyzer::new()
            .analyze(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10mm" height="10mm"/>"#)
            .expect("empty svg analyses");
        let a = AnalysisRecord::new("alice", analysis.clone());
        let b = AnalysisRecord::new("alice", analysis);
        assert_ne!(a.id, b.id);
        assert_eq!(a.owner, "alice");
    }

    #[test]
    fn analysis_record_serializes_camel_case() {
        let analysis = crate::svg::Analyzer::new()
            .analyze(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10mm" height="10mm"/>"#)
            .expect("empty svg analyses");
        let value = serde_json::to_value(AnalysisRecord::new("bob", analysis)).expect("serialize");
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["owner"], "bob");
    }
}
