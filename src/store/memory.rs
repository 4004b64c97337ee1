//! In-process store behind `RwLock`s.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::{AnalysisRecord, AnalysisStore, QuoteRecord, QuoteStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    analyses: RwLock<HashMap<Uuid, AnalysisRecord>>,
    quotes: RwLock<HashMap<Uuid, QuoteRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("{what} lock poisoned: {e}"))
}

impl AnalysisStore for MemoryStore {
    fn find_by_content_hash(
        &self,
        owner: &str,
        content_hash: &str,
    ) -> Result<Option<AnalysisRecord>, StoreError> {
        let analyses = self.analyses.read().map_err(|e| poisoned("analysis", e))?;
        Ok(analyses
            .values()
            .filter(|r| r.owner == owner && r.analysis.content_hash == content_hash)
            .min_by_key(|r| r.created_at)
            .cloned())
    }

    fn persist_analysis(&self, record: AnalysisRecord) -> Result<(), StoreError> {
        let mut analyses = self.analyses.write().map_err(|e| poisoned("analysis", e))?;
        analyses.insert(record.id, record);
        Ok(())
    }

    fn get_analysis(&self, id: Uuid) -> Result<AnalysisRecord, StoreError> {
        let analyses = self.analyses.read().map_err(|e| poisoned("analysis", e))?;
        analyses
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("analysis {id}")))
    }
}

impl QuoteStore for MemoryStore {
    fn persist_quote(&self, record: QuoteRecord) -> Result<(), StoreError> {
        let mut quotes = self.quotes.write().map_err(|e| poisoned("quote", e))?;
        quotes.insert(record.id, record);
        Ok(())
    }

    fn get_quote(&self, id: Uuid) -> Result<QuoteRecord, StoreError> {
        let quotes = self.quotes.read().map_err(|e| poisoned("quote", e))?;
        quotes
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("quote {id}")))
    }

    fn quotes_for_analysis(&self, analysis_id: Uuid) -> Result<Vec<QuoteRecord>, StoreError> {
        let quotes = self.quotes.read().map_err(|e| poisoned("quote", e))?;
        let mut found: Vec<QuoteRecord> = quotes
            .values()
            .filter(|q| q.analysis_id == analysis_id)
            .cloned()
            .collect();
        found.sort_by_key(|q| q.created_at);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::Analyzer;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10mm" height="10mm">
        <rect width="10" height="10" stroke="#ff0000" fill="none"/>
    </svg>"##;

    fn record(owner: &str, markup: &str) -> AnalysisRecord {
        let analysis = Analyzer::new().analyze(markup).expect("analyze");
        AnalysisRecord::new(owner, analysis)
    }

    #[test]
    fn persisted_analysis_is_found_by_id_and_hash() {
        let store = MemoryStore::new();
        let rec = record("alice", SQUARE);
        let id = rec.id;
        let hash = rec.analysis.content_hash.clone();
        store.persist_analysis(rec).expect("persist");

        let by_id = store.get_analysis(id).expect("get by id");
        assert_eq!(by_id.owner, "alice");

        let by_hash = store
            .find_by_content_hash("alice", &hash)
            .expect("lookup")
            .expect("found");
        assert_eq!(by_hash.id, id);
    }

    #[test]
    fn content_hash_lookup_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let rec = record("alice", SQUARE);
        let hash = rec.analysis.content_hash.clone();
        store.persist_analysis(rec).expect("persist");

        assert!(store
            .find_by_content_hash("bob", &hash)
            .expect("lookup")
            .is_none());
    }

    #[test]
    fn missing_records_are_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_analysis(Uuid::new_v4()),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.get_quote(Uuid::new_v4()),
            Err(StoreError::NotFound(_))
        ));
        assert!(store
            .quotes_for_analysis(Uuid::new_v4())
            .expect("list")
            .is_empty());
    }
}
