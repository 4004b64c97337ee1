//! Pricing entry points.
//!
//! Each call takes one snapshot from the cache and prices against it; a
//! concurrent refresh never changes the rates mid-calculation.

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Analysis, PriceResult, QuoteSelection};
use crate::pricing::PricingCalculator;
use crate::state::{AppState, SnapshotCache};
use crate::store::QuoteRecord;

// ── calculate ─────────────────────────────────────────────────────────────────

/// Price `analysis` for `selection` against the current snapshot.
///
/// # Errors
/// `ConfigUnavailable` / `InvalidConfig` when no snapshot can be loaded,
/// `Incompatible` when the technology cannot process the material.
pub fn calculate(
    analysis: &Analysis,
    selection: &QuoteSelection,
    snapshots: &SnapshotCache,
) -> Result<PriceResult, AppError> {
    let config = snapshots.snapshot()?;
    Ok(PricingCalculator::new(&config).calculate(analysis, selection)?)
}

// ── create_quote ──────────────────────────────────────────────────────────────

/// Price a stored analysis owned by `owner` and persist the quote.
///
/// The quote stays valid for `quote_validity_days` from the snapshot used to
/// price it. An analysis belonging to another owner is reported as not found.
pub fn create_quote(
    owner: &str,
    analysis_id: Uuid,
    selection: &QuoteSelection,
    state: &AppState,
) -> Result<QuoteRecord, AppError> {
    let stored = state.analyses.get_analysis(analysis_id)?;
    if stored.owner != owner {
        return Err(AppError::NotFound(format!("analysis {analysis_id}")));
    }

    let config = state.snapshots.snapshot()?;
    let result = PricingCalculator::new(&config).calculate(&stored.analysis, selection)?;

    let created_at = Utc::now();
    let valid_until =
        created_at + chrono::Duration::days(i64::from(config.constants.quote_validity_days));

    let record = QuoteRecord {
        id: Uuid::new_v4(),
        owner: owner.to_string(),
        analysis_id,
        selection: result.selection.clone(),
        result,
        created_at,
        valid_until,
    };
    state.quotes.persist_quote(record.clone())?;
    tracing::info!(
        owner,
        quote = %record.id,
        analysis = %analysis_id,
        total = record.result.final_price.total,
        status = ?record.result.status,
        "quote created"
    );
    Ok(record)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
