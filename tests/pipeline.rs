use std::path::PathBuf;
use std::sync::Arc;

use laserquote_lib::commands::{analyze_upload, calculate, create_quote};
use laserquote_lib::error::AppError;
use laserquote_lib::models::{ApprovalStatus, PriceModel, QuoteSelection};
use laserquote_lib::pricing::{config, TomlFileSource};
use laserquote_lib::state::{AppState, SnapshotCache};
use laserquote_lib::store::{MemoryStore, QuoteStore};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    let path = fixture(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read fixture {path:?}: {e}"))
}

fn file_backed_state(rates: PathBuf) -> AppState {
    let store = Arc::new(MemoryStore::new());
    AppState::new(
        SnapshotCache::new(TomlFileSource::new(rates)),
        store.clone(),
        store,
    )
}

fn acrylic(quantity: u32) -> QuoteSelection {
    QuoteSelection {
        technology_id: 1,
        material_id: 10,
        engrave_type_id: 100,
        thickness_mm: 3.0,
        quantity,
        material_included: false,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[tokio::test]
async fn upload_then_quote_single_panel() {
    let state = file_backed_state(fixture("rates.toml"));
    let upload = analyze_upload("shop-1", read_fixture("panel.svg"), state.analyses.as_ref())
        .await
        .expect("upload");
    assert!(!upload.cached);

    let quote = create_quote("shop-1", upload.record.id, &acrylic(1), &state).expect("quote");
    let r = &quote.result;
    assert!(close(r.time.cut_mins, 6.0));
    assert!(close(r.time.vector_mins, 1.0));
    assert_eq!(r.hybrid.total, 451.0);
    assert_eq!(r.value.total, 280.0);
    assert_eq!(r.final_model, PriceModel::Hybrid);
    assert_eq!(r.status, ApprovalStatus::AutoApproved);
    assert!(!r.used_fallback);
}

#[tokio::test]
async fn volume_order_gets_discount_and_unit_price() {
    let state = file_backed_state(fixture("rates.toml"));
    let upload = analyze_upload("shop-1", read_fixture("panel.svg"), state.analyses.as_ref())
        .await
        .expect("upload");

    let quote = create_quote("shop-1", upload.record.id, &acrylic(10), &state).expect("quote");
    let r = &quote.result;
    assert_eq!(r.factors.volume_discount, 0.1);
    // 1300 × 1.5 × 1.5 × 1.2 × 0.9 + 100
    assert_eq!(r.final_price.total, 3259.0);
    assert_eq!(r.final_price.unit, 325.9);
    // 4000 mm over a 50 000 mm² footprint
    assert_eq!(r.status, ApprovalStatus::Rejected);
}

#[tokio::test]
async fn material_included_adds_sheet_cost() {
    let state = file_backed_state(fixture("rates.toml"));
    let upload = analyze_upload("shop-1", read_fixture("panel.svg"), state.analyses.as_ref())
        .await
        .expect("upload");

    let mut selection = acrylic(1);
    selection.material_included = true;
    let quote = create_quote("shop-1", upload.record.id, &selection, &state).expect("quote");
    assert_eq!(quote.result.costs.material_with_waste, 11.0);
    assert_eq!(quote.result.final_price.total, 480.7);
}

#[tokio::test]
async fn uncalibrated_material_falls_back_to_base_speeds() {
    let state = file_backed_state(fixture("rates.toml"));
    let upload = analyze_upload("shop-1", read_fixture("panel.svg"), state.analyses.as_ref())
        .await
        .expect("upload");

    let mut selection = acrylic(1);
    selection.material_id = 11;
    let quote = create_quote("shop-1", upload.record.id, &selection, &state).expect("quote");
    let r = &quote.result;
    assert!(r.used_fallback);
    assert!(r.warnings.iter().any(|w| w.contains("base speeds")));
    // 20 / 1.2 mm/min cut, 100 / 1.2 mm/min head
    assert!(close(r.time.cut_mins, 18.0));
    assert!(close(r.time.vector_mins, 1.2));
    assert_eq!(r.hybrid.total, 1104.4);
}

#[tokio::test]
async fn repeated_upload_reuses_analysis_and_accumulates_quotes() {
    let state = file_backed_state(fixture("rates.toml"));
    let raw = read_fixture("panel.svg");

    let first = analyze_upload("shop-1", raw.clone(), state.analyses.as_ref())
        .await
        .expect("first upload");
    let again = analyze_upload("shop-1", raw, state.analyses.as_ref())
        .await
        .expect("second upload");
    assert!(again.cached);
    assert_eq!(again.record.id, first.record.id);

    create_quote("shop-1", first.record.id, &acrylic(1), &state).expect("quote 1");
    create_quote("shop-1", again.record.id, &acrylic(2), &state).expect("quote 2");
    let quotes = state
        .quotes
        .quotes_for_analysis(first.record.id)
        .expect("list");
    assert_eq!(quotes.len(), 2);
}

#[tokio::test]
async fn invalidated_cache_picks_up_edited_rates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let rates_path = dir.path().join("rates.toml");
    let rates = read_fixture("rates.toml");
    std::fs::write(&rates_path, &rates).expect("write rates");

    let state = file_backed_state(rates_path.clone());
    let upload = analyze_upload("shop-1", read_fixture("panel.svg"), state.analyses.as_ref())
        .await
        .expect("upload");
    let analysis = upload.record.analysis;

    let before = calculate(&analysis, &acrylic(1), &state.snapshots).expect("before edit");
    assert_eq!(before.final_price.total, 451.0);

    std::fs::write(
        &rates_path,
        rates.replace("setup_fee = 100.0", "setup_fee = 200.0"),
    )
    .expect("edit rates");

    // Still cached: the edit is invisible until the cache is told.
    let cached = calculate(&analysis, &acrylic(1), &state.snapshots).expect("cached");
    assert_eq!(cached.final_price.total, 451.0);

    state.snapshots.invalidate().expect("invalidate");
    let after = calculate(&analysis, &acrylic(1), &state.snapshots).expect("after edit");
    assert_eq!(after.final_price.total, 551.0);
}

#[tokio::test]
async fn broken_rates_file_is_invalid_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let rates_path = dir.path().join("rates.toml");
    std::fs::write(
        &rates_path,
        "[[volume_discounts]]\nmin_qty = 1\nmax_qty = 20\ndiscount_pct = 0.1\n\n\
         [[volume_discounts]]\nmin_qty = 10\ndiscount_pct = 0.2\n",
    )
    .expect("write rates");

    let state = file_backed_state(rates_path);
    let upload = analyze_upload("shop-1", read_fixture("panel.svg"), state.analyses.as_ref())
        .await
        .expect("upload");
    let err = calculate(&upload.record.analysis, &acrylic(1), &state.snapshots)
        .expect_err("overlapping tiers");
    assert!(matches!(err, AppError::InvalidConfig(_)));
}

#[test]
fn fixture_rates_are_valid() {
    let snapshot = config::parse(&read_fixture("rates.toml")).expect("parse fixture");
    assert_eq!(snapshot.version, 3);
    assert_eq!(snapshot.constants.quote_validity_days, 14);
    assert_eq!(snapshot.volume_discounts.len(), 2);
}
