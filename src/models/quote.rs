//! Quote data model: the selectors of one calculation and its [`PriceResult`].
//!
//! A [`PriceResult`] is created once per (analysis, selection) pair and never
//! mutated; re-pricing produces a new value.

use serde::{Deserialize, Serialize};

/// Current shape of [`PriceResult`]; bumped whenever a field changes meaning.
pub const PRICE_RESULT_VERSION: u32 = 1;

/// The options a customer picks when pricing an analysed drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSelection {
    pub technology_id: u32,
    pub material_id: u32,
    pub engrave_type_id: u32,
    /// Material thickness in mm; `0` means "generic / unspecified".
    #[serde(default)]
    pub thickness_mm: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// `true` when the shop supplies the raw material.
    #[serde(default)]
    pub material_included: bool,
}

fn default_quantity() -> u32 {
    1
}

/// Machine minutes per operation for the whole (quantity-scaled) job.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBreakdown {
    /// Raster plus vector engraving.
    pub engrave_mins: f64,
    pub raster_mins: f64,
    pub vector_mins: f64,
    pub cut_mins: f64,
    /// Applied once per job regardless of quantity.
    pub setup_mins: f64,
    pub total_mins: f64,
}

/// Speeds the estimator actually used, after overrides and multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSpeeds {
    /// Engrave head speed in mm/min.
    pub engrave_head_mm_min: f64,
    /// Raster fill rate in mm²/min (head speed × spot size).
    pub raster_mm2_min: f64,
    /// Cutting speed in mm/min.
    pub cut_mm_min: f64,
    pub speed_multiplier: f64,
    pub material_factor: f64,
    pub spot_size_mm: f64,
}

/// Monetary components, each rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub engrave: f64,
    pub cut: f64,
    /// Engrave plus cut, before any factor.
    pub machine: f64,
    /// Raw material for the job footprint, before waste.
    pub material_raw: f64,
    pub material_with_waste: f64,
    pub setup_fee: f64,
}

/// Factors and rates that fed the two price models.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFactors {
    pub material: f64,
    pub engrave: f64,
    pub uv_premium: f64,
    pub margin: f64,
    pub volume_discount: f64,
    pub waste_pct: f64,
    pub cost_per_min_engrave: f64,
    pub cost_per_min_cut: f64,
}

/// Unit and total price of one pricing model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPrice {
    pub unit: f64,
    pub total: f64,
}

/// Which model produced the final price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceModel {
    /// Cost-plus, driven by machine time and configured rates.
    Hybrid,
    /// Market/area-based, acting as a price floor.
    Value,
}

/// Diagnostic "what-if": hybrid price with the material factor also applied.
///
/// Never influences the final price.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    pub hybrid_total_with_material_factor: f64,
    /// `(simulated − hybrid) / hybrid × 100`; 0 when the hybrid total is 0.
    pub delta_pct: f64,
}

/// Auto-approval routing derived from design complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    AutoApproved,
    NeedsReview,
    Rejected,
}

/// Output of one price calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResult {
    pub version: u32,
    pub selection: QuoteSelection,
    pub time: TimeBreakdown,
    pub speeds: EffectiveSpeeds,
    pub costs: CostBreakdown,
    pub factors: AppliedFactors,
    pub hybrid: ModelPrice,
    pub value: ModelPrice,
    pub final_model: PriceModel,
    pub final_price: ModelPrice,
    pub simulation: Simulation,
    /// `true` when any performed operation ran on base (uncalibrated) speeds.
    pub used_fallback: bool,
    /// Complexity of the quantity-scaled job.
    pub complexity: f64,
    pub status: ApprovalStatus,
    pub status_note: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl PriceResult {
    pub fn is_auto_approved(&self) -> bool {
        self.status == ApprovalStatus::AutoApproved
    }
}

/// Round a monetary amount to cents.
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_money_rounds_half_away_from_zero() {
        assert_eq!(round_money(1.005_000_1), 1.01);
        assert_eq!(round_money(2.344), 2.34);
        assert_eq!(round_money(0.0), 0.0);
    }

    #[test]
    fn selection_defaults_quantity_and_material_flag() {
        let json = r#"{"technologyId":1,"materialId":2,"engraveTypeId":3}"#;
        let sel: QuoteSelection = serde_json::from_str(json).expect("deserialize selection");
        assert_eq!(sel.quantity, 1);
        assert_eq!(sel.thickness_mm, 0.0);
        assert!(!sel.material_included);
    }

    #[test]
    fn approval_status_serializes_as_snake_case() {
        let value = serde_json::to_value(ApprovalStatus::NeedsReview).expect("serialize");
        assert_eq!(value, "needs_review");
        let value = serde_json::to_value(ApprovalStatus::AutoApproved).expect("serialize");
        assert_eq!(value, "auto_approved");
    }

    #[test]
    fn price_model_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_value(PriceModel::Value).expect("serialize"),
            "value"
        );
    }
}
