//! Hybrid (cost-plus) and value (area-based) price models.
//!
//! # Pipeline
//! 1. Scale the analysis by quantity into one combined job.
//! 2. Estimate machine minutes for that job.
//! 3. Machine cost, then optional raw material cost with waste.
//! 4. Both price models; the larger one is final (value acts as a floor).
//! 5. Diagnostic simulation and complexity-based approval status.
//!
//! Intermediate values stay at full precision; only outputs are rounded to
//! cents.

use crate::models::{
    round_money, Analysis, AppliedFactors, ApprovalStatus, CostBreakdown, ModelPrice,
    PriceModel, PriceResult, QuoteSelection, Simulation, PRICE_RESULT_VERSION,
};

use super::config::{ConfigSnapshot, Constants};
use super::time_estimator::TimeEstimator;
use super::PricingError;

pub const NOTE_AUTO_APPROVED: &str = "Design is simple, auto-approved";
pub const NOTE_NEEDS_REVIEW: &str = "Design complexity requires admin review";
pub const NOTE_REJECTED: &str = "Design is too complex for automated processing";

/// Map a complexity score onto an approval status. Both thresholds are inclusive.
pub fn classify_complexity(
    complexity: f64,
    constants: &Constants,
) -> (ApprovalStatus, &'static str) {
    if complexity <= constants.complexity_auto_approve {
        (ApprovalStatus::AutoApproved, NOTE_AUTO_APPROVED)
    } else if complexity <= constants.complexity_needs_review {
        (ApprovalStatus::NeedsReview, NOTE_NEEDS_REVIEW)
    } else {
        (ApprovalStatus::Rejected, NOTE_REJECTED)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PricingCalculator<'a> {
    config: &'a ConfigSnapshot,
}

impl<'a> PricingCalculator<'a> {
    pub fn new(config: &'a ConfigSnapshot) -> Self {
        PricingCalculator { config }
    }

    /// Price one analysis for one selection.
    ///
    /// # Errors
    /// [`PricingError::Incompatible`] when the matched speed row marks the
    /// technology/material pair as not compatible.
    pub fn calculate(
        &self,
        analysis: &Analysis,
        selection: &QuoteSelection,
    ) -> Result<PriceResult, PricingError> {
        let cfg = self.config;
        let constants = &cfg.constants;
        let mut warnings = Vec::new();

        let mut selection = selection.clone();
        if selection.quantity < 1 {
            warnings.push(format!(
                "Quantity {} is below 1; priced as 1",
                selection.quantity
            ));
            selection.quantity = 1;
        }
        let quantity = selection.quantity;

        cfg.check_compatibility(
            selection.technology_id,
            selection.material_id,
            selection.thickness_mm,
        )?;

        // ── 1-2. Job geometry and time ────────────────────────────────────────
        let job = analysis.job_geometry(quantity);
        let estimate = TimeEstimator::new(cfg).estimate(&job, &selection);
        if estimate.used_fallback {
            warnings.push(format!(
                "Calibration not available for technology {}, material {} at {} mm; \
                 time estimated with base speeds",
                selection.technology_id, selection.material_id, selection.thickness_mm
            ));
        }

        // ── 3. Machine cost ───────────────────────────────────────────────────
        let rates = cfg.machine_rates(selection.technology_id);
        if !rates.configured {
            warnings.push(format!(
                "No machine rates configured for technology {}; machine time priced at 0",
                selection.technology_id
            ));
        }
        let engrave_cost = estimate.time.engrave_mins * rates.cost_per_min_engrave;
        let cut_cost = estimate.time.cut_mins * rates.cost_per_min_cut;
        let machine_cost = engrave_cost + cut_cost;

        // ── 3b. Material ──────────────────────────────────────────────────────
        let mut material_raw = 0.0;
        let mut waste_pct = 0.0;
        if selection.material_included {
            match cfg.material_cost(selection.material_id, selection.thickness_mm) {
                Some(cost) => {
                    material_raw = job.footprint_area_mm2 * cost.cost_per_mm2;
                    waste_pct = cost.waste_pct;
                }
                None => warnings.push(format!(
                    "No material cost configured for material {} at {} mm; material priced at 0",
                    selection.material_id, selection.thickness_mm
                )),
            }
        }
        let material_with_waste = material_raw * (1.0 + waste_pct);

        // ── 4. Price models ───────────────────────────────────────────────────
        let factors = AppliedFactors {
            material: cfg.material_factor(selection.material_id),
            engrave: cfg.engrave_factor(selection.engrave_type_id),
            uv_premium: cfg.uv_premium(selection.technology_id),
            margin: rates.margin,
            volume_discount: cfg.volume_discount(quantity),
            waste_pct,
            cost_per_min_engrave: rates.cost_per_min_engrave,
            cost_per_min_cut: rates.cost_per_min_cut,
        };
        let common =
            factors.engrave * (1.0 + factors.uv_premium) * (1.0 - factors.volume_discount);

        let cost_base = (machine_cost + material_with_waste) * (1.0 + factors.margin);
        let hybrid_total = cost_base * common + rates.setup_fee;

        let priced_area = job.footprint_area_mm2.max(constants.min_area_mm2);
        let value_base = constants
            .min_value_base
            .max(priced_area * constants.price_per_mm2);
        let value_total = value_base * factors.material * common + rates.setup_fee;

        let (final_model, final_total) = if value_total > hybrid_total {
            (PriceModel::Value, value_total)
        } else {
            (PriceModel::Hybrid, hybrid_total)
        };

        // ── 5. Simulation and approval ────────────────────────────────────────
        let simulated = cost_base * factors.material * common + rates.setup_fee;
        let delta_pct = if hybrid_total > 0.0 {
            (simulated - hybrid_total) / hybrid_total * 100.0
        } else {
            0.0
        };

        let complexity = job.complexity();
        let (status, note) = classify_complexity(complexity, constants);

        tracing::debug!(
            quantity,
            hybrid_total,
            value_total,
            ?final_model,
            complexity,
            ?status,
            "price calculated"
        );

        Ok(PriceResult {
            version: PRICE_RESULT_VERSION,
            selection,
            time: estimate.time,
            speeds: estimate.speeds,
            costs: CostBreakdown {
                engrave: round_money(engrave_cost),
                cut: round_money(cut_cost),
                machine: round_money(machine_cost),
                material_raw: round_money(material_raw),
                material_with_waste: round_money(material_with_waste),
                setup_fee: round_money(rates.setup_fee),
            },
            factors,
            hybrid: model_price(hybrid_total, quantity),
            value: model_price(value_total, quantity),
            final_model,
            final_price: model_price(final_total, quantity),
            simulation: Simulation {
                hybrid_total_with_material_factor: round_money(simulated),
                delta_pct: round_money(delta_pct),
            },
            used_fallback: estimate.used_fallback,
            complexity,
            status,
            status_note: note.to_string(),
            warnings,
        })
    }
}

fn model_price(total: f64, quantity: u32) -> ModelPrice {
    ModelPrice {
        unit: round_money(total / f64::from(quantity.max(1))),
        total: round_money(total),
    }
}
