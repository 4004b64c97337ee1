//! Machine-minute estimate for a (quantity-scaled) job.
//!
//! Speeds come from the calibrated (technology, material, thickness) row when
//! it exists, otherwise from the base constants slowed down by the material
//! factor. Setup is counted once per job.

use crate::models::{EffectiveSpeeds, JobGeometry, QuoteSelection, TimeBreakdown};

use super::config::ConfigSnapshot;

/// Minutes plus the speeds that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEstimate {
    pub time: TimeBreakdown,
    pub speeds: EffectiveSpeeds,
    /// `true` when a performed operation had no calibrated speed.
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeEstimator<'a> {
    config: &'a ConfigSnapshot,
}

impl<'a> TimeEstimator<'a> {
    pub fn new(config: &'a ConfigSnapshot) -> Self {
        TimeEstimator { config }
    }

    pub fn estimate(&self, job: &JobGeometry, selection: &QuoteSelection) -> TimeEstimate {
        let cfg = self.config;
        let constants = &cfg.constants;

        let speed_multiplier = cfg.speed_multiplier(selection.engrave_type_id);
        let material_factor = cfg.material_factor(selection.material_id);
        let spot_size_mm = cfg.spot_size(selection.technology_id);
        let row = cfg.material_speed(
            selection.technology_id,
            selection.material_id,
            selection.thickness_mm,
        );

        let calibrated_engrave = row.and_then(|r| r.engrave_speed());
        let calibrated_cut = row.and_then(|r| r.cut_speed());

        let engrave_head_mm_min = match calibrated_engrave {
            Some(speed) => speed * speed_multiplier,
            None => constants.base_engrave_line_speed * speed_multiplier / material_factor,
        };
        let raster_mm2_min = engrave_head_mm_min * spot_size_mm;
        let cut_mm_min = calibrated_cut.unwrap_or(constants.base_cut_speed / material_factor);

        let raster_mins = minutes(job.raster_area_mm2, raster_mm2_min);
        let vector_mins = minutes(job.vector_length_mm, engrave_head_mm_min);
        let cut_mins = minutes(job.cut_length_mm, cut_mm_min);
        let engrave_mins = raster_mins + vector_mins;
        let setup_mins = constants.setup_time_minutes;

        let engraves = job.raster_area_mm2 > 0.0 || job.vector_length_mm > 0.0;
        let cuts = job.cut_length_mm > 0.0;
        let used_fallback = row.is_none()
            || (engraves && calibrated_engrave.is_none())
            || (cuts && calibrated_cut.is_none());

        if used_fallback {
            tracing::warn!(
                technology = selection.technology_id,
                material = selection.material_id,
                thickness = selection.thickness_mm,
                "no calibrated speed, using base speeds"
            );
        }

        TimeEstimate {
            time: TimeBreakdown {
                engrave_mins,
                raster_mins,
                vector_mins,
                cut_mins,
                setup_mins,
                total_mins: engrave_mins + cut_mins + setup_mins,
            },
            speeds: EffectiveSpeeds {
                engrave_head_mm_min,
                raster_mm2_min,
                cut_mm_min,
                speed_multiplier,
                material_factor,
                spot_size_mm,
            },
            used_fallback,
        }
    }
}

/// `amount / rate`, or 0 when there is no work or no usable rate.
fn minutes(amount: f64, rate: f64) -> f64 {
    if amount <= 0.0 || rate <= 0.0 || !rate.is_finite() {
        return 0.0;
    }
    amount / rate
}
