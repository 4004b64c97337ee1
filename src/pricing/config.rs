//! Configuration snapshot: machine rates, factors, discounts, speed overrides,
//! material costs and tunable constants.
//!
//! A snapshot is read-only once loaded. Lookups never fail: unknown ids
//! degrade to neutral defaults (factor 1.0, zero cost) so a calculation can
//! always proceed.

use std::collections::HashSet;
use std::path::PathBuf;

use super::PricingError;

const INCOMPATIBLE_DEFAULT_REASON: &str = "technology/material combination is not compatible";

// ── Schema ────────────────────────────────────────────────────────────────────

/// `[constants]`: tunable system constants.
///
/// Every key is optional; a missing key takes the production default.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Constants {
    /// Engrave head speed (mm/min) when no calibrated override exists.
    pub base_engrave_line_speed: f64,
    /// Cutting speed (mm/min) when no calibrated override exists.
    pub base_cut_speed: f64,
    pub setup_time_minutes: f64,
    pub complexity_auto_approve: f64,
    pub complexity_needs_review: f64,
    pub quote_validity_days: u32,
    /// Value-model price floor.
    pub min_value_base: f64,
    pub price_per_mm2: f64,
    pub min_area_mm2: f64,
    /// Margin used when a technology has no rate row.
    pub default_margin_percent: f64,
    pub default_waste_pct: f64,
    pub default_spot_size_mm: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Constants {
            base_engrave_line_speed: 100.0,
            base_cut_speed: 20.0,
            setup_time_minutes: 5.0,
            complexity_auto_approve: 6.0,
            complexity_needs_review: 12.0,
            quote_validity_days: 7,
            min_value_base: 2575.0,
            price_per_mm2: 0.515,
            min_area_mm2: 100.0,
            default_margin_percent: 0.40,
            default_waste_pct: 0.15,
            default_spot_size_mm: 0.1,
        }
    }
}

/// `[[technologies]]`: one laser source (CO2, fiber, UV, …).
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Technology {
    pub id: u32,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub uv_premium_factor: f64,
    /// Beam spot diameter; converts head speed into a raster fill rate.
    pub spot_size_mm: Option<f64>,
}

/// `[[tech_rates]]`: machine pricing for one technology.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TechRate {
    pub technology_id: u32,
    pub cost_per_min_engrave: f64,
    pub cost_per_min_cut: f64,
    #[serde(default)]
    pub setup_fee: f64,
    pub margin_percent: f64,
}

/// `[[materials]]`
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Material {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "one")]
    pub factor: f64,
    /// Stocked thicknesses in mm.
    #[serde(default)]
    pub thicknesses: Vec<f64>,
}

/// `[[engrave_types]]`
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngraveType {
    pub id: u32,
    pub name: String,
    #[serde(default = "one")]
    pub factor: f64,
    #[serde(default = "one")]
    pub speed_multiplier: f64,
}

/// `[[volume_discounts]]`: `max_qty` absent means unbounded.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct VolumeDiscount {
    pub min_qty: u32,
    pub max_qty: Option<u32>,
    pub discount_pct: f64,
}

impl VolumeDiscount {
    pub fn applies_to(&self, quantity: u32) -> bool {
        quantity >= self.min_qty && self.max_qty.map_or(true, |max| quantity <= max)
    }
}

/// `[[material_speeds]]`: calibrated speeds for (technology, material, thickness).
///
/// `thickness = 0` is the generic row used when no exact thickness matches.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MaterialSpeed {
    pub technology_id: u32,
    pub material_id: u32,
    #[serde(default)]
    pub thickness: f64,
    pub cut_speed_mm_min: Option<f64>,
    /// Head speed; the raster rate multiplies it by the spot size.
    pub engrave_speed_mm_min: Option<f64>,
    #[serde(default = "yes")]
    pub compatible: bool,
    pub notes: Option<String>,
}

impl MaterialSpeed {
    /// Calibrated cut speed, ignoring non-positive entries.
    pub fn cut_speed(&self) -> Option<f64> {
        self.cut_speed_mm_min.filter(|s| *s > 0.0)
    }

    pub fn engrave_speed(&self) -> Option<f64> {
        self.engrave_speed_mm_min.filter(|s| *s > 0.0)
    }
}

/// `[[material_costs]]`: raw material cost when the shop supplies stock.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MaterialCost {
    pub material_id: u32,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub cost_per_mm2: f64,
    pub waste_pct: Option<f64>,
    pub sheet_cost: Option<f64>,
    pub sheet_width_mm: Option<f64>,
    pub sheet_height_mm: Option<f64>,
}

impl MaterialCost {
    /// Cost per mm², derived from the sheet price when all sheet values are set.
    pub fn effective_cost_per_mm2(&self) -> f64 {
        match (self.sheet_cost, self.sheet_width_mm, self.sheet_height_mm) {
            (Some(cost), Some(w), Some(h)) if cost > 0.0 && w > 0.0 && h > 0.0 => cost / (w * h),
            _ => self.cost_per_mm2,
        }
    }
}

/// Immutable bundle of everything a calculation reads.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigSnapshot {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default)]
    pub constants: Constants,
    #[serde(default)]
    pub technologies: Vec<Technology>,
    #[serde(default)]
    pub tech_rates: Vec<TechRate>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub engrave_types: Vec<EngraveType>,
    #[serde(default)]
    pub volume_discounts: Vec<VolumeDiscount>,
    #[serde(default)]
    pub material_speeds: Vec<MaterialSpeed>,
    #[serde(default)]
    pub material_costs: Vec<MaterialCost>,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        ConfigSnapshot {
            version: default_version(),
            constants: Constants::default(),
            technologies: Vec::new(),
            tech_rates: Vec::new(),
            materials: Vec::new(),
            engrave_types: Vec::new(),
            volume_discounts: Vec::new(),
            material_speeds: Vec::new(),
            material_costs: Vec::new(),
        }
    }
}

fn default_version() -> u64 {
    1
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

// ── Parsing and validation ────────────────────────────────────────────────────

/// Parse a TOML string into a [`ConfigSnapshot`], running validation.
pub fn parse(toml_str: &str) -> Result<ConfigSnapshot, PricingError> {
    let cfg: ConfigSnapshot =
        toml::from_str(toml_str).map_err(|e| PricingError::Config(e.to_string()))?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Check the invariants lookups rely on.
///
/// Every number must be finite. Speeds, spot sizes and factors must be
/// positive; rates, fees, margins, premiums, costs and price constants must
/// not be negative.
pub fn validate(cfg: &ConfigSnapshot) -> Result<(), PricingError> {
    validate_constants(&cfg.constants)?;

    unique_ids("technologies", cfg.technologies.iter().map(|t| t.id))?;
    unique_ids("tech_rates", cfg.tech_rates.iter().map(|r| r.technology_id))?;
    unique_ids("materials", cfg.materials.iter().map(|m| m.id))?;
    unique_ids("engrave_types", cfg.engrave_types.iter().map(|e| e.id))?;

    for t in &cfg.technologies {
        let owner = format!("technology {}", t.id);
        non_negative(&owner, "uv_premium_factor", t.uv_premium_factor)?;
        if let Some(spot) = t.spot_size_mm {
            positive(&owner, "spot_size_mm", spot)?;
        }
    }
    for r in &cfg.tech_rates {
        let owner = format!("tech rate {}", r.technology_id);
        non_negative(&owner, "cost_per_min_engrave", r.cost_per_min_engrave)?;
        non_negative(&owner, "cost_per_min_cut", r.cost_per_min_cut)?;
        non_negative(&owner, "setup_fee", r.setup_fee)?;
        non_negative(&owner, "margin_percent", r.margin_percent)?;
    }
    for m in &cfg.materials {
        let owner = format!("material {}", m.id);
        positive(&owner, "factor", m.factor)?;
        for &thickness in &m.thicknesses {
            non_negative(&owner, "thicknesses", thickness)?;
        }
    }
    for e in &cfg.engrave_types {
        let owner = format!("engrave type {}", e.id);
        positive(&owner, "factor", e.factor)?;
        positive(&owner, "speed_multiplier", e.speed_multiplier)?;
    }
    for s in &cfg.material_speeds {
        let owner = format!(
            "material speed ({}, {}, {})",
            s.technology_id, s.material_id, s.thickness
        );
        non_negative(&owner, "thickness", s.thickness)?;
        // Non-positive speeds mean "not calibrated" and are allowed.
        if let Some(v) = s.cut_speed_mm_min {
            finite(&owner, "cut_speed_mm_min", v)?;
        }
        if let Some(v) = s.engrave_speed_mm_min {
            finite(&owner, "engrave_speed_mm_min", v)?;
        }
    }
    for c in &cfg.material_costs {
        let owner = format!("material cost ({}, {})", c.material_id, c.thickness);
        non_negative(&owner, "thickness", c.thickness)?;
        non_negative(&owner, "cost_per_mm2", c.cost_per_mm2)?;
        let optional = [
            ("waste_pct", c.waste_pct),
            ("sheet_cost", c.sheet_cost),
            ("sheet_width_mm", c.sheet_width_mm),
            ("sheet_height_mm", c.sheet_height_mm),
        ];
        for (field, value) in optional {
            if let Some(v) = value {
                non_negative(&owner, field, v)?;
            }
        }
    }

    validate_discounts(&cfg.volume_discounts)
}

fn validate_constants(c: &Constants) -> Result<(), PricingError> {
    const OWNER: &str = "constants";
    positive(OWNER, "base_engrave_line_speed", c.base_engrave_line_speed)?;
    positive(OWNER, "base_cut_speed", c.base_cut_speed)?;
    positive(OWNER, "default_spot_size_mm", c.default_spot_size_mm)?;
    non_negative(OWNER, "setup_time_minutes", c.setup_time_minutes)?;
    non_negative(OWNER, "complexity_auto_approve", c.complexity_auto_approve)?;
    non_negative(OWNER, "complexity_needs_review", c.complexity_needs_review)?;
    non_negative(OWNER, "min_value_base", c.min_value_base)?;
    non_negative(OWNER, "price_per_mm2", c.price_per_mm2)?;
    non_negative(OWNER, "min_area_mm2", c.min_area_mm2)?;
    non_negative(OWNER, "default_margin_percent", c.default_margin_percent)?;
    non_negative(OWNER, "default_waste_pct", c.default_waste_pct)?;

    if c.complexity_auto_approve > c.complexity_needs_review {
        return Err(PricingError::Config(format!(
            "constants.complexity_auto_approve ({}) must not exceed complexity_needs_review ({})",
            c.complexity_auto_approve, c.complexity_needs_review
        )));
    }
    Ok(())
}

fn finite(owner: &str, field: &str, value: f64) -> Result<(), PricingError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PricingError::Config(format!(
            "{owner}: {field} must be a finite number, got {value}"
        )))
    }
}

fn positive(owner: &str, field: &str, value: f64) -> Result<(), PricingError> {
    finite(owner, field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::Config(format!(
            "{owner}: {field} must be positive, got {value}"
        )))
    }
}

fn non_negative(owner: &str, field: &str, value: f64) -> Result<(), PricingError> {
    finite(owner, field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(PricingError::Config(format!(
            "{owner}: {field} must not be negative, got {value}"
        )))
    }
}

fn unique_ids(table: &str, ids: impl Iterator<Item = u32>) -> Result<(), PricingError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PricingError::Config(format!("{table}: duplicate id {id}")));
        }
    }
    Ok(())
}

/// Tiers must be well-formed and must not overlap.
fn validate_discounts(tiers: &[VolumeDiscount]) -> Result<(), PricingError> {
    for tier in tiers {
        if !(0.0..1.0).contains(&tier.discount_pct) {
            return Err(PricingError::Config(format!(
                "volume discount from {}: discount_pct {} must be in [0, 1)",
                tier.min_qty, tier.discount_pct
            )));
        }
        if tier.max_qty.is_some_and(|max| max < tier.min_qty) {
            return Err(PricingError::Config(format!(
                "volume discount from {}: max_qty is below min_qty",
                tier.min_qty
            )));
        }
    }

    let mut sorted: Vec<&VolumeDiscount> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.min_qty);
    for pair in sorted.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        let overlaps = lower.max_qty.map_or(true, |max| max >= upper.min_qty);
        if overlaps {
            return Err(PricingError::Config(format!(
                "volume discount tiers starting at {} and {} overlap",
                lower.min_qty, upper.min_qty
            )));
        }
    }
    Ok(())
}

// ── Lookups ───────────────────────────────────────────────────────────────────

/// Machine rates for one technology, with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineRates {
    pub cost_per_min_engrave: f64,
    pub cost_per_min_cut: f64,
    pub setup_fee: f64,
    pub margin: f64,
    /// `false` when the technology has no rate row and defaults were used.
    pub configured: bool,
}

/// Raw material cost resolved for (material, thickness).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialCostLookup {
    pub cost_per_mm2: f64,
    pub waste_pct: f64,
}

impl ConfigSnapshot {
    pub fn technology(&self, id: u32) -> Option<&Technology> {
        self.technologies.iter().find(|t| t.id == id)
    }

    pub fn material(&self, id: u32) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn engrave_type(&self, id: u32) -> Option<&EngraveType> {
        self.engrave_types.iter().find(|e| e.id == id)
    }

    pub fn machine_rates(&self, technology_id: u32) -> MachineRates {
        match self
            .tech_rates
            .iter()
            .find(|r| r.technology_id == technology_id)
        {
            Some(r) => MachineRates {
                cost_per_min_engrave: r.cost_per_min_engrave,
                cost_per_min_cut: r.cost_per_min_cut,
                setup_fee: r.setup_fee,
                margin: r.margin_percent,
                configured: true,
            },
            None => MachineRates {
                cost_per_min_engrave: 0.0,
                cost_per_min_cut: 0.0,
                setup_fee: 0.0,
                margin: self.constants.default_margin_percent,
                configured: false,
            },
        }
    }

    pub fn material_factor(&self, material_id: u32) -> f64 {
        positive_or_one(self.material(material_id).map(|m| m.factor))
    }

    pub fn engrave_factor(&self, engrave_type_id: u32) -> f64 {
        positive_or_one(self.engrave_type(engrave_type_id).map(|e| e.factor))
    }

    pub fn speed_multiplier(&self, engrave_type_id: u32) -> f64 {
        positive_or_one(self.engrave_type(engrave_type_id).map(|e| e.speed_multiplier))
    }

    pub fn uv_premium(&self, technology_id: u32) -> f64 {
        self.technology(technology_id)
            .map_or(0.0, |t| t.uv_premium_factor)
    }

    pub fn spot_size(&self, technology_id: u32) -> f64 {
        self.technology(technology_id)
            .and_then(|t| t.spot_size_mm)
            .filter(|s| *s > 0.0)
            .unwrap_or(self.constants.default_spot_size_mm)
    }

    /// Discount fraction of the tier containing `quantity`, or 0.
    pub fn volume_discount(&self, quantity: u32) -> f64 {
        self.volume_discounts
            .iter()
            .find(|d| d.applies_to(quantity))
            .map_or(0.0, |d| d.discount_pct)
    }

    /// Speed row for the exact thickness, falling back to the generic row.
    pub fn material_speed(
        &self,
        technology_id: u32,
        material_id: u32,
        thickness: f64,
    ) -> Option<&MaterialSpeed> {
        let find = |t: f64| {
            self.material_speeds.iter().find(|s| {
                s.technology_id == technology_id && s.material_id == material_id && s.thickness == t
            })
        };
        find(thickness).or_else(|| find(0.0))
    }

    /// Material cost for the exact thickness, falling back to the generic row.
    pub fn material_cost(&self, material_id: u32, thickness: f64) -> Option<MaterialCostLookup> {
        let find = |t: f64| {
            self.material_costs
                .iter()
                .find(|c| c.material_id == material_id && c.thickness == t)
        };
        find(thickness).or_else(|| find(0.0)).map(|c| MaterialCostLookup {
            cost_per_mm2: c.effective_cost_per_mm2(),
            waste_pct: c.waste_pct.unwrap_or(self.constants.default_waste_pct),
        })
    }

    /// Fails when the matched speed row marks the combination incompatible.
    ///
    /// No row at all is compatible; the estimator then uses base speeds.
    pub fn check_compatibility(
        &self,
        technology_id: u32,
        material_id: u32,
        thickness: f64,
    ) -> Result<(), PricingError> {
        match self.material_speed(technology_id, material_id, thickness) {
            Some(row) if !row.compatible => {
                let reason = row
                    .notes
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(INCOMPATIBLE_DEFAULT_REASON);
                Err(PricingError::Incompatible(reason.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn positive_or_one(value: Option<f64>) -> f64 {
    value.filter(|v| *v > 0.0).unwrap_or(1.0)
}

// ── Sources ───────────────────────────────────────────────────────────────────

/// Where snapshots come from. Implementations are the external configuration
/// store; the engine only ever reads through this trait.
pub trait SnapshotSource: Send + Sync {
    fn load_snapshot(&self) -> Result<ConfigSnapshot, PricingError>;
}

/// A fixed snapshot is its own source.
impl SnapshotSource for ConfigSnapshot {
    fn load_snapshot(&self) -> Result<ConfigSnapshot, PricingError> {
        Ok(self.clone())
    }
}

/// Reads and validates a TOML file on every load.
#[derive(Debug, Clone)]
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TomlFileSource { path: path.into() }
    }
}

impl SnapshotSource for TomlFileSource {
    fn load_snapshot(&self) -> Result<ConfigSnapshot, PricingError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            PricingError::ConfigUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        parse(&text)
    }
}
