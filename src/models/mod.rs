pub mod analysis;
pub mod bounds;
pub mod operation;
pub mod quote;

pub use analysis::{complexity_factor, Analysis, ElementResult, JobGeometry, PrimitiveKind};
pub use bounds::{BoundingBox, Point};
pub use operation::{Operation, OperationSet};
pub use quote::{
    round_money, AppliedFactors, ApprovalStatus, CostBreakdown, EffectiveSpeeds, ModelPrice,
    PriceModel, PriceResult, QuoteSelection, Simulation, TimeBreakdown, PRICE_RESULT_VERSION,
};
