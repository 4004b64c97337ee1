//! Boundary operations exposed to the CLI and to any outer request layer.
//!
//! Sub-modules are grouped by concern:
//! - [`analyze`]: parse + analyze uploaded markup, with per-owner dedup
//! - [`quote`]: price an analysis and persist quote records
//!
//! # Error contract
//! Every fallible path returns `Result<_, AppError>`. No `unwrap()` or
//! `expect()` calls are present outside of `#[cfg(test)]`.

pub mod analyze;
pub mod quote;

pub use analyze::{
    analyze_upload, check_upload, parse_and_analyze, UploadOutcome, MAX_UPLOAD_BYTES,
};
pub use quote::{calculate, create_quote};
