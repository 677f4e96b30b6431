//! Deterministic building blocks for RFP compliance analysis.
//!
//! This crate holds everything that does not talk to the inference backend:
//!
//! - `domain`: security domains, vendor catalog, vendor context, language
//! - `item`: requirement items, verdicts, analysis results, status transitions
//! - `store`: the ordered item list mutated by a batch run
//! - `ingest`: splitting and noise-filtering of pasted or imported text
//! - `export`: compliance matrix projection (JSON / Markdown)
//! - `i18n`: localized verdict labels and matrix headers

pub mod domain;
pub mod export;
pub mod i18n;
pub mod ingest;
pub mod item;
pub mod store;

pub use domain::{CatalogError, Language, SecurityDomain, VendorContext};
pub use item::{
    AnalysisResult, IllegalTransition, ItemId, ItemStatus, RequirementItem, SourceReference,
    Verdict,
};
pub use store::ItemStore;
