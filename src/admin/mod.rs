//! Read-only administrative listings.
//!
//! Each registered table gets a list view with search, filters, ordering
//! and pagination, configured in [`registry::MODELS`].

pub mod query;
pub mod registry;

pub use query::{AdminQuery, Listing};
pub use registry::{ModelAdmin, ModelSummary, MODELS};
