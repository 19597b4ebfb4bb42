//! Batch formation
//!
//! - **BatchGenerator**: admission decisions for the open batch
//! - **BatchFactory**: greedy partition of a flush into pooled batches
//! - **Batch**: the finalized, immutable record handed to packing and drawing

pub mod batch;
pub mod factory;
pub mod generator;

pub use batch::Batch;
pub use factory::BatchFactory;
pub use generator::{AcceptAll, AdmissionPolicy, BatchGenerator, MaxItemsPolicy};
