//! # Geometry
//!
//! Composite buffer assembly: the pooled scratch storage, the copy kernels a
//! pack plan is compiled from, and the packer that fills one composite
//! geometry per flush.

pub mod buffer_pool;
pub mod composite;
mod kernels;
pub mod packer;

pub use buffer_pool::{BufferPool, PooledBuffer};
pub use composite::CompositeGeometry;
pub use packer::GeometryPacker;
