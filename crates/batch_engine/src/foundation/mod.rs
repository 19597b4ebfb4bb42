//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Power-of-two sizing helpers for pooled memory
//! - Logging utilities

pub mod logging;
pub mod memory;
