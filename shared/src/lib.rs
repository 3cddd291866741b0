//! Shared constants and helpers for the TotalGB host bridge.

pub mod constants;
pub mod fs;

pub use constants::*;
