//! Async runtime management
//!
//! Provides the blocking entry point for callers outside an async context.

pub mod executor;

pub use executor::{RuntimeConfig, StatsRuntime};
