//! Config Module
//!
//! Centralized tuning for placement and connector pruning.

pub mod build_config;

pub use build_config::BuildConfig;
