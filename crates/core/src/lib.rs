//! Core types and configuration for the order-flow forensics engine.
//!
//! This crate provides shared types used across all other crates:
//! - Trade tape and broker distribution types
//! - Analysis outputs (profiles, split orders, sentiment, verdicts)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, DistributionConfig, LayoutConfig, TapeConfig, VerdictConfig};
pub use error::{Error, Result};
pub use types::*;
