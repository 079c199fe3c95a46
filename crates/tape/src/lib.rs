//! Trade tape forensics.
//!
//! This crate handles:
//! - Per-broker accumulation and nationality flows
//! - Split (iceberg) order detection
//! - Broker classification and ranking
//! - Buy/sell sentiment and lot statistics
//! - Verdict synthesis

pub mod accumulator;
pub mod split_orders;
pub mod classification;
pub mod ranking;
pub mod sentiment;
pub mod statistics;
pub mod engine;
pub mod verdict;

pub use accumulator::TapeAccumulator;
pub use split_orders::{sort_descending, SplitOrderDetector};
pub use classification::Classifier;
pub use ranking::{rank_profiles, top_accumulators, top_distributors};
pub use sentiment::{buy_percent, compute_sentiment};
pub use statistics::lot_profile;
pub use engine::TapeAnalyzer;
pub use verdict::VerdictSynthesizer;
