//! Data ingestion and normalization for the forensics engine.
//!
//! This crate handles:
//! - Time, numeral and code normalization
//! - Raw trade tape records and paged tape collection
//! - Tape request filters (side, board, minimum lot)
//! - Broker distribution payloads

pub mod distribution;
pub mod normalizer;
pub mod raw;
pub mod tape;

pub use distribution::{
    buyers_from_json, normalize_buyers, BrokerDistributionRequest, RawBuyerEntry,
    RawSellerAllocation,
};
pub use normalizer::NormalizeError;
pub use raw::{normalize_tape, RawTradeRecord};
pub use tape::{TapeCollector, TapePage, TradeTapeRequest};
