//! Configuration structures for the forensics engine.
//!
//! Every heuristic threshold the engine uses lives here so it can be tuned
//! per market regime. Sections deserialize with defaults, so a partial JSON
//! file only needs the fields it overrides.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for one analysis invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trade tape analyzer thresholds.
    pub tape: TapeConfig,
    /// Distribution graph bounds.
    pub distribution: DistributionConfig,
    /// Node layout geometry.
    pub layout: LayoutConfig,
    /// Verdict synthesizer policy.
    pub verdict: VerdictConfig,
}

impl Config {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.tape.validate()?;
        self.distribution.validate()?;
        self.layout.validate()?;
        self.verdict.validate()
    }
}

fn require_positive(name: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::config(format!("{name} must be positive")));
    }
    Ok(())
}

/// Trade tape analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapeConfig {
    /// Lot size at which a single trade counts as big (BIG_LOT).
    pub big_lot: u64,
    /// Average lot per transaction marking a bandar (BANDAR_LOT).
    pub bandar_lot: u64,
    /// Maximum gap between fragments of one split order (seconds).
    pub split_window_seconds: u32,
    /// Multiple of `big_lot` in total lots that marks a BANDAR_BESAR.
    pub big_total_multiplier: u64,
    /// Multiple of `bandar_lot` in total lots that marks a BANDAR.
    pub bandar_total_multiplier: u64,
    /// Split groups attributed to a broker that mark a BANDAR.
    pub bandar_split_groups: usize,
    /// Average lot per transaction marking a TRADER.
    pub trader_avg_lot: u64,
    /// Total lots marking a TRADER.
    pub trader_total_lot: u64,
    /// Length of the top accumulator/distributor lists.
    pub ranking_size: usize,
    /// Buy percentage above which sentiment is bullish.
    pub bullish_percent: f64,
    /// Buy percentage below which sentiment is bearish.
    pub bearish_percent: f64,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            big_lot: 1000,
            bandar_lot: 500,
            split_window_seconds: 2,
            big_total_multiplier: 5,
            bandar_total_multiplier: 10,
            bandar_split_groups: 2,
            trader_avg_lot: 100,
            trader_total_lot: 1000,
            ranking_size: 5,
            bullish_percent: 60.0,
            bearish_percent: 40.0,
        }
    }
}

impl TapeConfig {
    /// Reject non-positive thresholds and inverted sentiment bounds.
    pub fn validate(&self) -> Result<()> {
        require_positive("big_lot", self.big_lot)?;
        require_positive("bandar_lot", self.bandar_lot)?;
        require_positive("split_window_seconds", self.split_window_seconds as u64)?;
        require_positive("big_total_multiplier", self.big_total_multiplier)?;
        require_positive("bandar_total_multiplier", self.bandar_total_multiplier)?;
        require_positive("bandar_split_groups", self.bandar_split_groups as u64)?;
        require_positive("trader_avg_lot", self.trader_avg_lot)?;
        require_positive("trader_total_lot", self.trader_total_lot)?;
        require_positive("ranking_size", self.ranking_size as u64)?;

        let in_range = |p: f64| p.is_finite() && (0.0..=100.0).contains(&p);
        if !in_range(self.bullish_percent) || !in_range(self.bearish_percent) {
            return Err(Error::config("sentiment percentages must lie within 0..=100"));
        }
        if self.bearish_percent >= self.bullish_percent {
            return Err(Error::config(format!(
                "bearish_percent ({}) must be below bullish_percent ({})",
                self.bearish_percent, self.bullish_percent
            )));
        }
        Ok(())
    }
}

/// Distribution graph configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Buyers kept from the head of the ranked list (topN).
    pub top_buyers: usize,
    /// Seller allocations kept per buyer.
    pub edges_per_buyer: usize,
    /// Distinct sellers kept on the graph's seller side (topK).
    pub top_sellers: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            top_buyers: 12,
            edges_per_buyer: 10,
            top_sellers: 12,
        }
    }
}

impl DistributionConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("top_buyers", self.top_buyers as u64)?;
        require_positive("edges_per_buyer", self.edges_per_buyer as u64)?;
        require_positive("top_sellers", self.top_sellers as u64)
    }
}

/// Geometry for the two-column node layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Total column height available to nodes and gaps.
    pub height: f64,
    /// Vertical gap between adjacent nodes.
    pub node_gap: f64,
    /// Minimum node extent so small nodes stay addressable.
    pub min_extent: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            height: 600.0,
            node_gap: 6.0,
            min_extent: 8.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(Error::config("layout height must be positive"));
        }
        if !(self.min_extent.is_finite() && self.min_extent > 0.0) {
            return Err(Error::config("layout min_extent must be positive"));
        }
        if !(self.node_gap.is_finite() && self.node_gap >= 0.0) {
            return Err(Error::config("layout node_gap must be non-negative"));
        }
        Ok(())
    }
}

/// Verdict synthesizer policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// |foreign net| / gross lots at or below which flow counts as churn.
    pub churn_ratio: f64,
    /// Share of gross lots foreign investors must trade for the churn check.
    pub min_foreign_participation: f64,
    /// Absolute score needed for a directional verdict.
    pub bullish_score: i32,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            churn_ratio: 0.02,
            min_foreign_participation: 0.20,
            bullish_score: 2,
        }
    }
}

impl VerdictConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.churn_ratio > 0.0 && self.churn_ratio < 1.0) {
            return Err(Error::config("churn_ratio must lie strictly between 0 and 1"));
        }
        if !(self.min_foreign_participation > 0.0 && self.min_foreign_participation <= 1.0) {
            return Err(Error::config("min_foreign_participation must lie within (0, 1]"));
        }
        if self.bullish_score <= 0 {
            return Err(Error::config("bullish_score must be positive"));
        }
        Ok(())
    }
}
