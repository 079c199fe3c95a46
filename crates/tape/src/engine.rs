//! Trade tape analysis engine.
//!
//! Combines the accumulation pass, split order detection, classification,
//! ranking and sentiment into one recomputation over a day's tape.

use crate::{
    accumulator::TapeAccumulator,
    classification::Classifier,
    ranking::{rank_profiles, top_accumulators, top_distributors},
    sentiment::compute_sentiment,
    split_orders::{sort_descending, SplitOrderDetector},
    statistics::lot_profile,
};
use forensics_core::{InvestorType, Result, TapeAnalysis, TapeConfig, TradeRecord};
use forensics_ingestion::{normalize_tape, RawTradeRecord, TapeCollector};
use tracing::debug;

/// Stateless tape analyzer holding validated thresholds.
#[derive(Debug, Clone)]
pub struct TapeAnalyzer {
    config: TapeConfig,
    classifier: Classifier,
    detector: SplitOrderDetector,
}

impl TapeAnalyzer {
    /// Create an analyzer, rejecting non-positive thresholds.
    pub fn new(config: TapeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: Classifier::new(&config),
            detector: SplitOrderDetector::new(config.split_window_seconds),
            config,
        })
    }

    pub fn config(&self) -> &TapeConfig {
        &self.config
    }

    /// Analyze one (symbol, date) tape.
    ///
    /// Trades are processed in time-descending order regardless of the order
    /// they arrive in. An empty tape yields [`TapeAnalysis::empty`]; a tape
    /// whose lot or value totals overflow fails with a data error.
    pub fn analyze(&self, trades: &[TradeRecord]) -> Result<TapeAnalysis> {
        if trades.is_empty() {
            debug!("empty tape");
            return Ok(TapeAnalysis::empty());
        }

        let mut sorted = trades.to_vec();
        sort_descending(&mut sorted);

        let mut accumulator = TapeAccumulator::new(self.config.big_lot);
        accumulator.add_trades(&sorted)?;

        let split_groups = self.detector.detect(&sorted);

        let trade_count = accumulator.trade_count();
        let buy_volume = accumulator.buy_volume();
        let sell_volume = accumulator.sell_volume();
        let total_value = accumulator.total_value();
        let big_trade_count = accumulator.big_trade_count();
        let (positions, flows) = accumulator.into_parts();

        let mut broker_profiles = self.classifier.build_profiles(positions, &split_groups);
        rank_profiles(&mut broker_profiles);
        let top_accumulators = top_accumulators(&broker_profiles, self.config.ranking_size);
        let top_distributors = top_distributors(&broker_profiles, self.config.ranking_size);

        let foreign_net = flows
            .get(&InvestorType::Foreign)
            .map(|f| f.net_lot())
            .unwrap_or(0);
        let sentiment = compute_sentiment(buy_volume, sell_volume, foreign_net, &self.config);

        debug!(
            trades = trade_count,
            brokers = broker_profiles.len(),
            split_groups = split_groups.len(),
            buy_percent = sentiment.buy_percent,
            "tape analyzed"
        );

        Ok(TapeAnalysis {
            trade_count,
            buy_volume,
            sell_volume,
            total_value,
            big_trade_count,
            flows,
            lot_profile: lot_profile(&sorted),
            broker_profiles,
            split_groups,
            top_accumulators,
            top_distributors,
            sentiment: Some(sentiment),
        })
    }

    /// Normalize raw records, then analyze. Parse errors propagate with the
    /// offending record index.
    pub fn analyze_raw(&self, raw: &[RawTradeRecord]) -> Result<TapeAnalysis> {
        let trades = normalize_tape(raw)?;
        self.analyze(&trades)
    }

    /// Analyze everything a collector has accumulated so far.
    pub fn analyze_collected(&self, collector: &TapeCollector) -> Result<TapeAnalysis> {
        self.analyze(collector.trades())
    }
}
