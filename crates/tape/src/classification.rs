//! Participant classification.
//!
//! Rule-based tiers evaluated in priority order, first match wins:
//! BANDAR_BESAR, BANDAR, TRADER, RETAIL. Every rule is a lower bound on
//! average or total lots, so raising a broker's average lot at a fixed
//! transaction count never lowers its tier.

use forensics_core::{
    BrokerPosition, BrokerProfile, Classification, Lot, SplitOrderGroup, TapeConfig,
};
use std::collections::BTreeMap;

/// Threshold-driven broker classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    big_lot: Lot,
    big_total_lot: Lot,
    bandar_lot: Lot,
    bandar_total_lot: Lot,
    bandar_split_groups: usize,
    trader_avg_lot: Lot,
    trader_total_lot: Lot,
}

impl Classifier {
    /// Create a classifier from validated tape thresholds.
    pub fn new(config: &TapeConfig) -> Self {
        Self {
            big_lot: config.big_lot,
            big_total_lot: config.big_lot.saturating_mul(config.big_total_multiplier),
            bandar_lot: config.bandar_lot,
            bandar_total_lot: config.bandar_lot.saturating_mul(config.bandar_total_multiplier),
            bandar_split_groups: config.bandar_split_groups,
            trader_avg_lot: config.trader_avg_lot,
            trader_total_lot: config.trader_total_lot,
        }
    }

    /// Classify from activity totals.
    pub fn classify(&self, total_lot: Lot, total_tx: u32, split_groups: usize) -> Classification {
        let avg = average_lot(total_lot, total_tx);

        if avg >= self.big_lot as f64 || total_lot >= self.big_total_lot {
            Classification::BandarBesar
        } else if avg >= self.bandar_lot as f64
            || total_lot >= self.bandar_total_lot
            || split_groups >= self.bandar_split_groups
        {
            Classification::Bandar
        } else if avg >= self.trader_avg_lot as f64 || total_lot >= self.trader_total_lot {
            Classification::Trader
        } else {
            Classification::Retail
        }
    }

    /// Derive a profile for every position.
    ///
    /// Each profile lists the indices of the split groups its broker acted,
    /// in group order. Profiles come out in broker code order.
    pub fn build_profiles(
        &self,
        positions: BTreeMap<String, BrokerPosition>,
        groups: &[SplitOrderGroup],
    ) -> Vec<BrokerProfile> {
        let mut groups_by_broker: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, group) in groups.iter().enumerate() {
            groups_by_broker
                .entry(group.broker_code.as_str())
                .or_default()
                .push(i);
        }

        positions
            .into_values()
            .map(|position| {
                let split_groups = groups_by_broker
                    .get(position.code.as_str())
                    .cloned()
                    .unwrap_or_default();
                let total_lot = position.total_lot();
                let total_tx = position.total_tx();
                BrokerProfile {
                    total_tx,
                    total_lot,
                    avg_lot_per_tx: average_lot(total_lot, total_tx),
                    classification: self.classify(total_lot, total_tx, split_groups.len()),
                    split_groups,
                    position,
                }
            })
            .collect()
    }
}

/// Lots per transaction; zero when there are no transactions.
fn average_lot(total_lot: Lot, total_tx: u32) -> f64 {
    if total_tx > 0 {
        total_lot as f64 / total_tx as f64
    } else {
        0.0
    }
}
