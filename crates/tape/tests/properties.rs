//! Property-based tests for tape analysis invariants.
//!
//! Invariants checked:
//! 1. Lot conservation: bought == sold == buy volume + sell volume, nets sum to zero
//! 2. Split groups are minimal: two or more chained trades, one broker, one side
//! 3. No trade belongs to more than one split group
//! 4. Analysis does not depend on arrival order
//! 5. Classification never drops a tier as total lots grow

use forensics_core::{
    Classification, InvestorType, MarketBoard, Side, TapeConfig, TradeRecord,
};
use forensics_tape::{Classifier, TapeAnalyzer};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const BROKERS: [&str; 5] = ["AK", "BK", "CC", "YP", "ZP"];

fn trade_strategy() -> impl Strategy<Value = (u32, u64, bool, usize, usize, bool)> {
    (
        34_200u32..34_260,
        1u64..3_000,
        any::<bool>(),
        0usize..BROKERS.len(),
        0usize..BROKERS.len(),
        any::<bool>(),
    )
}

fn tape_strategy() -> impl Strategy<Value = Vec<TradeRecord>> {
    prop::collection::vec(trade_strategy(), 0..60).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (time, lot, buy, buyer, seller, foreign))| TradeRecord {
                sequence_id: i as u64,
                time,
                price: 1_000,
                lot,
                side: if buy { Side::Buy } else { Side::Sell },
                buyer_code: BROKERS[buyer].to_string(),
                seller_code: BROKERS[seller].to_string(),
                buyer_type: if foreign { InvestorType::Foreign } else { InvestorType::Domestic },
                seller_type: InvestorType::Domestic,
                board: MarketBoard::Regular,
            })
            .collect()
    })
}

fn analyzer() -> TapeAnalyzer {
    TapeAnalyzer::new(TapeConfig::default()).unwrap()
}

proptest! {
    #[test]
    fn lots_are_conserved(trades in tape_strategy()) {
        let analysis = analyzer().analyze(&trades).unwrap();

        let bought: u64 = analysis.broker_profiles.iter().map(|p| p.position.bought_lot).sum();
        let sold: u64 = analysis.broker_profiles.iter().map(|p| p.position.sold_lot).sum();
        let net: i64 = analysis.broker_profiles.iter().map(|p| p.net_lot()).sum();
        let total: u64 = trades.iter().map(|t| t.lot).sum();

        prop_assert_eq!(bought, total);
        prop_assert_eq!(sold, total);
        prop_assert_eq!(analysis.buy_volume + analysis.sell_volume, total);
        prop_assert_eq!(net, 0);

        let flow_buy: u64 = analysis.flows.values().map(|f| f.buy_lot).sum();
        let flow_sell: u64 = analysis.flows.values().map(|f| f.sell_lot).sum();
        prop_assert_eq!(flow_buy, total);
        prop_assert_eq!(flow_sell, total);
    }

    #[test]
    fn split_groups_are_minimal_and_disjoint(trades in tape_strategy()) {
        let analysis = analyzer().analyze(&trades).unwrap();
        let window = analysis_window();
        let by_id: BTreeMap<u64, &TradeRecord> =
            trades.iter().map(|t| (t.sequence_id, t)).collect();
        let mut seen = BTreeSet::new();

        for group in &analysis.split_groups {
            prop_assert!(group.member_count() >= 2);

            let members: Vec<&TradeRecord> = group.members.iter().map(|id| by_id[id]).collect();
            prop_assert_eq!(group.total_lot, members.iter().map(|t| t.lot).sum::<u64>());
            prop_assert_eq!(group.anchor_time, members[0].time);

            for t in &members {
                prop_assert_eq!(t.acting_broker(), group.broker_code.as_str());
                prop_assert_eq!(t.side, group.side);
            }
            for pair in members.windows(2) {
                prop_assert!(pair[0].time >= pair[1].time);
                prop_assert!(pair[0].time - pair[1].time <= window);
            }
            for id in &group.members {
                prop_assert!(seen.insert(*id), "trade {} in two groups", id);
            }
        }
    }

    #[test]
    fn arrival_order_is_irrelevant(trades in tape_strategy(), rotate in 0usize..60) {
        let mut shuffled = trades.clone();
        if !shuffled.is_empty() {
            let k = rotate % shuffled.len();
            shuffled.rotate_left(k);
            shuffled.reverse();
        }

        let a = analyzer().analyze(&trades).unwrap();
        let b = analyzer().analyze(&shuffled).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn classification_is_monotone(
        tx in 1u32..500,
        total in 0u64..20_000,
        extra in 0u64..20_000,
        groups in 0usize..4,
    ) {
        let classifier = Classifier::new(&TapeConfig::default());
        let lower = classifier.classify(total, tx, groups);
        let higher = classifier.classify(total + extra, tx, groups);
        prop_assert!(higher >= lower);
        prop_assert!(classifier.classify(total, tx, groups + 1) >= lower);
    }
}

fn analysis_window() -> u32 {
    TapeConfig::default().split_window_seconds
}

#[test]
fn retail_is_lowest_tier() {
    assert!(Classification::Retail < Classification::Trader);
    assert!(Classification::Trader < Classification::Bandar);
    assert!(Classification::Bandar < Classification::BandarBesar);
}
