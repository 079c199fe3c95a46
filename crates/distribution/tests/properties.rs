//! Property-based tests for distribution graph invariants.
//!
//! Invariants checked:
//! 1. Symmetry: a seller's inverse allocations sum to its aggregated total
//! 2. Query order: forward and inverse results are sorted largest first
//! 3. Bounds: buyer, edge and seller counts never exceed their limits
//! 4. Layout: every column fits the configured height when its floors fit

use forensics_core::{BuyerEntry, DistributionConfig, InvestorType, LayoutConfig, SellerAllocation};
use forensics_distribution::{edge_bands, layout, DistributionGraph};
use proptest::prelude::*;

const CODES: [&str; 8] = ["AK", "BK", "CC", "DR", "KZ", "PD", "YP", "ZP"];

fn buyers_strategy() -> impl Strategy<Value = Vec<BuyerEntry>> {
    let allocation = (0usize..CODES.len(), 0u64..1_000_000);
    let buyer = (
        0usize..CODES.len(),
        0u64..5_000_000,
        prop::collection::vec(allocation, 0..14),
    );
    prop::collection::vec(buyer, 0..20).prop_map(|rows| {
        rows.into_iter()
            .map(|(code, amount, sellers)| BuyerEntry {
                code: CODES[code].to_string(),
                investor_type: InvestorType::Domestic,
                amount,
                sellers: sellers
                    .into_iter()
                    .map(|(seller, amount)| SellerAllocation {
                        seller_code: CODES[seller].to_string(),
                        seller_type: InvestorType::Foreign,
                        amount,
                    })
                    .collect(),
            })
            .collect()
    })
}

fn config_strategy() -> impl Strategy<Value = DistributionConfig> {
    (1usize..14, 1usize..12, 1usize..14).prop_map(|(top_buyers, edges_per_buyer, top_sellers)| {
        DistributionConfig {
            top_buyers,
            edges_per_buyer,
            top_sellers,
        }
    })
}

proptest! {
    #[test]
    fn inverse_totals_match_seller_totals(
        buyers in buyers_strategy(),
        config in config_strategy(),
    ) {
        let graph = DistributionGraph::build(&buyers, &config).unwrap();
        for code in CODES {
            let inverse: u64 = graph.query_inverse(code).iter().map(|a| a.amount).sum();
            prop_assert_eq!(inverse, graph.seller_total(code));

            let forward_into: u64 = graph
                .buyers()
                .iter()
                .flat_map(|b| graph.query_forward(&b.code))
                .filter(|e| e.seller_code == code)
                .map(|e| e.amount)
                .sum();
            prop_assert_eq!(forward_into, graph.seller_total(code));
        }
    }

    #[test]
    fn queries_sorted_descending(buyers in buyers_strategy()) {
        let graph = DistributionGraph::build(&buyers, &DistributionConfig::default()).unwrap();
        for code in CODES {
            for pair in graph.query_forward(code).windows(2) {
                prop_assert!(pair[0].amount >= pair[1].amount);
            }
            for pair in graph.query_inverse(code).windows(2) {
                prop_assert!(pair[0].amount >= pair[1].amount);
            }
        }
        for pair in graph.sellers().windows(2) {
            prop_assert!(pair[0].total >= pair[1].total);
        }
    }

    #[test]
    fn bounds_respected(buyers in buyers_strategy(), config in config_strategy()) {
        let graph = DistributionGraph::build(&buyers, &config).unwrap();
        prop_assert!(graph.buyers().len() <= config.top_buyers);
        prop_assert!(graph.sellers().len() <= config.top_sellers);
        for buyer in graph.buyers() {
            prop_assert!(graph.query_forward(&buyer.code).len() <= config.edges_per_buyer);
        }
    }

    #[test]
    fn layout_fits_column(buyers in buyers_strategy()) {
        let config = LayoutConfig::default();
        let graph = DistributionGraph::build(&buyers, &DistributionConfig::default()).unwrap();
        let placed = layout(graph.buyers(), graph.sellers(), &config);

        for column in [&placed.buyers, &placed.sellers] {
            for node in column.iter() {
                prop_assert!(node.height >= config.min_extent - 1e-9);
            }
            if let Some(last) = column.last() {
                prop_assert!(last.bottom() <= config.height + 1e-6);
            }
        }

        for band in edge_bands(&graph, &placed) {
            let buyer = placed.buyer(&band.buyer_code).unwrap();
            prop_assert!(band.buyer_offset + band.buyer_thickness <= buyer.bottom() + 1e-6);
            let seller = placed.seller(&band.seller_code).unwrap();
            prop_assert!(band.seller_offset + band.seller_thickness <= seller.bottom() + 1e-6);
        }
    }
}
