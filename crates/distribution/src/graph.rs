//! Bipartite buyer-to-seller distribution graph.
//!
//! Built once from the collaborator's ranked buyer list. Forward queries are
//! served from an adjacency list keyed by buyer code and inverse queries from
//! an index keyed by seller code, both sorted when the graph is built.

use forensics_core::{
    BuyerEntry, DistributionConfig, DistributionEdge, Error, InverseAllocation, InvestorType,
    Result, SellerAllocation,
};
use forensics_ingestion::{normalize_buyers, RawBuyerEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A buyer retained on the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerNode {
    pub code: String,
    pub investor_type: InvestorType,
    /// Aggregate amount declared by the collaborator.
    pub amount: u64,
    /// Sum of the buyer's retained edges.
    pub retained: u64,
}

impl BuyerNode {
    /// Amount the buyer's node is sized by. Never below its retained edges,
    /// so edge bands always fit inside the node.
    pub fn extent_amount(&self) -> u64 {
        self.amount.max(self.retained)
    }
}

/// A seller on the graph's seller side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerNode {
    pub code: String,
    pub investor_type: InvestorType,
    /// Aggregated amount across all retained edges.
    pub total: u64,
}

/// Buyer row after duplicate merging.
struct MergedBuyer {
    code: String,
    investor_type: InvestorType,
    amount: u64,
    sellers: Vec<SellerAllocation>,
}

/// Queryable distribution graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionGraph {
    buyers: Vec<BuyerNode>,
    sellers: Vec<SellerNode>,
    adjacency: BTreeMap<String, Vec<DistributionEdge>>,
    inverse: BTreeMap<String, Vec<InverseAllocation>>,
    seller_totals: BTreeMap<String, u64>,
}

impl DistributionGraph {
    /// Build the graph from a ranked buyer list.
    ///
    /// Keeps the first `top_buyers` rows, merging repeated buyer codes among
    /// them, and the first `edges_per_buyer` allocations of each merged buyer.
    /// Sellers are then ranked by their aggregated totals (descending, ties by
    /// code) and `top_sellers` of them form the seller side. Amounts whose
    /// sums overflow fail with [`Error::Data`].
    pub fn build(buyers: &[BuyerEntry], config: &DistributionConfig) -> Result<Self> {
        config.validate()?;

        let ranked = &buyers[..buyers.len().min(config.top_buyers)];
        let merged = merge_duplicates(ranked)?;

        let mut buyer_nodes = Vec::new();
        let mut adjacency: BTreeMap<String, Vec<DistributionEdge>> = BTreeMap::new();
        let mut inverse: BTreeMap<String, Vec<InverseAllocation>> = BTreeMap::new();
        let mut seller_totals: BTreeMap<String, u64> = BTreeMap::new();
        let mut seller_types: BTreeMap<String, InvestorType> = BTreeMap::new();

        for buyer in merged {
            let mut edges: Vec<DistributionEdge> = buyer
                .sellers
                .iter()
                .take(config.edges_per_buyer)
                .map(|s| DistributionEdge {
                    buyer_code: buyer.code.clone(),
                    buyer_type: buyer.investor_type,
                    seller_code: s.seller_code.clone(),
                    seller_type: s.seller_type,
                    amount: s.amount,
                })
                .collect();

            let retained = checked_sum(edges.iter().map(|e| e.amount))
                .ok_or_else(|| overflow(&buyer.code))?;
            if retained > buyer.amount {
                warn!(
                    buyer = %buyer.code,
                    retained,
                    declared = buyer.amount,
                    "retained edges exceed buyer aggregate"
                );
            }

            for edge in &edges {
                let total = seller_totals.entry(edge.seller_code.clone()).or_insert(0);
                *total = total
                    .checked_add(edge.amount)
                    .ok_or_else(|| overflow(&edge.seller_code))?;
                seller_types
                    .entry(edge.seller_code.clone())
                    .or_insert(edge.seller_type);
                inverse
                    .entry(edge.seller_code.clone())
                    .or_default()
                    .push(InverseAllocation {
                        buyer_code: buyer.code.clone(),
                        buyer_type: buyer.investor_type,
                        amount: edge.amount,
                    });
            }

            edges.sort_by(|a, b| {
                b.amount
                    .cmp(&a.amount)
                    .then_with(|| a.seller_code.cmp(&b.seller_code))
            });
            adjacency.insert(buyer.code.clone(), edges);

            buyer_nodes.push(BuyerNode {
                code: buyer.code,
                investor_type: buyer.investor_type,
                amount: buyer.amount,
                retained,
            });
        }

        for allocations in inverse.values_mut() {
            allocations.sort_by(|a, b| {
                b.amount
                    .cmp(&a.amount)
                    .then_with(|| a.buyer_code.cmp(&b.buyer_code))
            });
        }

        let mut sellers: Vec<SellerNode> = seller_totals
            .iter()
            .map(|(code, &total)| SellerNode {
                code: code.clone(),
                investor_type: seller_types
                    .get(code)
                    .copied()
                    .unwrap_or(InvestorType::Domestic),
                total,
            })
            .collect();
        sellers.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.code.cmp(&b.code)));
        sellers.truncate(config.top_sellers);

        debug!(
            buyers = buyer_nodes.len(),
            sellers = sellers.len(),
            distinct_sellers = seller_totals.len(),
            "distribution graph built"
        );

        Ok(Self {
            buyers: buyer_nodes,
            sellers,
            adjacency,
            inverse,
            seller_totals,
        })
    }

    /// Normalize a raw buyer list, then build.
    pub fn build_raw(raw: &[RawBuyerEntry], config: &DistributionConfig) -> Result<Self> {
        let buyers = normalize_buyers(raw)?;
        Self::build(&buyers, config)
    }

    /// Retained buyers in rank order.
    pub fn buyers(&self) -> &[BuyerNode] {
        &self.buyers
    }

    /// Top-K sellers, largest total first.
    pub fn sellers(&self) -> &[SellerNode] {
        &self.sellers
    }

    /// Outgoing edges of a buyer, largest amount first.
    pub fn query_forward(&self, buyer: &str) -> &[DistributionEdge] {
        self.adjacency.get(buyer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buyers supplied by a seller, largest amount first.
    pub fn query_inverse(&self, seller: &str) -> &[InverseAllocation] {
        self.inverse.get(seller).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Aggregated total of a seller across all retained edges.
    pub fn seller_total(&self, seller: &str) -> u64 {
        self.seller_totals.get(seller).copied().unwrap_or(0)
    }

    pub fn is_visible_seller(&self, seller: &str) -> bool {
        self.sellers.iter().any(|s| s.code == seller)
    }

    /// Edges whose seller is on the seller side, in buyer rank order and
    /// forward-query order within a buyer.
    pub fn visible_edges(&self) -> Vec<&DistributionEdge> {
        self.buyers
            .iter()
            .flat_map(|b| self.query_forward(&b.code))
            .filter(|e| self.is_visible_seller(&e.seller_code))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buyers.is_empty()
    }
}

/// Merge repeated buyer codes into their first occurrence.
///
/// Amounts add up; allocations are appended, and an allocation to a seller the
/// buyer already lists is folded into the existing one.
fn merge_duplicates(buyers: &[BuyerEntry]) -> Result<Vec<MergedBuyer>> {
    let mut merged: Vec<MergedBuyer> = Vec::with_capacity(buyers.len());
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();

    for entry in buyers {
        let idx = match positions.get(entry.code.as_str()) {
            Some(&idx) => {
                warn!(buyer = %entry.code, "duplicate buyer merged into first occurrence");
                merged[idx].amount = merged[idx]
                    .amount
                    .checked_add(entry.amount)
                    .ok_or_else(|| overflow(&entry.code))?;
                idx
            }
            None => {
                positions.insert(entry.code.as_str(), merged.len());
                merged.push(MergedBuyer {
                    code: entry.code.clone(),
                    investor_type: entry.investor_type,
                    amount: entry.amount,
                    sellers: Vec::with_capacity(entry.sellers.len()),
                });
                merged.len() - 1
            }
        };

        let sellers = &mut merged[idx].sellers;
        for allocation in &entry.sellers {
            match sellers
                .iter_mut()
                .find(|s| s.seller_code == allocation.seller_code)
            {
                Some(existing) => {
                    existing.amount = existing
                        .amount
                        .checked_add(allocation.amount)
                        .ok_or_else(|| overflow(&entry.code))?;
                }
                None => sellers.push(allocation.clone()),
            }
        }
    }

    Ok(merged)
}

fn checked_sum(amounts: impl IntoIterator<Item = u64>) -> Option<u64> {
    amounts
        .into_iter()
        .try_fold(0u64, |sum, amount| sum.checked_add(amount))
}

fn overflow(code: &str) -> Error {
    Error::data(format!("distribution amounts for {code} overflow"))
}
