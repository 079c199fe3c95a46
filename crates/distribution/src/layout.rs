//! Two-column node layout and edge bands.
//!
//! Buyers sit in one column and sellers in the other. A node's height is
//! proportional to its share of the column total, with a floor so tiny
//! nodes stay addressable. Height the floor gives to small nodes is taken
//! back proportionally from the nodes above it.

use crate::graph::{BuyerNode, DistributionGraph, SellerNode};
use forensics_core::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vertical placement of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExtent {
    pub code: String,
    pub amount: u64,
    pub top: f64,
    pub height: f64,
}

impl NodeExtent {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Placement of both columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphLayout {
    pub buyers: Vec<NodeExtent>,
    pub sellers: Vec<NodeExtent>,
}

impl GraphLayout {
    pub fn buyer(&self, code: &str) -> Option<&NodeExtent> {
        self.buyers.iter().find(|n| n.code == code)
    }

    pub fn seller(&self, code: &str) -> Option<&NodeExtent> {
        self.sellers.iter().find(|n| n.code == code)
    }
}

/// Ribbon drawn for one visible edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeBand {
    pub buyer_code: String,
    pub seller_code: String,
    pub amount: u64,
    /// Absolute offset of the band inside the buyer node.
    pub buyer_offset: f64,
    pub buyer_thickness: f64,
    /// Absolute offset of the band inside the seller node.
    pub seller_offset: f64,
    pub seller_thickness: f64,
}

/// Lay out the buyer and seller columns, each in the order given.
pub fn layout(buyers: &[BuyerNode], sellers: &[SellerNode], config: &LayoutConfig) -> GraphLayout {
    let buyer_amounts: Vec<(&str, u64)> = buyers
        .iter()
        .map(|b| (b.code.as_str(), b.extent_amount()))
        .collect();
    let seller_amounts: Vec<(&str, u64)> =
        sellers.iter().map(|s| (s.code.as_str(), s.total)).collect();

    GraphLayout {
        buyers: column(&buyer_amounts, config),
        sellers: column(&seller_amounts, config),
    }
}

/// Place one column of nodes.
fn column(nodes: &[(&str, u64)], config: &LayoutConfig) -> Vec<NodeExtent> {
    let amounts: Vec<u64> = nodes.iter().map(|&(_, amount)| amount).collect();
    let heights = node_heights(&amounts, config);

    let mut top = 0.0;
    nodes
        .iter()
        .zip(heights)
        .map(|(&(code, amount), height)| {
            let extent = NodeExtent {
                code: code.to_string(),
                amount,
                top,
                height,
            };
            top += height + config.node_gap;
            extent
        })
        .collect()
}

/// Floor-clamped proportional heights.
///
/// Nodes whose proportional share falls under the floor are pinned to it and
/// the rest of the column is re-divided among the remaining nodes until no
/// share is under the floor. When the floors alone do not fit, every node
/// gets the floor and the column overflows.
fn node_heights(amounts: &[u64], config: &LayoutConfig) -> Vec<f64> {
    let n = amounts.len();
    if n == 0 {
        return Vec::new();
    }

    let floor = config.min_extent;
    let available = (config.height - config.node_gap * (n - 1) as f64).max(0.0);
    if floor * n as f64 >= available {
        return vec![floor; n];
    }

    let total: u128 = amounts.iter().map(|&a| u128::from(a)).sum();
    if total == 0 {
        return vec![available / n as f64; n];
    }

    let mut clamped = vec![false; n];
    loop {
        let pinned = clamped.iter().filter(|&&c| c).count();
        let remaining = available - floor * pinned as f64;
        let free_total: u128 = amounts
            .iter()
            .zip(&clamped)
            .filter(|&(_, &c)| !c)
            .map(|(&a, _)| u128::from(a))
            .sum();

        let heights: Vec<f64> = amounts
            .iter()
            .zip(&clamped)
            .map(|(&a, &c)| {
                if c {
                    floor
                } else if free_total == 0 {
                    remaining / (n - pinned) as f64
                } else {
                    remaining * a as f64 / free_total as f64
                }
            })
            .collect();

        let mut changed = false;
        for (i, &h) in heights.iter().enumerate() {
            if !clamped[i] && h < floor {
                clamped[i] = true;
                changed = true;
            }
        }
        if !changed {
            return heights;
        }
    }
}

/// Band geometry for every visible edge of the graph.
///
/// Bands stack in forward-query order inside a buyer node and in
/// inverse-query order inside a seller node. Band thickness at each end is
/// the edge's share of that node's amount.
pub fn edge_bands(graph: &DistributionGraph, layout: &GraphLayout) -> Vec<EdgeBand> {
    let mut seller_slots: BTreeMap<(&str, &str), (f64, f64)> = BTreeMap::new();
    for seller in &layout.sellers {
        let mut cursor = seller.top;
        for allocation in graph.query_inverse(&seller.code) {
            let thickness = share(allocation.amount, seller.amount, seller.height);
            seller_slots.insert(
                (allocation.buyer_code.as_str(), seller.code.as_str()),
                (cursor, thickness),
            );
            cursor += thickness;
        }
    }

    let mut bands = Vec::new();
    for buyer in &layout.buyers {
        let mut cursor = buyer.top;
        for edge in graph.query_forward(&buyer.code) {
            let Some(&(seller_offset, seller_thickness)) =
                seller_slots.get(&(edge.buyer_code.as_str(), edge.seller_code.as_str()))
            else {
                continue;
            };
            let thickness = share(edge.amount, buyer.amount, buyer.height);
            bands.push(EdgeBand {
                buyer_code: edge.buyer_code.clone(),
                seller_code: edge.seller_code.clone(),
                amount: edge.amount,
                buyer_offset: cursor,
                buyer_thickness: thickness,
                seller_offset,
                seller_thickness,
            });
            cursor += thickness;
        }
    }
    bands
}

fn share(amount: u64, total: u64, height: f64) -> f64 {
    if total == 0 {
        0.0
    } else {
        height * amount as f64 / total as f64
    }
}
