//! Broker distribution graph.
//!
//! This crate handles:
//! - Building a bounded buyer-to-seller graph from a ranked buyer list
//! - Forward (buyer) and inverse (seller) queries
//! - Two-column node layout and edge band geometry

pub mod graph;
pub mod layout;

pub use graph::{BuyerNode, DistributionGraph, SellerNode};
pub use layout::{edge_bands, layout, EdgeBand, GraphLayout, NodeExtent};
