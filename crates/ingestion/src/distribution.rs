//! Broker distribution payloads.
//!
//! The distribution collaborator returns a ranked buyer list where each buyer
//! nests the sellers that supplied it. This module validates that payload into
//! [`BuyerEntry`] values.

use crate::normalizer::{parse_broker_code, parse_investor_type, parse_numeral, NormalizeError};
use crate::raw::text_or_number;
use chrono::NaiveDate;
use forensics_core::{BuyerEntry, Error, Metric, Result, SellerAllocation};
use serde::{Deserialize, Serialize};

/// Request for a (symbol, date) broker distribution summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerDistributionRequest {
    pub symbol: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub metric: Metric,
}

impl BrokerDistributionRequest {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, metric: Metric) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            metric,
        }
    }
}

/// Unvalidated seller allocation nested under a buyer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSellerAllocation {
    pub seller_code: String,
    pub seller_type: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub amount: Option<String>,
}

/// Unvalidated row of the ranked buyer list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBuyerEntry {
    pub code: String,
    pub investor_type: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub amount: Option<String>,
    #[serde(default)]
    pub sellers: Vec<RawSellerAllocation>,
}

impl RawBuyerEntry {
    /// Validate the buyer and its allocations; `index` is the buyer's rank.
    pub fn normalize(&self, index: usize) -> Result<BuyerEntry> {
        let field = move |name: &'static str| {
            move |e: NormalizeError| Error::parse(index, name, e.to_string())
        };

        let sellers = self
            .sellers
            .iter()
            .map(|s| -> Result<SellerAllocation> {
                Ok(SellerAllocation {
                    seller_code: parse_broker_code(&s.seller_code).map_err(field("seller_code"))?,
                    seller_type: parse_investor_type(&s.seller_type)
                        .map_err(field("seller_type"))?,
                    amount: parse_numeral(s.amount.as_deref()).map_err(field("seller_amount"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BuyerEntry {
            code: parse_broker_code(&self.code).map_err(field("code"))?,
            investor_type: parse_investor_type(&self.investor_type)
                .map_err(field("investor_type"))?,
            amount: parse_numeral(self.amount.as_deref()).map_err(field("amount"))?,
            sellers,
        })
    }
}

/// Validate a ranked buyer list, preserving rank order.
pub fn normalize_buyers(raw: &[RawBuyerEntry]) -> Result<Vec<BuyerEntry>> {
    raw.iter()
        .enumerate()
        .map(|(i, entry)| entry.normalize(i))
        .collect()
}

/// Parse and validate a ranked buyer list from a JSON array.
pub fn buyers_from_json(json: &str) -> Result<Vec<BuyerEntry>> {
    let raw: Vec<RawBuyerEntry> = serde_json::from_str(json)?;
    normalize_buyers(&raw)
}
