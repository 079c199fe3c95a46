//! Trade tape requests and paged collection.
//!
//! The tape collaborator serves a day's trades in pages behind an opaque
//! cursor. [`TapeCollector`] accumulates those pages into one cumulative,
//! normalized trade set; analysis is always recomputed over that whole set.

use crate::raw::{normalize_from, sequence_id_form, RawTradeRecord};
use chrono::NaiveDate;
use forensics_core::{Error, Lot, MarketBoard, Result, Side, TradeRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Which trades of a (symbol, date) window to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTapeRequest {
    pub symbol: String,
    pub date: NaiveDate,
    /// Only trades initiated from this side.
    #[serde(default)]
    pub side: Option<Side>,
    /// Only trades printed on this board.
    #[serde(default)]
    pub board: Option<MarketBoard>,
    /// Only trades of at least this many lots.
    #[serde(default)]
    pub min_lot: Option<Lot>,
}

impl TradeTapeRequest {
    /// Unfiltered request for a symbol and date.
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            side: None,
            board: None,
            min_lot: None,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_board(mut self, board: MarketBoard) -> Self {
        self.board = Some(board);
        self
    }

    pub fn with_min_lot(mut self, min_lot: Lot) -> Self {
        self.min_lot = Some(min_lot);
        self
    }

    /// Whether a trade passes every filter set on this request.
    pub fn matches(&self, trade: &TradeRecord) -> bool {
        self.side.map_or(true, |side| trade.side == side)
            && self.board.map_or(true, |board| trade.board == board)
            && self.min_lot.map_or(true, |min| trade.lot >= min)
    }
}

/// One page of the tape as returned by the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TapePage {
    pub trades: Vec<RawTradeRecord>,
    /// Cursor for the next page; `None` on the last page.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl TapePage {
    /// Parse a page from JSON. A bare array is read as a single final page.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.is_array() {
            return Ok(Self {
                trades: serde_json::from_value(value)?,
                next_cursor: None,
            });
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Accumulates tape pages into a cumulative, filtered trade set.
#[derive(Debug, Clone)]
pub struct TapeCollector {
    request: TradeTapeRequest,
    /// Accepted trades, in arrival order.
    trades: Vec<TradeRecord>,
    /// Sequence ids already accepted.
    seen: BTreeSet<u64>,
    /// Raw records received so far (the next record's tape index).
    received: usize,
    /// Whether records carry explicit sequence ids, fixed by the first
    /// non-empty page.
    explicit_ids: Option<bool>,
    pages: usize,
    cursor: Option<String>,
    complete: bool,
}

impl TapeCollector {
    pub fn new(request: TradeTapeRequest) -> Self {
        Self {
            request,
            trades: Vec::new(),
            seen: BTreeSet::new(),
            received: 0,
            explicit_ids: None,
            pages: 0,
            cursor: None,
            complete: false,
        }
    }

    /// Normalize and append one page.
    ///
    /// The page is validated as a whole: if any record fails, the collector
    /// is left unchanged. Returns the number of trades accepted from the page.
    pub fn push_page(&mut self, page: TapePage) -> Result<usize> {
        if self.complete {
            return Err(Error::data(format!(
                "tape for {} on {} is already complete",
                self.request.symbol, self.request.date
            )));
        }

        let form = sequence_id_form(&page.trades, self.received)?;
        if let (Some(expected), Some(found)) = (self.explicit_ids, form) {
            if expected != found {
                return Err(Error::data(format!(
                    "page {} {} sequence ids but earlier pages {}",
                    self.pages + 1,
                    if found { "carries" } else { "omits" },
                    if expected { "carry them" } else { "do not" },
                )));
            }
        }
        let normalized = normalize_from(&page.trades, self.received)?;
        self.explicit_ids = self.explicit_ids.or(form);
        self.received += page.trades.len();
        self.pages += 1;

        let before = self.trades.len();
        let mut duplicates = 0usize;
        for trade in normalized {
            if !self.request.matches(&trade) {
                continue;
            }
            if !self.seen.insert(trade.sequence_id) {
                duplicates += 1;
                continue;
            }
            self.trades.push(trade);
        }
        let accepted = self.trades.len() - before;

        self.complete = page.next_cursor.is_none();
        self.cursor = page.next_cursor;

        debug!(
            symbol = %self.request.symbol,
            page = self.pages,
            accepted,
            duplicates,
            total = self.trades.len(),
            complete = self.complete,
            "tape page collected"
        );
        Ok(accepted)
    }

    /// Cursor to request the next page with, if any.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether the last page has been received.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn request(&self) -> &TradeTapeRequest {
        &self.request
    }

    /// The cumulative accepted trade set.
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }
}
