//! Raw trade records as delivered by the tape collaborator.
//!
//! Fields stay textual until [`RawTradeRecord::normalize`] validates them at
//! the ingestion boundary.

use crate::normalizer::{
    parse_broker_code, parse_investor_type, parse_market_board, parse_numeral, parse_side,
    parse_time_of_day, NormalizeError,
};
use forensics_core::{Error, MarketBoard, Result, TradeRecord};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One unvalidated row of the trade tape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTradeRecord {
    /// Sequence number; the record's index when absent.
    #[serde(default, deserialize_with = "text_or_number")]
    pub sequence_id: Option<String>,
    /// `HH:MM:SS`.
    pub time: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub lot: Option<String>,
    pub side: String,
    pub buyer_code: String,
    pub seller_code: String,
    pub buyer_type: String,
    pub seller_type: String,
    /// Board code; the regular market when absent.
    #[serde(default)]
    pub board: Option<String>,
}

impl RawTradeRecord {
    /// Validate every field, tagging failures with `index`.
    pub fn normalize(&self, index: usize) -> Result<TradeRecord> {
        let field = move |name: &'static str| {
            move |e: NormalizeError| Error::parse(index, name, e.to_string())
        };

        let sequence_id = match self.sequence_id.as_deref() {
            Some(raw) => parse_numeral(Some(raw)).map_err(field("sequence_id"))?,
            None => index as u64,
        };
        let board = match self.board.as_deref() {
            Some(raw) => parse_market_board(raw).map_err(field("board"))?,
            None => MarketBoard::Regular,
        };

        let trade = TradeRecord {
            sequence_id,
            time: parse_time_of_day(&self.time).map_err(field("time"))?,
            price: parse_numeral(self.price.as_deref()).map_err(field("price"))?,
            lot: parse_numeral(self.lot.as_deref()).map_err(field("lot"))?,
            side: parse_side(&self.side).map_err(field("side"))?,
            buyer_code: parse_broker_code(&self.buyer_code).map_err(field("buyer_code"))?,
            seller_code: parse_broker_code(&self.seller_code).map_err(field("seller_code"))?,
            buyer_type: parse_investor_type(&self.buyer_type).map_err(field("buyer_type"))?,
            seller_type: parse_investor_type(&self.seller_type).map_err(field("seller_type"))?,
            board,
        };
        if trade.value().is_none() {
            return Err(Error::parse(
                index,
                "lot",
                format!("{} lots at {} overflows the traded value", trade.lot, trade.price),
            ));
        }
        Ok(trade)
    }

    /// Whether the record carries its own sequence id.
    pub fn has_sequence_id(&self) -> bool {
        self.sequence_id.is_some()
    }
}

/// Normalize a whole tape, failing on the first malformed record.
///
/// Records must either all carry a sequence id or all omit it.
pub fn normalize_tape(records: &[RawTradeRecord]) -> Result<Vec<TradeRecord>> {
    sequence_id_form(records, 0)?;
    normalize_from(records, 0)
}

/// Whether the records carry explicit sequence ids; `None` for no records.
///
/// Missing ids are replaced with the record's tape index, which can collide
/// with an explicit id, so a tape mixing both forms is rejected.
pub(crate) fn sequence_id_form(
    records: &[RawTradeRecord],
    first_index: usize,
) -> Result<Option<bool>> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let explicit = first.has_sequence_id();
    if let Some(i) = records.iter().position(|r| r.has_sequence_id() != explicit) {
        return Err(Error::data(format!(
            "record {} {} a sequence id while earlier records {}",
            first_index + i,
            if explicit { "lacks" } else { "has" },
            if explicit { "have one" } else { "do not" },
        )));
    }
    Ok(Some(explicit))
}

/// Normalize records whose first element sits at `first_index` in the tape.
pub(crate) fn normalize_from(
    records: &[RawTradeRecord],
    first_index: usize,
) -> Result<Vec<TradeRecord>> {
    records
        .iter()
        .enumerate()
        .map(|(i, raw)| raw.normalize(first_index + i))
        .collect()
}

/// Accept numerals as JSON strings or JSON numbers.
pub(crate) fn text_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}
