//! Core data types for the order-flow forensics engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Seconds since midnight (0..=86399).
pub type SecondsOfDay = u32;

/// Quantity in lots.
pub type Lot = u64;

/// Shares per lot.
pub const SHARES_PER_LOT: u64 = 100;

/// Last valid second of the trading day.
pub const MAX_SECONDS_OF_DAY: SecondsOfDay = 86_399;

/// Format seconds since midnight as `HH:MM:SS`.
pub fn format_time_of_day(secs: SecondsOfDay) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Side that initiated a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buyer lifted the offer.
    Buy,
    /// Seller hit the bid.
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Investor nationality class attached to each side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestorType {
    Domestic,
    Foreign,
    Government,
}

impl InvestorType {
    /// All investor types, in report order.
    pub const ALL: [InvestorType; 3] = [
        InvestorType::Domestic,
        InvestorType::Foreign,
        InvestorType::Government,
    ];

    /// Single-letter exchange code.
    pub fn code(self) -> char {
        match self {
            InvestorType::Domestic => 'D',
            InvestorType::Foreign => 'F',
            InvestorType::Government => 'G',
        }
    }
}

/// Market board a trade printed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarketBoard {
    /// Regular continuous market.
    #[serde(rename = "RG")]
    Regular,
    /// Negotiated block market.
    #[serde(rename = "NG")]
    Negotiated,
    /// Cash market.
    #[serde(rename = "TN")]
    Cash,
}

impl MarketBoard {
    pub fn code(self) -> &'static str {
        match self {
            MarketBoard::Regular => "RG",
            MarketBoard::Negotiated => "NG",
            MarketBoard::Cash => "TN",
        }
    }
}

/// A single executed trade from the day's tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Exchange sequence number.
    pub sequence_id: u64,
    /// Execution time, seconds since midnight.
    pub time: SecondsOfDay,
    /// Price in integer currency units.
    pub price: u64,
    /// Size in lots.
    pub lot: Lot,
    /// Initiating side.
    pub side: Side,
    pub buyer_code: String,
    pub seller_code: String,
    pub buyer_type: InvestorType,
    pub seller_type: InvestorType,
    pub board: MarketBoard,
}

impl TradeRecord {
    /// Broker that initiated the trade: the buyer on a buy, the seller on a sell.
    #[inline]
    pub fn acting_broker(&self) -> &str {
        match self.side {
            Side::Buy => &self.buyer_code,
            Side::Sell => &self.seller_code,
        }
    }

    /// Traded value in currency units (lot × price × 100), `None` when it
    /// does not fit in a `u64`.
    #[inline]
    pub fn value(&self) -> Option<u64> {
        self.lot
            .checked_mul(self.price)?
            .checked_mul(SHARES_PER_LOT)
    }
}

/// Net position of one broker over the tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerPosition {
    /// Broker code.
    pub code: String,
    /// Investor type first observed for this broker.
    pub investor_type: InvestorType,
    pub bought_lot: Lot,
    pub sold_lot: Lot,
    pub buy_tx_count: u32,
    pub sell_tx_count: u32,
    /// Bought minus sold lots.
    pub net_lot: i64,
}

impl BrokerPosition {
    /// Create an empty position.
    pub fn new(code: impl Into<String>, investor_type: InvestorType) -> Self {
        Self {
            code: code.into(),
            investor_type,
            bought_lot: 0,
            sold_lot: 0,
            buy_tx_count: 0,
            sell_tx_count: 0,
            net_lot: 0,
        }
    }

    /// Credit a purchase.
    pub fn record_buy(&mut self, lot: Lot) {
        self.bought_lot += lot;
        self.buy_tx_count += 1;
        self.net_lot += lot as i64;
    }

    /// Credit a sale.
    pub fn record_sell(&mut self, lot: Lot) {
        self.sold_lot += lot;
        self.sell_tx_count += 1;
        self.net_lot -= lot as i64;
    }

    /// Lots traded on either side.
    #[inline]
    pub fn total_lot(&self) -> Lot {
        self.bought_lot + self.sold_lot
    }

    /// Transactions on either side.
    #[inline]
    pub fn total_tx(&self) -> u32 {
        self.buy_tx_count + self.sell_tx_count
    }
}

/// A run of same-broker, same-side trades close together in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOrderGroup {
    /// Acting broker.
    pub broker_code: String,
    pub side: Side,
    /// Sequence ids of the member trades, in processing order.
    pub members: Vec<u64>,
    /// Sum of member lots.
    pub total_lot: Lot,
    /// Time of the first member in processing order (the latest fragment).
    pub anchor_time: SecondsOfDay,
}

impl SplitOrderGroup {
    #[inline]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Participant class derived from a broker's activity.
///
/// Variants are ordered by tier, so `Retail < Trader < Bandar < BandarBesar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Retail,
    Trader,
    Bandar,
    BandarBesar,
}

impl Classification {
    /// Bandar or bandar besar.
    pub fn is_bandar(self) -> bool {
        self >= Classification::Bandar
    }
}

/// Broker position plus derived activity metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerProfile {
    #[serde(flatten)]
    pub position: BrokerPosition,
    pub total_tx: u32,
    pub total_lot: Lot,
    pub avg_lot_per_tx: f64,
    pub classification: Classification,
    /// Indices into `TapeAnalysis::split_groups` acted by this broker.
    pub split_groups: Vec<usize>,
}

impl BrokerProfile {
    #[inline]
    pub fn code(&self) -> &str {
        &self.position.code
    }

    #[inline]
    pub fn net_lot(&self) -> i64 {
        self.position.net_lot
    }
}

/// Entry in the top accumulator/distributor lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedBroker {
    pub code: String,
    pub investor_type: InvestorType,
    pub net_lot: i64,
    pub classification: Classification,
}

/// Buy/sell totals for one investor type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalityFlow {
    pub buy_lot: Lot,
    pub sell_lot: Lot,
    pub buy_value: u64,
    pub sell_value: u64,
}

impl NationalityFlow {
    #[inline]
    pub fn net_lot(&self) -> i64 {
        self.buy_lot as i64 - self.sell_lot as i64
    }

    #[inline]
    pub fn gross_lot(&self) -> Lot {
        self.buy_lot + self.sell_lot
    }

    #[inline]
    pub fn net_value(&self) -> i128 {
        self.buy_value as i128 - self.sell_value as i128
    }

    #[inline]
    pub fn gross_value(&self) -> u128 {
        self.buy_value as u128 + self.sell_value as u128
    }
}

/// Descriptive statistics of trade sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LotProfile {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub max: Lot,
}

/// Directional read of the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// +1 for bullish, -1 for bearish, 0 for neutral.
    pub fn sign(self) -> i32 {
        match self {
            Direction::Bullish => 1,
            Direction::Bearish => -1,
            Direction::Neutral => 0,
        }
    }
}

/// Buy-dominance sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Buy-initiated share of volume, 0..=100.
    pub buy_percent: f64,
    pub direction: Direction,
    /// Foreign buy lots minus foreign sell lots.
    pub foreign_net: i64,
}

/// Complete result of analyzing one day's tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeAnalysis {
    pub trade_count: usize,
    /// Lots of buy-initiated trades.
    pub buy_volume: Lot,
    /// Lots of sell-initiated trades.
    pub sell_volume: Lot,
    /// Σ lot × price × 100.
    pub total_value: u64,
    /// Trades with lot ≥ big_lot.
    pub big_trade_count: usize,
    /// Totals per investor type, every type present.
    pub flows: BTreeMap<InvestorType, NationalityFlow>,
    pub lot_profile: LotProfile,
    /// Profiles ranked by total lots, descending.
    pub broker_profiles: Vec<BrokerProfile>,
    pub split_groups: Vec<SplitOrderGroup>,
    pub top_accumulators: Vec<RankedBroker>,
    pub top_distributors: Vec<RankedBroker>,
    /// `None` when the tape is empty.
    pub sentiment: Option<Sentiment>,
}

impl TapeAnalysis {
    /// A zero-valued analysis with every investor type present.
    pub fn empty() -> Self {
        Self {
            trade_count: 0,
            buy_volume: 0,
            sell_volume: 0,
            total_value: 0,
            big_trade_count: 0,
            flows: InvestorType::ALL
                .iter()
                .map(|&t| (t, NationalityFlow::default()))
                .collect(),
            lot_profile: LotProfile::default(),
            broker_profiles: Vec::new(),
            split_groups: Vec::new(),
            top_accumulators: Vec::new(),
            top_distributors: Vec::new(),
            sentiment: None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trade_count == 0
    }

    /// Buy plus sell volume.
    #[inline]
    pub fn total_volume(&self) -> Lot {
        self.buy_volume + self.sell_volume
    }

    /// Totals for one investor type (zero if absent).
    pub fn flow(&self, investor_type: InvestorType) -> NationalityFlow {
        self.flows.get(&investor_type).copied().unwrap_or_default()
    }

    /// Foreign buy lots minus foreign sell lots.
    pub fn foreign_net(&self) -> i64 {
        self.flow(InvestorType::Foreign).net_lot()
    }

    /// Look up a broker's profile.
    pub fn profile(&self, code: &str) -> Option<&BrokerProfile> {
        self.broker_profiles.iter().find(|p| p.code() == code)
    }
}

/// Coarse verdict combining the tape's signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictKind {
    Bullish,
    Bearish,
    Neutral,
    /// Heavy two-way foreign flow with no net conviction.
    AvoidChurn,
}

/// Synthesized verdict with its reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub kind: VerdictKind,
    /// Sum of the directional signals, -4..=4.
    pub score: i32,
    pub rationale: String,
}

/// Measure a broker distribution summary is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Currency value.
    #[default]
    Value,
    /// Lots.
    Volume,
}

/// Portion of a buyer's shares supplied by one seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerAllocation {
    pub seller_code: String,
    pub seller_type: InvestorType,
    pub amount: u64,
}

/// One row of the ranked buyer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerEntry {
    pub code: String,
    pub investor_type: InvestorType,
    /// Buyer's aggregate amount.
    pub amount: u64,
    /// Seller allocations, in the collaborator's order.
    pub sellers: Vec<SellerAllocation>,
}

/// Directed, weighted buyer-to-seller edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEdge {
    pub buyer_code: String,
    pub buyer_type: InvestorType,
    pub seller_code: String,
    pub seller_type: InvestorType,
    pub amount: u64,
}

/// A buyer supplied by a given seller, as returned by inverse queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverseAllocation {
    pub buyer_code: String,
    pub buyer_type: InvestorType,
    pub amount: u64,
}
