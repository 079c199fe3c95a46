//! Single-pass tape accumulation.
//!
//! Folds trades into side volumes, per-broker positions and per-investor-type
//! flows. Every trade credits exactly one buyer and one seller, so bought and
//! sold lots across all positions both sum to the tape's total lots.

use forensics_core::{
    BrokerPosition, Error, InvestorType, Lot, NationalityFlow, Result, Side, TradeRecord,
};
use std::collections::BTreeMap;

/// Running totals over a tape.
#[derive(Debug, Clone)]
pub struct TapeAccumulator {
    big_lot: Lot,
    trade_count: usize,
    buy_volume: Lot,
    sell_volume: Lot,
    total_value: u64,
    big_trade_count: usize,
    /// Positions keyed by broker code.
    positions: BTreeMap<String, BrokerPosition>,
    flows: BTreeMap<InvestorType, NationalityFlow>,
}

impl TapeAccumulator {
    /// Create an accumulator counting trades of at least `big_lot` as big.
    pub fn new(big_lot: Lot) -> Self {
        Self {
            big_lot,
            trade_count: 0,
            buy_volume: 0,
            sell_volume: 0,
            total_value: 0,
            big_trade_count: 0,
            positions: BTreeMap::new(),
            flows: InvestorType::ALL
                .iter()
                .map(|&t| (t, NationalityFlow::default()))
                .collect(),
        }
    }

    /// Add a trade.
    ///
    /// Fails with [`Error::Data`] when the tape-wide lot or value totals
    /// would overflow; the accumulator is unchanged in that case. Every other
    /// running sum is bounded by those two totals.
    pub fn add_trade(&mut self, trade: &TradeRecord) -> Result<()> {
        let overflow = || {
            Error::data(format!(
                "tape totals overflow at sequence {}",
                trade.sequence_id
            ))
        };
        let value = trade.value().ok_or_else(overflow)?;
        let total_value = self.total_value.checked_add(value).ok_or_else(overflow)?;
        self.buy_volume
            .checked_add(self.sell_volume)
            .and_then(|lots| lots.checked_add(trade.lot))
            .filter(|&lots| lots <= i64::MAX as Lot)
            .ok_or_else(overflow)?;

        self.trade_count += 1;
        match trade.side {
            Side::Buy => self.buy_volume += trade.lot,
            Side::Sell => self.sell_volume += trade.lot,
        }
        self.total_value = total_value;
        if trade.lot >= self.big_lot {
            self.big_trade_count += 1;
        }

        self.position_mut(&trade.buyer_code, trade.buyer_type)
            .record_buy(trade.lot);
        self.position_mut(&trade.seller_code, trade.seller_type)
            .record_sell(trade.lot);

        let buyer_flow = self.flows.entry(trade.buyer_type).or_default();
        buyer_flow.buy_lot += trade.lot;
        buyer_flow.buy_value += value;
        let seller_flow = self.flows.entry(trade.seller_type).or_default();
        seller_flow.sell_lot += trade.lot;
        seller_flow.sell_value += value;
        Ok(())
    }

    /// Add multiple trades, stopping at the first overflow.
    pub fn add_trades<'a>(
        &mut self,
        trades: impl IntoIterator<Item = &'a TradeRecord>,
    ) -> Result<()> {
        for trade in trades {
            self.add_trade(trade)?;
        }
        Ok(())
    }

    fn position_mut(&mut self, code: &str, investor_type: InvestorType) -> &mut BrokerPosition {
        self.positions
            .entry(code.to_string())
            .or_insert_with(|| BrokerPosition::new(code, investor_type))
    }

    pub fn trade_count(&self) -> usize {
        self.trade_count
    }

    pub fn buy_volume(&self) -> Lot {
        self.buy_volume
    }

    pub fn sell_volume(&self) -> Lot {
        self.sell_volume
    }

    pub fn total_value(&self) -> u64 {
        self.total_value
    }

    pub fn big_trade_count(&self) -> usize {
        self.big_trade_count
    }

    pub fn positions(&self) -> &BTreeMap<String, BrokerPosition> {
        &self.positions
    }

    pub fn flows(&self) -> &BTreeMap<InvestorType, NationalityFlow> {
        &self.flows
    }

    /// Consume the accumulator, returning positions and flows.
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<String, BrokerPosition>,
        BTreeMap<InvestorType, NationalityFlow>,
    ) {
        (self.positions, self.flows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use forensics_core::MarketBoard;

    pub(crate) fn make_trade(
        seq: u64,
        time: u32,
        lot: Lot,
        side: Side,
        buyer: &str,
        seller: &str,
    ) -> TradeRecord {
        TradeRecord {
            sequence_id: seq,
            time,
            price: 1000,
            lot,
            side,
            buyer_code: buyer.to_string(),
            seller_code: seller.to_string(),
            buyer_type: InvestorType::Domestic,
            seller_type: InvestorType::Domestic,
            board: MarketBoard::Regular,
        }
    }

    #[test]
    fn test_side_volumes() {
        let mut acc = TapeAccumulator::new(1000);
        acc.add_trade(&make_trade(1, 100, 300, Side::Buy, "AA", "BB")).unwrap();
        acc.add_trade(&make_trade(2, 101, 50, Side::Sell, "CC", "AA")).unwrap();

        assert_eq!(acc.trade_count(), 2);
        assert_eq!(acc.buy_volume(), 300);
        assert_eq!(acc.sell_volume(), 50);
        // 350 lots * 100 shares * 1000
        assert_eq!(acc.total_value(), 35_000_000);
    }

    #[test]
    fn test_positions_conserve_lots() {
        let mut acc = TapeAccumulator::new(1000);
        acc.add_trade(&make_trade(1, 100, 300, Side::Buy, "AA", "BB")).unwrap();
        acc.add_trade(&make_trade(2, 101, 50, Side::Sell, "CC", "AA")).unwrap();
        acc.add_trade(&make_trade(3, 102, 75, Side::Buy, "BB", "BB")).unwrap();

        let bought: Lot = acc.positions().values().map(|p| p.bought_lot).sum();
        let sold: Lot = acc.positions().values().map(|p| p.sold_lot).sum();
        assert_eq!(bought, 425);
        assert_eq!(sold, 425);

        let aa = &acc.positions()["AA"];
        assert_eq!(aa.bought_lot, 300);
        assert_eq!(aa.sold_lot, 50);
        assert_eq!(aa.net_lot, 250);
        assert_eq!(aa.buy_tx_count, 1);
        assert_eq!(aa.sell_tx_count, 1);

        // Self-cross credits both sides of the same broker.
        let bb = &acc.positions()["BB"];
        assert_eq!(bb.bought_lot, 75);
        assert_eq!(bb.sold_lot, 375);
    }

    #[test]
    fn test_big_trades_and_flows() {
        let mut acc = TapeAccumulator::new(1000);
        let mut foreign = make_trade(1, 100, 1000, Side::Buy, "AK", "YP");
        foreign.buyer_type = InvestorType::Foreign;
        acc.add_trade(&foreign).unwrap();
        acc.add_trade(&make_trade(2, 101, 999, Side::Buy, "YP", "AK")).unwrap();

        assert_eq!(acc.big_trade_count(), 1);
        let flows = acc.flows();
        assert_eq!(flows[&InvestorType::Foreign].buy_lot, 1000);
        assert_eq!(flows[&InvestorType::Foreign].sell_lot, 0);
        assert_eq!(flows[&InvestorType::Domestic].buy_lot, 999);
        assert_eq!(flows[&InvestorType::Domestic].sell_lot, 1999);
        assert_eq!(flows[&InvestorType::Government], NationalityFlow::default());
    }

    #[test]
    fn test_value_overflow_rejected() {
        let mut acc = TapeAccumulator::new(1000);
        let mut first = make_trade(1, 100, 1_000_000, Side::Buy, "AA", "BB");
        first.price = 100_000_000;
        let mut second = first.clone();
        second.sequence_id = 2;

        // 1e6 lots * 100 * 1e8 = 1e16 each; 2000 of them exceed u64.
        acc.add_trade(&first).unwrap();
        let err = (0..2000).try_for_each(|_| acc.add_trade(&second));
        assert!(matches!(err, Err(Error::Data(_))));
        assert_eq!(acc.trade_count(), 1844);
        assert_eq!(acc.total_value(), 18_440_000_000_000_000_000);
        assert_eq!(acc.buy_volume(), 1_844_000_000);
    }

    #[test]
    fn test_lot_overflow_rejected() {
        let mut acc = TapeAccumulator::new(1000);
        let mut huge = make_trade(1, 100, i64::MAX as Lot, Side::Buy, "AA", "BB");
        huge.price = 0;
        acc.add_trade(&huge).unwrap();
        huge.sequence_id = 2;
        huge.lot = 1;
        assert!(matches!(acc.add_trade(&huge), Err(Error::Data(_))));
        assert_eq!(acc.trade_count(), 1);
        assert_eq!(acc.positions()["AA"].net_lot, i64::MAX);
    }
}
