//! Split (iceberg) order detection.
//!
//! A broker fragmenting a large order shows up on the tape as a burst of
//! same-side trades it initiated a few seconds apart. The detector walks the
//! time-descending tape with a one-step look-back and chains every qualifying
//! adjacent pair into a group.

use forensics_core::{SecondsOfDay, SplitOrderGroup, TradeRecord};
use std::cmp::Reverse;

/// Sort trades into processing order: time descending, then sequence id
/// descending. The order never depends on arrival order, and sorting an
/// already sorted tape is a no-op.
pub fn sort_descending(trades: &mut [TradeRecord]) {
    trades.sort_by_key(|t| (Reverse(t.time), Reverse(t.sequence_id)));
}

/// Look-back split order detector.
#[derive(Debug, Clone, Copy)]
pub struct SplitOrderDetector {
    window_seconds: SecondsOfDay,
}

impl SplitOrderDetector {
    pub fn new(window_seconds: SecondsOfDay) -> Self {
        Self { window_seconds }
    }

    /// Whether `current` continues the fragment run ending at `prev`.
    fn continues(&self, prev: &TradeRecord, current: &TradeRecord) -> bool {
        prev.time.abs_diff(current.time) <= self.window_seconds
            && prev.side == current.side
            && prev.acting_broker() == current.acting_broker()
    }

    /// Detect split groups over trades already in processing order
    /// (see [`sort_descending`]). Only runs of two or more trades are kept.
    pub fn detect(&self, sorted: &[TradeRecord]) -> Vec<SplitOrderGroup> {
        let mut groups = Vec::new();
        let mut run: Vec<&TradeRecord> = Vec::new();

        for pair in sorted.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);
            if self.continues(prev, current) {
                if run.is_empty() {
                    run.push(prev);
                }
                run.push(current);
            } else {
                Self::close_run(&mut run, &mut groups);
            }
        }
        Self::close_run(&mut run, &mut groups);

        groups
    }

    fn close_run(run: &mut Vec<&TradeRecord>, groups: &mut Vec<SplitOrderGroup>) {
        if run.len() >= 2 {
            let first = run[0];
            groups.push(SplitOrderGroup {
                broker_code: first.acting_broker().to_string(),
                side: first.side,
                members: run.iter().map(|t| t.sequence_id).collect(),
                total_lot: run.iter().map(|t| t.lot).sum(),
                anchor_time: first.time,
            });
        }
        run.clear();
    }
}
