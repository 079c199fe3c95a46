//! Verdict synthesis.
//!
//! Folds a tape analysis into one coarse call. Churn is checked first: heavy
//! two-way foreign flow whose traded value nets out to almost nothing is
//! volume without conviction, and no directional call is made on it.
//! Otherwise four signals vote -1, 0 or +1 each:
//! - buy/sell dominance (the sentiment direction)
//! - foreign net value, when it is large enough not to count as churn
//! - buy-side minus sell-side lots in split order groups
//! - net lots held by BANDAR and BANDAR_BESAR brokers

use forensics_core::{
    InvestorType, Result, Side, TapeAnalysis, Verdict, VerdictConfig, VerdictKind,
};

/// Combines tape signals into a [`Verdict`].
#[derive(Debug, Clone)]
pub struct VerdictSynthesizer {
    config: VerdictConfig,
}

impl VerdictSynthesizer {
    /// Create a synthesizer, rejecting invalid policy.
    pub fn new(config: VerdictConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VerdictConfig {
        &self.config
    }

    /// Synthesize a verdict from a completed analysis.
    pub fn synthesize(&self, analysis: &TapeAnalysis) -> Verdict {
        let Some(sentiment) = analysis.sentiment else {
            return neutral("no trades on the tape");
        };
        let foreign = analysis.flow(InvestorType::Foreign);
        let foreign_net = foreign.net_value();
        // Every trade has a buyer and a seller, so two-sided value is twice
        // the traded value.
        let total_value = analysis.total_value as f64;
        let (participation, net_ratio) = if analysis.total_value == 0 {
            (0.0, 0.0)
        } else {
            (
                foreign.gross_value() as f64 / (2.0 * total_value),
                foreign_net.unsigned_abs() as f64 / total_value,
            )
        };

        if participation >= self.config.min_foreign_participation
            && net_ratio <= self.config.churn_ratio
        {
            return Verdict {
                kind: VerdictKind::AvoidChurn,
                score: 0,
                rationale: format!(
                    "foreign investors took {:.1}% of two-sided value but netted {} \
                     ({:.2}% of traded value), churn suspected",
                    participation * 100.0,
                    foreign_net,
                    net_ratio * 100.0
                ),
            };
        }

        let mut reasons = Vec::with_capacity(4);

        let dominance = sentiment.direction.sign();
        reasons.push(format!("buy share {:.1}% ({:+})", sentiment.buy_percent, dominance));

        let foreign_vote = if net_ratio > self.config.churn_ratio {
            foreign_net.signum() as i32
        } else {
            0
        };
        reasons.push(format!("foreign net value {} ({:+})", foreign_net, foreign_vote));

        let (buy_split, sell_split) = split_lots(analysis);
        let split_vote = (buy_split as i64 - sell_split as i64).signum() as i32;
        reasons.push(format!(
            "{} split groups, {} buy vs {} sell lots ({:+})",
            analysis.split_groups.len(),
            buy_split,
            sell_split,
            split_vote
        ));

        let bandar_net: i64 = analysis
            .broker_profiles
            .iter()
            .filter(|p| p.classification.is_bandar())
            .map(|p| p.net_lot())
            .sum();
        let bandar_vote = bandar_net.signum() as i32;
        reasons.push(format!("bandar net {} lots ({:+})", bandar_net, bandar_vote));

        let score = dominance + foreign_vote + split_vote + bandar_vote;
        let kind = if score >= self.config.bullish_score {
            VerdictKind::Bullish
        } else if score <= -self.config.bullish_score {
            VerdictKind::Bearish
        } else {
            VerdictKind::Neutral
        };

        Verdict {
            kind,
            score,
            rationale: reasons.join("; "),
        }
    }
}

/// Lots in buy-side and sell-side split groups.
fn split_lots(analysis: &TapeAnalysis) -> (u64, u64) {
    analysis
        .split_groups
        .iter()
        .fold((0, 0), |(buy, sell), group| match group.side {
            Side::Buy => (buy + group.total_lot, sell),
            Side::Sell => (buy, sell + group.total_lot),
        })
}

fn neutral(reason: &str) -> Verdict {
    Verdict {
        kind: VerdictKind::Neutral,
        score: 0,
        rationale: reason.to_string(),
    }
}
