//! Buy-dominance sentiment.

use forensics_core::{Direction, Lot, Sentiment, TapeConfig};

/// Buy-initiated share of volume in percent; 50 when there is no volume.
pub fn buy_percent(buy_volume: Lot, sell_volume: Lot) -> f64 {
    let total = buy_volume + sell_volume;
    if total > 0 {
        buy_volume as f64 / total as f64 * 100.0
    } else {
        50.0
    }
}

/// Sentiment from side volumes, with foreign net flow reported alongside.
pub fn compute_sentiment(
    buy_volume: Lot,
    sell_volume: Lot,
    foreign_net: i64,
    config: &TapeConfig,
) -> Sentiment {
    let buy_percent = buy_percent(buy_volume, sell_volume);
    let direction = if buy_percent > config.bullish_percent {
        Direction::Bullish
    } else if buy_percent < config.bearish_percent {
        Direction::Bearish
    } else {
        Direction::Neutral
    };

    Sentiment {
        buy_percent,
        direction,
        foreign_net,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_buy_percent() {
        assert_relative_eq!(buy_percent(700, 100), 87.5);
        assert_relative_eq!(buy_percent(0, 0), 50.0);
        assert_relative_eq!(buy_percent(0, 10), 0.0);
    }

    #[test]
    fn test_direction_bounds_are_exclusive() {
        let config = TapeConfig::default();
        assert_eq!(compute_sentiment(61, 39, 0, &config).direction, Direction::Bullish);
        assert_eq!(compute_sentiment(60, 40, 0, &config).direction, Direction::Neutral);
        assert_eq!(compute_sentiment(40, 60, 0, &config).direction, Direction::Neutral);
        assert_eq!(compute_sentiment(39, 61, 0, &config).direction, Direction::Bearish);
        assert_eq!(compute_sentiment(0, 0, 0, &config).direction, Direction::Neutral);
    }

    #[test]
    fn test_foreign_net_passthrough() {
        let sentiment = compute_sentiment(10, 10, -250, &TapeConfig::default());
        assert_eq!(sentiment.foreign_net, -250);
    }
}
