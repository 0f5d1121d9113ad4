//! Risk thresholds for the hourly betting alert.

use crate::BettingEvent;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Filter parameters for the risk query.
///
/// A round is flagged when it paid out at least `high_win_threshold`, or when
/// it staked at least `high_bet_threshold` and paid out nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRules {
    /// Currency id rounds must be settled in
    pub currency_id: u32,
    /// Round status code (2 = settled)
    pub status: u8,
    /// Trailing window relative to query time
    pub lookback: Duration,
    /// Minimum win amount that is always alert-worthy
    pub high_win_threshold: f64,
    /// Minimum losing bet amount that is alert-worthy
    pub high_bet_threshold: f64,
}

impl Default for RiskRules {
    fn default() -> Self {
        Self {
            currency_id: 33,
            status: 2,
            lookback: Duration::from_secs(60 * 60),
            high_win_threshold: 50_000.0,
            high_bet_threshold: 20_000.0,
        }
    }
}

impl RiskRules {
    /// Check whether an event satisfies the risk condition.
    ///
    /// Mirrors the `WHERE` clause of the risk query so rows can be
    /// re-checked after decoding.
    pub fn is_flagged(&self, event: &BettingEvent) -> bool {
        event.win_amount >= self.high_win_threshold
            || (event.bet_amount >= self.high_bet_threshold && event.win_amount == 0.0)
    }

    /// Lookback window in whole seconds, as used in the `INTERVAL` clause.
    pub fn lookback_secs(&self) -> u64 {
        self.lookback.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn event(bet: f64, win: f64) -> BettingEvent {
        BettingEvent::new(1, "p@example.com", "Roulette", NaiveDateTime::default(), bet, win)
    }

    #[test]
    fn test_default_rules() {
        let rules = RiskRules::default();
        assert_eq!(rules.currency_id, 33);
        assert_eq!(rules.status, 2);
        assert_eq!(rules.lookback_secs(), 3600);
        assert_eq!(rules.high_win_threshold, 50_000.0);
        assert_eq!(rules.high_bet_threshold, 20_000.0);
    }

    // === High win ===

    #[test]
    fn test_high_win_flagged() {
        let rules = RiskRules::default();
        assert!(rules.is_flagged(&event(10.0, 50_000.0)));
        assert!(rules.is_flagged(&event(25_000.0, 80_000.0)));
    }

    #[test]
    fn test_win_just_below_threshold_not_flagged() {
        let rules = RiskRules::default();
        assert!(!rules.is_flagged(&event(10.0, 49_999.99)));
    }

    // === High losing bet ===

    #[test]
    fn test_high_losing_bet_flagged() {
        let rules = RiskRules::default();
        assert!(rules.is_flagged(&event(20_000.0, 0.0)));
        assert!(rules.is_flagged(&event(1_000_000.0, 0.0)));
    }

    #[test]
    fn test_high_bet_with_any_win_not_flagged() {
        let rules = RiskRules::default();
        assert!(!rules.is_flagged(&event(20_000.0, 0.01)));
        assert!(!rules.is_flagged(&event(30_000.0, 40_000.0)));
    }

    #[test]
    fn test_small_losing_bet_not_flagged() {
        let rules = RiskRules::default();
        assert!(!rules.is_flagged(&event(19_999.99, 0.0)));
    }

    #[test]
    fn test_custom_thresholds() {
        let rules = RiskRules {
            high_win_threshold: 100.0,
            high_bet_threshold: 10.0,
            ..Default::default()
        };
        assert!(rules.is_flagged(&event(1.0, 100.0)));
        assert!(rules.is_flagged(&event(10.0, 0.0)));
        assert!(!rules.is_flagged(&event(9.0, 0.0)));
    }
}
