//! Size-dependent slippage model.
//!
//! Ratio by notional amount:
//! - below 1M: flat 0.05%
//! - 1M to 5M: linear from 0.05% to 0.15%
//! - 5M to 10M: linear from 0.15% to 0.30%
//! - 10M and above: 0.30% plus 0.10% per additional 10M, unbounded

const TIER_1: f64 = 1_000_000.0;
const TIER_2: f64 = 5_000_000.0;
const TIER_3: f64 = 10_000_000.0;

const BASE_RATIO: f64 = 0.0005;
const TIER_2_RATIO: f64 = 0.0015;
const TIER_3_RATIO: f64 = 0.003;
const PER_EXTRA_10M: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlippageModel {
    /// Execute at the quoted price.
    #[default]
    None,
    /// Piecewise-linear tiers by notional amount.
    Tiered,
}

impl SlippageModel {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            SlippageModel::Tiered
        } else {
            SlippageModel::None
        }
    }

    pub fn is_enabled(self) -> bool {
        self == SlippageModel::Tiered
    }

    /// Adjustment ratio for an order of `amount` currency units.
    pub fn ratio(self, amount: f64) -> f64 {
        match self {
            SlippageModel::None => 0.0,
            SlippageModel::Tiered => tiered_ratio(amount),
        }
    }

    /// Execution price paid when buying.
    pub fn buy_price(self, price: f64, amount: f64) -> (f64, f64) {
        let ratio = self.ratio(amount);
        (price * (1.0 + ratio), ratio)
    }

    /// Execution price received when selling, floored at zero once the
    /// ratio reaches 100%.
    pub fn sell_price(self, price: f64, amount: f64) -> (f64, f64) {
        let ratio = self.ratio(amount);
        ((price * (1.0 - ratio)).max(0.0), ratio)
    }
}

fn tiered_ratio(amount: f64) -> f64 {
    if amount < TIER_1 {
        BASE_RATIO
    } else if amount < TIER_2 {
        let t = (amount - TIER_1) / (TIER_2 - TIER_1);
        (BASE_RATIO + (TIER_2_RATIO - BASE_RATIO) * t).min(TIER_2_RATIO)
    } else if amount < TIER_3 {
        let t = (amount - TIER_2) / (TIER_3 - TIER_2);
        (TIER_2_RATIO + (TIER_3_RATIO - TIER_2_RATIO) * t).min(TIER_3_RATIO)
    } else {
        TIER_3_RATIO + PER_EXTRA_10M * (amount - TIER_3) / TIER_3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const T: SlippageModel = SlippageModel::Tiered;

    #[test]
    fn flat_below_first_tier() {
        assert_eq!(T.ratio(0.0), 0.0005);
        assert_eq!(T.ratio(100_000.0), 0.0005);
        assert_eq!(T.ratio(999_999.0), 0.0005);
    }

    #[test]
    fn tier_boundaries() {
        assert_relative_eq!(T.ratio(1_000_000.0), 0.0005);
        assert_relative_eq!(T.ratio(3_000_000.0), 0.001);
        assert_relative_eq!(T.ratio(5_000_000.0), 0.0015);
        assert_relative_eq!(T.ratio(7_500_000.0), 0.00225);
        assert_relative_eq!(T.ratio(10_000_000.0), 0.003);
        assert_relative_eq!(T.ratio(20_000_000.0), 0.004);
        assert_relative_eq!(T.ratio(50_000_000.0), 0.007);
    }

    #[test]
    fn continuous_at_tier_edges() {
        for edge in [TIER_1, TIER_2, TIER_3] {
            let below = T.ratio(edge - 1e-3);
            let at = T.ratio(edge);
            assert!((at - below).abs() < 1e-9, "jump at {}", edge);
        }
    }

    #[test]
    fn disabled_model_is_zero() {
        let none = SlippageModel::from_enabled(false);
        assert_eq!(none.ratio(50_000_000.0), 0.0);
        assert_eq!(none.buy_price(100.0, 1e9), (100.0, 0.0));
        assert!(!none.is_enabled());
        assert!(SlippageModel::from_enabled(true).is_enabled());
    }

    #[test]
    fn buy_pays_more_sell_gets_less() {
        let (buy, r) = T.buy_price(100.0, 100_000.0);
        assert_relative_eq!(buy, 100.05);
        assert_eq!(r, 0.0005);
        let (sell, _) = T.sell_price(100.0, 100_000.0);
        assert_relative_eq!(sell, 99.95);
    }

    #[test]
    fn huge_sell_notional_floors_at_zero() {
        let (sell, ratio) = T.sell_price(100.0, 2.0e10);
        assert!(ratio > 1.0);
        assert_eq!(sell, 0.0);
        let (buy, _) = T.buy_price(100.0, 2.0e10);
        assert!(buy > 100.0);
    }

    proptest! {
        #[test]
        fn ratio_is_monotonic(a in 0.0f64..1e9, b in 0.0f64..1e9) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(T.ratio(lo) <= T.ratio(hi));
        }

        #[test]
        fn ratio_is_nonnegative(a in 0.0f64..1e10) {
            prop_assert!(T.ratio(a) >= 0.0);
        }

        #[test]
        fn sell_price_is_never_negative(price in 0.01f64..1e6, amount in 0.0f64..1e12) {
            prop_assert!(T.sell_price(price, amount).0 >= 0.0);
        }
    }
}
