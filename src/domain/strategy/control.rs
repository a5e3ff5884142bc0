//! Control strategies used as baselines for the rule-based ones.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{Signal, Strategy};

const BUY_BELOW: f64 = 0.1;
const SELL_BELOW: f64 = 0.2;

/// Draws one uniform sample per call: below 0.1 buys, below 0.2 sells.
///
/// The generator is injected so runs are reproducible from a seed.
#[derive(Debug, Clone)]
pub struct RandomMonkey {
    rng: StdRng,
}

impl RandomMonkey {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        RandomMonkey { rng }
    }
}

impl Strategy for RandomMonkey {
    fn name(&self) -> &str {
        "Random Monkey"
    }

    fn signal(&mut self, _prefix: &[Bar]) -> Signal {
        let draw: f64 = self.rng.gen_range(0.0..1.0);
        if draw < BUY_BELOW {
            Signal::Buy
        } else if draw < SELL_BELOW {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// Buys whenever flat and never sells on its own.
#[derive(Debug, Clone, Default)]
pub struct AlwaysBuy;

impl Strategy for AlwaysBuy {
    fn name(&self) -> &str {
        "Always Buy"
    }

    fn signal(&mut self, _prefix: &[Bar]) -> Signal {
        Signal::Buy
    }
}
