//! Daily price generation.
//!
//! A generated price is drawn uniformly from one half of an item's volatility
//! band: `[base, base * (1 + vol)]` when the market is up (`HIGH`) and
//! `[base * (1 - vol), base]` when it is down (`LOW`).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use tradepost_core::ValueObject;

use crate::item::Item;

/// Resolution of the uniform draw inside the band.
const FRACTION_STEPS: u32 = 1_000_000;

/// Smallest currency unit.
const ONE_CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Which half of the volatility band a price was drawn from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceDirection {
    High,
    Low,
}

/// Output of the price generator for one item and one day.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPrice {
    /// Price rounded to the smallest currency unit.
    pub price: Decimal,
    /// Change from the base price, in percent, rounded to 2 dp.
    pub percentage: Decimal,
    pub direction: PriceDirection,
}

impl ValueObject for GeneratedPrice {}

impl GeneratedPrice {
    /// A price fixed by the caller rather than drawn; the percentage is
    /// derived from the item's base price.
    pub fn fixed(item: &Item, price: Decimal, direction: PriceDirection) -> Self {
        Self {
            price,
            percentage: percentage_change(price, item.base_price()),
            direction,
        }
    }
}

/// `round((price - base) / base * 100, 2)`.
///
/// `base` must be positive; catalog items guarantee it.
pub fn percentage_change(price: Decimal, base: Decimal) -> Decimal {
    ((price - base) / base * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Price generator over an injected random source.
#[derive(Debug, Clone)]
pub struct PriceGenerator<R = StdRng> {
    rng: R,
}

impl PriceGenerator<StdRng> {
    /// Deterministic generator for reproducible markets.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> PriceGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw today's price for `item`.
    ///
    /// Consumes exactly one boolean (direction) and one uniform value
    /// (position in the band) from the random source.
    pub fn generate(&mut self, item: &Item) -> GeneratedPrice {
        let direction = if self.rng.gen_bool(0.5) {
            PriceDirection::High
        } else {
            PriceDirection::Low
        };

        let base = item.base_price();
        let vol = item.volatility();
        let (min, max) = match direction {
            PriceDirection::High => (
                base,
                base.checked_mul(Decimal::ONE + vol).unwrap_or(Decimal::MAX),
            ),
            PriceDirection::Low => (base * (Decimal::ONE - vol), base),
        };

        let steps = self.rng.gen_range(0..=FRACTION_STEPS);
        let fraction = Decimal::from(steps) / Decimal::from(FRACTION_STEPS);
        let raw = min + (max - min) * fraction;
        let price = clamp_to_band(raw.round_dp(2), min, max);

        GeneratedPrice {
            price,
            percentage: percentage_change(price, base),
            direction,
        }
    }
}

/// Keep a rounded price on a cent inside `[min, max]` and never below one cent.
///
/// Base prices are whole cents, so the cent-aligned interior is never empty.
fn clamp_to_band(price: Decimal, min: Decimal, max: Decimal) -> Decimal {
    let floor = min
        .round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity)
        .max(ONE_CENT);
    let ceiling = max.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity);
    price.max(floor).min(ceiling)
}
