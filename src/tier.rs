use std::fmt;

use rust_decimal::Decimal;

use crate::error::Error;
use crate::stats::Distribution;

/// Contribution tiers as fixed, half-open dollar ranges over a donor's
/// lifetime total. Classification uses the absolute value of the total,
/// so a net-refunded donor still lands in a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
}

/// Lower-inclusive, upper-exclusive bounds of a tier, in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierRange {
    pub lower: i64,
    pub upper: i64,
}

impl Tier {
    pub const ALL: [Tier; 11] = [
        Tier::Zero,
        Tier::One,
        Tier::Two,
        Tier::Three,
        Tier::Four,
        Tier::Five,
        Tier::Six,
        Tier::Seven,
        Tier::Eight,
        Tier::Nine,
        Tier::Ten,
    ];

    pub fn range(&self) -> TierRange {
        let (lower, upper) = match self {
            Tier::Zero => (0, 500),
            Tier::One => (500, 1_000),
            Tier::Two => (1_000, 2_500),
            Tier::Three => (2_500, 5_000),
            Tier::Four => (5_000, 7_500),
            Tier::Five => (7_500, 10_000),
            Tier::Six => (10_000, 25_000),
            Tier::Seven => (25_000, 50_000),
            Tier::Eight => (50_000, 75_000),
            Tier::Nine => (75_000, 100_000),
            Tier::Ten => (100_000, 250_000),
        };
        TierRange { lower, upper }
    }

    /// Returns the first tier (in ascending order) whose upper bound strictly
    /// exceeds the absolute value of `total`. Totals at or beyond the top
    /// tier's upper bound have no tier and are a defined error.
    pub fn classify(total: Decimal) -> Result<Tier, Error> {
        let value = total.abs();
        for tier in Tier::ALL {
            if value < Decimal::from(tier.range().upper) {
                return Ok(tier);
            }
        }
        Err(Error::UnsupportedTierRange(total))
    }
}

fn currency(value: i64) -> String {
    if value < 1_000 {
        format!("${}", value)
    } else if value % 1_000 == 0 {
        format!("${}k", value / 1_000)
    } else {
        format!("${:.1}k", value as f64 / 1e3)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.range();
        write!(f, "{} - {}", currency(range.lower), currency(range.upper))
    }
}

/// Read-only aggregate snapshot of one tier: who is in it, how many
/// transactions they made, and how those amounts are distributed.
#[derive(Debug, Clone, PartialEq)]
pub struct TierStats {
    pub tier: Tier,
    /// Number of donors classified into this tier.
    pub donors: usize,
    /// Number of transactions across all donors in this tier.
    pub payments: usize,
    /// Sum of all transaction amounts in this tier.
    pub total: Decimal,
    /// The raw amount series, for an external histogram sink.
    pub amounts: Vec<Decimal>,
    pub distribution: Distribution,
}

impl fmt::Display for TierStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: donors: {}, payments: {}, total: ${:.2}, \
             max: ${:.2}, min: ${:.2}, mean: ${:.2}, std: ${:.2}, median: ${:.2}",
            self.tier,
            self.donors,
            self.payments,
            self.total,
            self.distribution.max,
            self.distribution.min,
            self.distribution.mean,
            self.distribution.std,
            self.distribution.median,
        )
    }
}
