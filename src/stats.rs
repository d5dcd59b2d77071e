use itertools::Itertools;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Summary statistics over a series of transaction amounts. Amounts are
/// carried as `Decimal` everywhere else; the distribution moments are
/// computed in `f64` since the standard deviation needs a square root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub median: f64,
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

impl Distribution {
    /// Returns `None` for an empty series, where max/min/mean are undefined.
    pub fn from_amounts(amounts: &[Decimal]) -> Option<Distribution> {
        if amounts.is_empty() {
            return None;
        }

        let sorted: Vec<f64> = amounts.iter().sorted().map(|a| to_f64(*a)).collect();
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = sorted.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Distribution {
            max: sorted[n - 1],
            min: sorted[0],
            mean,
            std: variance.sqrt(),
            median,
        })
    }
}

#[cfg(test)]
mod test {
    use rust_decimal_macros::dec;

    use super::Distribution;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn empty_series_has_no_distribution() {
        assert_eq!(None, Distribution::from_amounts(&[]));
    }

    #[test]
    fn single_amount() {
        let dist = Distribution::from_amounts(&[dec!(42.5)]).unwrap();
        assert_eq!(42.5, dist.max);
        assert_eq!(42.5, dist.min);
        assert_eq!(42.5, dist.mean);
        assert_eq!(42.5, dist.median);
        assert_eq!(0.0, dist.std);
    }

    #[test]
    fn moments_over_a_known_series() {
        // 2, 4, 4, 4, 5, 5, 7, 9: the classic population-std example.
        let amounts = [
            dec!(9),
            dec!(2),
            dec!(5),
            dec!(4),
            dec!(4),
            dec!(4),
            dec!(5),
            dec!(7),
        ];
        let dist = Distribution::from_amounts(&amounts).unwrap();
        assert_eq!(9.0, dist.max);
        assert_eq!(2.0, dist.min);
        assert!((dist.mean - 5.0).abs() < TOLERANCE);
        assert!((dist.std - 2.0).abs() < TOLERANCE);
        assert!((dist.median - 4.5).abs() < TOLERANCE);
    }

    #[test]
    fn median_of_odd_length_series() {
        let amounts = [dec!(10), dec!(30), dec!(20)];
        let dist = Distribution::from_amounts(&amounts).unwrap();
        assert_eq!(20.0, dist.median);
    }

    #[test]
    fn negative_amounts_are_kept() {
        let amounts = [dec!(-100), dec!(100)];
        let dist = Distribution::from_amounts(&amounts).unwrap();
        assert_eq!(-100.0, dist.min);
        assert_eq!(0.0, dist.mean);
    }
}
