use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::Error;

pub type TransactionId = u64;

/// The three contribution categories carried by the `type` column of the
/// input data. Refunds are expected to carry a negative amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Category {
    Payment,
    Donation,
    Refund,
}

/// A donor's name with whitespace-normalized parts. The full name collapses
/// interior runs of spaces that show up in hand-entered source data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub first: String,
    pub last: String,
    pub full: String,
}

impl Name {
    pub fn new(first: &str, last: &str, full: Option<&str>) -> Self {
        let full = match full {
            Some(full) => full.split_whitespace().collect::<Vec<_>>().join(" "),
            None => format!("{} {}", first.trim(), last.trim()),
        };
        Name {
            first: first.trim().to_string(),
            last: last.trim().to_string(),
            full,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal: Option<String>,
}

/// One parsed donation/payment/refund row. Immutable once built; the name
/// and address are a denormalized snapshot of the donor at ingestion time.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub donor_id: crate::donor::DonorId,
    pub category: Category,
    pub actual_date: NaiveDate,
    pub posted_date: NaiveDate,
    pub amount: Decimal,
    pub method: String,
    pub response_meta: String,
    pub gl_code: i64,
    pub name: Name,
    pub email: Option<String>,
    pub address: Address,
}

/// Resolves the actual/posted date pair: a missing date defaults to the
/// other one, and a row with neither is rejected.
pub fn resolve_dates(
    id: TransactionId,
    actual: Option<NaiveDate>,
    posted: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), Error> {
    match (actual, posted) {
        (Some(actual), Some(posted)) => Ok((actual, posted)),
        (Some(actual), None) => Ok((actual, actual)),
        (None, Some(posted)) => Ok((posted, posted)),
        (None, None) => Err(Error::MissingDates(id)),
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::{resolve_dates, Name};
    use crate::error::Error;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn both_dates_present() {
        assert_eq!(
            Ok((date("2023-01-02"), date("2023-01-05"))),
            resolve_dates(1, Some(date("2023-01-02")), Some(date("2023-01-05")))
        );
    }

    #[test]
    fn missing_posted_date_defaults_to_actual() {
        assert_eq!(
            Ok((date("2023-01-02"), date("2023-01-02"))),
            resolve_dates(1, Some(date("2023-01-02")), None)
        );
    }

    #[test]
    fn missing_actual_date_defaults_to_posted() {
        assert_eq!(
            Ok((date("2023-01-05"), date("2023-01-05"))),
            resolve_dates(1, None, Some(date("2023-01-05")))
        );
    }

    #[test]
    fn both_dates_missing_is_rejected() {
        assert_eq!(Err(Error::MissingDates(7)), resolve_dates(7, None, None));
    }

    #[test]
    fn name_normalizes_whitespace() {
        let name = Name::new("  Ada ", " Lovelace ", Some("Ada   Byron  Lovelace"));
        assert_eq!("Ada", name.first);
        assert_eq!("Lovelace", name.last);
        assert_eq!("Ada Byron Lovelace", name.full);
    }

    #[test]
    fn full_name_built_from_parts_when_absent() {
        let name = Name::new(" Grace ", "Hopper", None);
        assert_eq!("Grace Hopper", name.full);
    }
}
