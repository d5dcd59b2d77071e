use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::donor::{DonorId, DonorProfile};
use crate::error::Error;
use crate::transaction::{resolve_dates, Address, Category, Name, Transaction, TransactionId};

/// One flat input row as exported by the payment processor. All optional
/// columns arrive as empty strings and deserialize to `None`.
#[derive(Debug, Deserialize)]
struct RawRow {
    user_id: DonorId,
    firstname: String,
    lastname: String,
    full_name: Option<String>,
    email: Option<String>,
    street_1: Option<String>,
    street_2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal: Option<String>,
    membership_expiration_date: Option<String>,
    transaction_id: TransactionId,
    #[serde(rename = "type")]
    category: Category,
    actual_date: Option<String>,
    posted_date: Option<String>,
    payment_type: String,
    response_meta: Option<String>,
    amount: Decimal,
    gl_code: i64,
}

/// A fully parsed row: the donor identity fields alongside the transaction
/// built from them. The registry resolves or creates the ledger from the
/// profile and offers it the transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub profile: DonorProfile,
    pub transaction: Transaction,
}

pub fn parse<R>(rdr: csv::Reader<R>) -> impl Iterator<Item = Result<ParsedRow, Error>>
where
    R: std::io::Read,
{
    rdr.into_deserialize::<RawRow>().map(|row| {
        let row = row.map_err(|e| Error::ParsingFailure(e.to_string()))?;
        build(row)
    })
}

fn build(row: RawRow) -> Result<ParsedRow, Error> {
    let actual = parse_date(row.actual_date.as_deref())?;
    let posted = parse_date(row.posted_date.as_deref())?;
    let (actual_date, posted_date) = resolve_dates(row.transaction_id, actual, posted)?;

    let name = Name::new(&row.firstname, &row.lastname, row.full_name.as_deref());
    let email = trimmed(row.email);
    let address = Address {
        street1: trimmed(row.street_1),
        street2: trimmed(row.street_2),
        city: trimmed(row.city),
        state: trimmed(row.state),
        postal: trimmed(row.postal),
    };

    let profile = DonorProfile {
        id: row.user_id,
        name: name.clone(),
        email: email.clone(),
        address: address.clone(),
        membership_expires: parse_date(row.membership_expiration_date.as_deref())?,
    };
    let transaction = Transaction {
        id: row.transaction_id,
        donor_id: row.user_id,
        category: row.category,
        actual_date,
        posted_date,
        amount: row.amount,
        method: row.payment_type,
        response_meta: row.response_meta.unwrap_or_default(),
        gl_code: row.gl_code,
        name,
        email,
        address,
    };
    Ok(ParsedRow {
        profile,
        transaction,
    })
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, Error> {
    match value.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| Error::ParsingFailure(format!("bad date `{}`: {}", s, e))),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
