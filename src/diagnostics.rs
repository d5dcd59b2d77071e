use std::fmt;

use rust_decimal::Decimal;

use crate::donor::DonorId;
use crate::transaction::TransactionId;

/// A non-fatal anomaly observed during ingestion. These are collected on the
/// [`IngestReport`] so callers can inspect or ignore them; the core never
/// writes to the console directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A transaction ID was seen before. The flat transaction index keeps the
    /// incoming row (last write wins); both sides are named for auditing.
    DuplicateTransaction {
        id: TransactionId,
        existing_donor: DonorId,
        existing_amount: Decimal,
        incoming_donor: DonorId,
        incoming_amount: Decimal,
    },
    /// A ledger refused a transaction attributed to a different donor.
    IdentityMismatch {
        id: TransactionId,
        donor: DonorId,
        ledger: DonorId,
    },
    /// A row could not be turned into a transaction at all.
    BadRow { reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateTransaction {
                id,
                existing_donor,
                existing_amount,
                incoming_donor,
                incoming_amount,
            } => write!(
                f,
                "transaction ID `{}` already recorded for donor `{}` (${:.2}); \
                 incoming row for donor `{}` (${:.2}) replaces it in the date index",
                id, existing_donor, existing_amount, incoming_donor, incoming_amount
            ),
            Diagnostic::IdentityMismatch { id, donor, ledger } => write!(
                f,
                "dropped transaction ID `{}`: attributed to donor `{}` but offered to ledger `{}`",
                id, donor, ledger
            ),
            Diagnostic::BadRow { reason } => write!(f, "dropped row: {}", reason),
        }
    }
}

/// Outcome of one or more ingestion passes over the same registry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestReport {
    /// Rows stored into a ledger.
    pub accepted: usize,
    /// Rows dropped (parse failures and ledger rejections).
    pub dropped: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl IngestReport {
    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}
