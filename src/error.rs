use rust_decimal::Decimal;
use thiserror::Error;

use crate::donor::DonorId;
use crate::tier::Tier;
use crate::transaction::TransactionId;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("failed to parse input, reason: `{0}`")]
    ParsingFailure(String),
    #[error("transaction ID `{0}` has neither an actual nor a posted date")]
    MissingDates(TransactionId),
    #[error("transaction ID `{id}` belongs to donor `{donor}`, not to the ledger of donor `{ledger}`")]
    IdentityMismatch {
        id: TransactionId,
        donor: DonorId,
        ledger: DonorId,
    },
    #[error("the registry is sealed, no further ingestion is allowed")]
    RegistrySealed,
    #[error("donor `{0}` has no payments or donations recorded")]
    NoContributionsRecorded(DonorId),
    #[error("tier {0} holds no transactions to compute statistics over")]
    EmptyTier(Tier),
    #[error("the registry holds no transactions")]
    NoTransactions,
    #[error("total contribution of {0} exceeds the upper bound of every tier")]
    UnsupportedTierRange(Decimal),
}
