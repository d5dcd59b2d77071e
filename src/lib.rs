//! An in-memory donor registry: ingests flat donation/payment records,
//! groups them into per-donor ledgers, and serves ranked, tiered and
//! date-ordered views of the data.

pub mod diagnostics;
pub mod donor;
pub mod error;
pub mod parser;
pub mod registry;
pub mod stats;
pub mod tier;
pub mod transaction;

pub use diagnostics::{Diagnostic, IngestReport};
pub use donor::{Donor, DonorId, DonorProfile};
pub use error::Error;
pub use registry::Registry;
pub use stats::Distribution;
pub use tier::{Tier, TierStats};
pub use transaction::{Category, Transaction, TransactionId};
