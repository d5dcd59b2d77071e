use std::cell::Cell;
use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Error;
use crate::tier::Tier;
use crate::transaction::{Address, Category, Name, Transaction, TransactionId};

pub type DonorId = u64;

/// Identity fields carried by every input row, used to create a donor's
/// ledger the first time their ID is seen.
#[derive(Debug, Clone, PartialEq)]
pub struct DonorProfile {
    pub id: DonorId,
    pub name: Name,
    pub email: Option<String>,
    pub address: Address,
    pub membership_expires: Option<NaiveDate>,
}

/// Running per-category totals, updated incrementally on every accepted
/// transaction. Refunds are stored negative, so the grand total is a plain sum.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Contributions {
    payment: Decimal,
    donation: Decimal,
    refund: Decimal,
}

impl Contributions {
    fn apply(&mut self, category: Category, amount: Decimal) {
        match category {
            Category::Payment => self.payment += amount,
            Category::Donation => self.donation += amount,
            Category::Refund => self.refund += amount,
        }
    }

    fn total(&self) -> Decimal {
        self.payment + self.donation + self.refund
    }
}

/// One donor's ledger: identity, the transactions attributed to them keyed
/// by transaction ID, running category totals, and a memoized tier.
#[derive(Debug, PartialEq)]
pub struct Donor {
    id: DonorId,
    name: Name,
    email: Option<String>,
    address: Address,
    membership_expires: Option<NaiveDate>,
    transactions: HashMap<TransactionId, Transaction>,
    // Insertion order of transaction IDs, so first-max-wins scans are
    // deterministic. Overwrites keep the original position.
    order: Vec<TransactionId>,
    contributions: Contributions,
    tier: Cell<Option<Tier>>,
}

impl Donor {
    pub fn new(profile: DonorProfile) -> Self {
        Donor {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            address: profile.address,
            membership_expires: profile.membership_expires,
            transactions: HashMap::new(),
            order: Vec::new(),
            contributions: Contributions::default(),
            tier: Cell::new(None),
        }
    }

    pub fn id(&self) -> DonorId {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn membership_expires(&self) -> Option<NaiveDate> {
        self.membership_expires
    }

    /// Adds a transaction to this ledger. A transaction belonging to another
    /// donor is rejected without mutating anything. Re-adding an existing
    /// transaction ID reverses the old amount from its category total before
    /// applying the new one, so re-ingesting the same source is idempotent.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), Error> {
        if tx.donor_id != self.id {
            return Err(Error::IdentityMismatch {
                id: tx.id,
                donor: tx.donor_id,
                ledger: self.id,
            });
        }

        let id = tx.id;
        self.contributions.apply(tx.category, tx.amount);
        if let Some(old) = self.transactions.insert(id, tx) {
            self.contributions.apply(old.category, -old.amount);
        } else {
            self.order.push(id);
        }
        self.tier.set(None);
        Ok(())
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.order.iter().map(move |id| &self.transactions[id])
    }

    pub fn num_payments(&self) -> usize {
        self.transactions.len()
    }

    /// Sum of the three category running totals. O(1).
    pub fn total_contributions(&self) -> Decimal {
        self.contributions.total()
    }

    /// Memoized tier classification, recomputed only after a mutation.
    pub fn tier(&self) -> Result<Tier, Error> {
        if let Some(tier) = self.tier.get() {
            return Ok(tier);
        }
        let tier = Tier::classify(self.total_contributions())?;
        self.tier.set(Some(tier));
        Ok(tier)
    }

    /// The largest transaction of the given category, or `None` if the donor
    /// has none of that category. First-encountered maximum wins ties.
    fn largest_of(&self, category: Category) -> Option<&Transaction> {
        let mut largest: Option<&Transaction> = None;
        for tx in self.transactions().filter(|tx| tx.category == category) {
            match largest {
                Some(best) if tx.amount <= best.amount => {}
                _ => largest = Some(tx),
            }
        }
        largest
    }

    pub fn largest_payment(&self) -> Option<&Transaction> {
        self.largest_of(Category::Payment)
    }

    pub fn largest_donation(&self) -> Option<&Transaction> {
        self.largest_of(Category::Donation)
    }

    /// The larger of the donor's largest payment and largest donation.
    pub fn largest_contribution(&self) -> Result<Decimal, Error> {
        let payment = self.largest_payment().map(|tx| tx.amount);
        let donation = self.largest_donation().map(|tx| tx.amount);
        match (payment, donation) {
            (Some(p), Some(d)) => Ok(p.max(d)),
            (Some(p), None) => Ok(p),
            (None, Some(d)) => Ok(d),
            (None, None) => Err(Error::NoContributionsRecorded(self.id)),
        }
    }
}
