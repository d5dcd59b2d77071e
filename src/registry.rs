use std::cell::OnceCell;
use std::collections::{hash_map::Entry, BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::diagnostics::{Diagnostic, IngestReport};
use crate::donor::{Donor, DonorId};
use crate::error::Error;
use crate::parser::ParsedRow;
use crate::stats::Distribution;
use crate::tier::{Tier, TierStats};
use crate::transaction::{Transaction, TransactionId};

/// The full set of donor ledgers plus a flat transaction index, built once
/// from one or more row sources and read-only afterwards.
///
/// All derived views (totals, rankings, tier groupings, date ordering) are
/// computed on first use and cached for the life of the registry. `seal()`
/// marks the end of the ingestion phase; the caches are invalidated on every
/// ingestion pass, so a view requested mid-load is never stale.
#[derive(Debug, Default)]
pub struct Registry {
    donors: HashMap<DonorId, Donor>,
    // Donor IDs in first-seen order; ranking tie-breaks follow it.
    donor_order: Vec<DonorId>,
    transactions: HashMap<TransactionId, Transaction>,
    // Transaction IDs in first-seen order, for deterministic date sorting.
    tx_order: Vec<TransactionId>,
    sealed: bool,

    total: OnceCell<Decimal>,
    top: OnceCell<Option<DonorId>>,
    ranked: OnceCell<Vec<DonorId>>,
    by_tier: OnceCell<BTreeMap<Tier, Vec<DonorId>>>,
    tier_stats: OnceCell<BTreeMap<Tier, TierStats>>,
    by_date: OnceCell<Vec<TransactionId>>,
}

/// One row of the ranked CSV emitted by [`Registry::serialize`].
#[derive(Debug, Serialize)]
struct DonorSummary<'a> {
    donor: DonorId,
    name: &'a str,
    email: &'a str,
    payments: usize,
    total: Decimal,
    tier: String,
}

impl Registry {
    /// Ingests a stream of parsed rows. Per-row failures are dropped with a
    /// diagnostic on `report` and the load continues; the only fatal error is
    /// ingesting into a sealed registry.
    pub fn ingest<I>(&mut self, rows: I, report: &mut IngestReport) -> Result<(), Error>
    where
        I: IntoIterator<Item = Result<ParsedRow, Error>>,
    {
        if self.sealed {
            return Err(Error::RegistrySealed);
        }
        self.invalidate();

        for row in rows {
            let ParsedRow {
                profile,
                transaction: tx,
            } = match row {
                Ok(row) => row,
                Err(err) => {
                    report.dropped += 1;
                    report.record(Diagnostic::BadRow {
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let donor_id = profile.id;
            let donor = match self.donors.entry(donor_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    self.donor_order.push(donor_id);
                    entry.insert(Donor::new(profile))
                }
            };

            // Only warn about a duplicate ID once the ledger accepts the row;
            // a rejected row never reaches the flat index.
            let duplicate = self.transactions.get(&tx.id).map(|existing| {
                Diagnostic::DuplicateTransaction {
                    id: tx.id,
                    existing_donor: existing.donor_id,
                    existing_amount: existing.amount,
                    incoming_donor: tx.donor_id,
                    incoming_amount: tx.amount,
                }
            });

            let id = tx.id;
            if let Err(err) = donor.add_transaction(tx.clone()) {
                report.dropped += 1;
                match err {
                    Error::IdentityMismatch { id, donor, ledger } => {
                        report.record(Diagnostic::IdentityMismatch { id, donor, ledger })
                    }
                    other => report.record(Diagnostic::BadRow {
                        reason: other.to_string(),
                    }),
                }
                continue;
            }

            if let Some(diagnostic) = duplicate {
                report.record(diagnostic);
            }
            // Last write wins in the date-indexed view.
            if self.transactions.insert(id, tx).is_none() {
                self.tx_order.push(id);
            }
            report.accepted += 1;
        }
        Ok(())
    }

    /// Ends the ingestion phase. Further `ingest` calls are rejected.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn num_donors(&self) -> usize {
        self.donors.len()
    }

    pub fn num_transactions(&self) -> usize {
        self.transactions.len()
    }

    pub fn donor(&self, id: DonorId) -> Option<&Donor> {
        self.donors.get(&id)
    }

    /// Donors in first-seen order.
    pub fn donors(&self) -> impl Iterator<Item = &Donor> {
        self.donor_order.iter().map(move |id| &self.donors[id])
    }

    /// Sum of every donor's total contributions. Zero for an empty registry.
    pub fn total_contributions(&self) -> Decimal {
        *self.total.get_or_init(|| {
            self.donors()
                .map(|donor| donor.total_contributions())
                .sum()
        })
    }

    /// The donor with the highest positive total. Ties go to the donor seen
    /// first; a registry with no net-positive donor has no top donor.
    pub fn top_donor(&self) -> Option<&Donor> {
        self.top
            .get_or_init(|| {
                let mut max = Decimal::ZERO;
                let mut top = None;
                for donor in self.donors() {
                    if donor.total_contributions() > max {
                        max = donor.total_contributions();
                        top = Some(donor.id());
                    }
                }
                top
            })
            .map(|id| &self.donors[&id])
    }

    fn ranked_ids(&self) -> &[DonorId] {
        self.ranked.get_or_init(|| {
            let mut ids = self.donor_order.clone();
            // Stable sort: equal totals keep first-seen order.
            ids.sort_by(|a, b| {
                self.donors[b]
                    .total_contributions()
                    .cmp(&self.donors[a].total_contributions())
            });
            ids
        })
    }

    /// Donors ordered by total contributions, descending.
    pub fn ranked_by_contribution(&self) -> impl Iterator<Item = &Donor> {
        self.ranked_ids().iter().map(move |id| &self.donors[id])
    }

    /// The `n` largest donors (fewer if the registry is smaller).
    pub fn top_donors(&self, n: usize) -> Vec<&Donor> {
        self.ranked_by_contribution().take(n).collect()
    }

    /// Donors grouped by tier, rank order preserved within each group.
    pub fn donors_by_tier(&self) -> Result<&BTreeMap<Tier, Vec<DonorId>>, Error> {
        if let Some(grouped) = self.by_tier.get() {
            return Ok(grouped);
        }
        let mut grouped: BTreeMap<Tier, Vec<DonorId>> = BTreeMap::new();
        for id in self.ranked_ids() {
            grouped
                .entry(self.donors[id].tier()?)
                .or_insert_with(Vec::new)
                .push(*id);
        }
        Ok(self.by_tier.get_or_init(|| grouped))
    }

    /// Donors at one tier, in rank order. Empty if nobody is at that tier.
    pub fn donors_in_tier(&self, tier: Tier) -> Result<Vec<&Donor>, Error> {
        let grouped = self.donors_by_tier()?;
        Ok(grouped
            .get(&tier)
            .map(|ids| ids.iter().map(|id| &self.donors[id]).collect())
            .unwrap_or_default())
    }

    /// Per-tier summary statistics over all transaction amounts at each tier.
    pub fn tier_stats(&self) -> Result<&BTreeMap<Tier, TierStats>, Error> {
        if let Some(stats) = self.tier_stats.get() {
            return Ok(stats);
        }
        let mut stats = BTreeMap::new();
        for (tier, ids) in self.donors_by_tier()? {
            let mut payments = 0;
            let mut total = Decimal::ZERO;
            let mut amounts = Vec::new();
            for id in ids {
                let donor = &self.donors[id];
                payments += donor.num_payments();
                total += donor.total_contributions();
                amounts.extend(donor.transactions().map(|tx| tx.amount));
            }
            let distribution =
                Distribution::from_amounts(&amounts).ok_or(Error::EmptyTier(*tier))?;
            stats.insert(
                *tier,
                TierStats {
                    tier: *tier,
                    donors: ids.len(),
                    payments,
                    total,
                    amounts,
                    distribution,
                },
            );
        }
        Ok(self.tier_stats.get_or_init(|| stats))
    }

    fn ids_by_date(&self) -> &[TransactionId] {
        self.by_date.get_or_init(|| {
            let mut ids = self.tx_order.clone();
            // Stable: date ties keep first-seen order.
            ids.sort_by_key(|id| self.transactions[id].posted_date);
            ids
        })
    }

    /// All transactions ascending by posted date.
    pub fn transactions_by_date(&self) -> impl Iterator<Item = &Transaction> {
        self.ids_by_date().iter().map(move |id| &self.transactions[id])
    }

    pub fn earliest_payment(&self) -> Result<NaiveDate, Error> {
        self.ids_by_date()
            .first()
            .map(|id| self.transactions[id].posted_date)
            .ok_or(Error::NoTransactions)
    }

    pub fn latest_payment(&self) -> Result<NaiveDate, Error> {
        self.ids_by_date()
            .last()
            .map(|id| self.transactions[id].posted_date)
            .ok_or(Error::NoTransactions)
    }

    pub fn timespan(&self) -> Result<Duration, Error> {
        Ok(self
            .latest_payment()?
            .signed_duration_since(self.earliest_payment()?))
    }

    /// The raw amount series across the whole registry, for an external
    /// histogram sink. First-seen order.
    pub fn amounts(&self) -> Vec<Decimal> {
        self.tx_order
            .iter()
            .map(|id| self.transactions[id].amount)
            .collect()
    }

    /// Posted dates across the whole registry, for an external histogram sink.
    pub fn posted_dates(&self) -> Vec<NaiveDate> {
        self.tx_order
            .iter()
            .map(|id| self.transactions[id].posted_date)
            .collect()
    }

    /// Distribution statistics over every transaction amount, optionally
    /// leaving refunds out.
    pub fn amount_distribution(&self, include_refunds: bool) -> Result<Distribution, Error> {
        let amounts: Vec<Decimal> = self
            .amounts()
            .into_iter()
            .filter(|amount| include_refunds || *amount >= Decimal::ZERO)
            .collect();
        Distribution::from_amounts(&amounts).ok_or(Error::NoTransactions)
    }

    /// Serialize the ranked donor table to CSV.
    pub fn serialize(&self, output: impl std::io::Write) -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = csv::Writer::from_writer(output);
        for donor in self.ranked_by_contribution() {
            writer.serialize(DonorSummary {
                donor: donor.id(),
                name: &donor.name().full,
                email: donor.email().unwrap_or(""),
                payments: donor.num_payments(),
                total: donor.total_contributions(),
                tier: donor.tier()?.to_string(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    fn invalidate(&mut self) {
        self.total = OnceCell::new();
        self.top = OnceCell::new();
        self.ranked = OnceCell::new();
        self.by_tier = OnceCell::new();
        self.tier_stats = OnceCell::new();
        self.by_date = OnceCell::new();
    }
}
