//! Batch ledger: per-medication expiration-ordered stock.
//!
//! Stock enters through [`Ledger::add_batch`] and leaves through
//! [`Ledger::consume`] or [`Ledger::consume_sale`]; nothing else changes
//! batch quantities. Each operation is a read-modify-write of the stored
//! medication performed under that medication's lock, with a single atomic
//! write at the end.

pub mod fifo;
mod locks;
mod store;

pub use fifo::Shortage;
pub use locks::*;
pub use store::*;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::DbError;
use crate::models::{Batch, BatchUsage, Medication, NewBatch, Sale, SaleItem, SaleLine, SaleRequest};

/// Units missing for one medication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub medication_id: String,
    pub requested: u64,
    pub available: u64,
    pub shortfall: u64,
}

/// Ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient stock for {} medication(s)", .0.len())]
    InsufficientStock(Vec<Shortfall>),

    #[error("Medication not found: {0}")]
    NotFound(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] DbError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl Shortfall {
    fn new(medication_id: &str, shortage: Shortage) -> Self {
        Self {
            medication_id: medication_id.to_string(),
            requested: shortage.requested,
            available: shortage.available,
            shortfall: shortage.shortfall(),
        }
    }
}

/// FIFO batch ledger over a [`StockStore`].
pub struct Ledger<S> {
    store: S,
    locks: LockTable,
}

impl<S: StockStore> Ledger<S> {
    /// Create a ledger that owns its store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: LockTable::new(),
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receive stock: add a batch and keep the list ordered by expiration.
    pub fn add_batch(&self, medication_id: &str, new_batch: NewBatch) -> LedgerResult<Batch> {
        if new_batch.quantity == 0 {
            return Err(LedgerError::InvalidInput(
                "batch quantity must be greater than zero".into(),
            ));
        }
        if new_batch.lot.trim().is_empty() {
            return Err(LedgerError::InvalidInput("batch lot label is required".into()));
        }

        self.locks.with_locked([medication_id], || -> LedgerResult<Batch> {
            let mut medication = self.load(medication_id)?;
            let batch = Batch::new(new_batch);

            fifo::insert_batch(&mut medication.batches, batch.clone());
            medication.touch();
            self.store.save_batches(&medication)?;

            info!(
                medication_id,
                batch_id = %batch.id,
                lot = %batch.lot,
                expires_on = %batch.expires_on,
                quantity = batch.quantity,
                "batch received"
            );
            Ok(batch)
        })
    }

    /// Units on hand for a medication.
    pub fn total_available(&self, medication_id: &str) -> LedgerResult<u64> {
        let medication = self.load(medication_id)?;
        Ok(fifo::total_available(&medication.batches))
    }

    /// Draw units from a single medication, earliest expiration first.
    pub fn consume(&self, medication_id: &str, requested: u32) -> LedgerResult<Vec<BatchUsage>> {
        if requested == 0 {
            return Err(LedgerError::InvalidInput(
                "requested quantity must be greater than zero".into(),
            ));
        }

        self.locks.with_locked([medication_id], || -> LedgerResult<Vec<BatchUsage>> {
            let mut medication = self.load(medication_id)?;

            let trace = fifo::consume(&mut medication.batches, requested).map_err(|shortage| {
                warn!(
                    medication_id,
                    requested,
                    shortfall = shortage.shortfall(),
                    "insufficient stock"
                );
                LedgerError::InsufficientStock(vec![Shortfall::new(medication_id, shortage)])
            })?;

            medication.touch();
            self.store.save_batches(&medication)?;

            debug!(medication_id, requested, batches = trace.len(), "stock consumed");
            Ok(trace)
        })
    }

    /// Finalize a checkout: all lines are satisfied and persisted, or none.
    ///
    /// Lines for the same medication are combined before the availability
    /// check. Every shortfall is reported, ordered by medication id.
    pub fn consume_sale(&self, request: &SaleRequest) -> LedgerResult<Sale> {
        let wanted = combine_lines(&request.lines)?;

        self.locks
            .with_locked(wanted.iter().map(|(id, _)| id.as_str()), || -> LedgerResult<Sale> {
                let mut medications = wanted
                    .iter()
                    .map(|(id, _)| self.load(id))
                    .collect::<LedgerResult<Vec<Medication>>>()?;

                let mut shortfalls: Vec<Shortfall> = wanted
                    .iter()
                    .zip(&medications)
                    .filter_map(|((id, quantity), medication)| {
                        let available = fifo::total_available(&medication.batches);
                        let requested = u64::from(*quantity);
                        (requested > available).then(|| {
                            Shortfall::new(id, Shortage { requested, available })
                        })
                    })
                    .collect();

                if !shortfalls.is_empty() {
                    shortfalls.sort_by(|a, b| a.medication_id.cmp(&b.medication_id));
                    for s in &shortfalls {
                        warn!(
                            medication_id = %s.medication_id,
                            requested = s.requested,
                            shortfall = s.shortfall,
                            "sale rejected: insufficient stock"
                        );
                    }
                    return Err(LedgerError::InsufficientStock(shortfalls));
                }

                let mut items = Vec::with_capacity(wanted.len());
                for ((id, quantity), medication) in wanted.iter().zip(medications.iter_mut()) {
                    let batches = fifo::consume(&mut medication.batches, *quantity).map_err(|shortage| {
                        LedgerError::InsufficientStock(vec![Shortfall::new(id, shortage)])
                    })?;
                    medication.touch();

                    items.push(SaleItem {
                        medication_id: id.clone(),
                        medication_name: medication.name.clone(),
                        unit: medication.unit.clone(),
                        quantity: *quantity,
                        batches,
                    });
                }

                let sale = Sale::from_request(request, items)?;
                self.store.save_sale(&medications, &sale)?;

                info!(
                    sale_id = %sale.id,
                    staff_id = %sale.staff_id,
                    items = sale.items.len(),
                    "sale committed"
                );
                Ok(sale)
            })
    }

    /// Run `remove` under the medication's lock. The lock entry is dropped
    /// only when `remove` reports that the row is gone.
    ///
    /// Callers waiting on the old entry then see the medication as missing.
    /// On `Ok(false)` or `Err` the entry stays, so waiters and later callers
    /// keep sharing one lock.
    pub fn retire<E>(
        &self,
        medication_id: &str,
        remove: impl FnOnce() -> Result<bool, E>,
    ) -> Result<bool, E> {
        let result = self.locks.with_locked([medication_id], remove);
        if matches!(result, Ok(true)) {
            self.locks.forget(medication_id);
            debug!(medication_id, "medication retired from ledger");
        }
        result
    }

    fn load(&self, medication_id: &str) -> LedgerResult<Medication> {
        self.store
            .load_medication(medication_id)?
            .ok_or_else(|| LedgerError::NotFound(medication_id.to_string()))
    }
}

/// Validate sale lines and sum quantities per medication, keeping
/// first-appearance order.
pub fn combine_lines(lines: &[SaleLine]) -> LedgerResult<Vec<(String, u32)>> {
    if lines.is_empty() {
        return Err(LedgerError::InvalidInput("sale has no line items".into()));
    }

    let mut combined: Vec<(String, u32)> = Vec::new();
    for line in lines {
        if line.medication_id.trim().is_empty() {
            return Err(LedgerError::InvalidInput("line item has no medication".into()));
        }
        if line.quantity == 0 {
            return Err(LedgerError::InvalidInput(format!(
                "quantity for medication {} must be greater than zero",
                line.medication_id
            )));
        }

        match combined.iter_mut().find(|(id, _)| *id == line.medication_id) {
            Some((_, total)) => {
                *total = total.checked_add(line.quantity).ok_or_else(|| {
                    LedgerError::InvalidInput(format!(
                        "combined quantity for medication {} is too large",
                        line.medication_id
                    ))
                })?;
            }
            None => combined.push((line.medication_id.clone(), line.quantity)),
        }
    }
    Ok(combined)
}
