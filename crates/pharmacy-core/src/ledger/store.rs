//! Persistence seam the ledger depends on.

use std::sync::{Arc, Mutex};

use crate::db::{DbError, DbResult};
use crate::models::{Medication, Sale};

/// Storage for medications' stock and committed sales.
///
/// Every write is a single atomic replace: either all of it lands or none.
pub trait StockStore {
    /// Fetch a medication with its batches.
    fn load_medication(&self, id: &str) -> DbResult<Option<Medication>>;

    /// All medications with their batches.
    fn load_medications(&self) -> DbResult<Vec<Medication>>;

    /// Replace one medication's batch list.
    fn save_batches(&self, medication: &Medication) -> DbResult<()>;

    /// Replace the batch lists of every touched medication and append the sale.
    fn save_sale(&self, medications: &[Medication], sale: &Sale) -> DbResult<()>;
}

impl<S: StockStore + ?Sized> StockStore for Arc<S> {
    fn load_medication(&self, id: &str) -> DbResult<Option<Medication>> {
        (**self).load_medication(id)
    }

    fn load_medications(&self) -> DbResult<Vec<Medication>> {
        (**self).load_medications()
    }

    fn save_batches(&self, medication: &Medication) -> DbResult<()> {
        (**self).save_batches(medication)
    }

    fn save_sale(&self, medications: &[Medication], sale: &Sale) -> DbResult<()> {
        (**self).save_sale(medications, sale)
    }
}

impl<S: StockStore> StockStore for Mutex<S> {
    fn load_medication(&self, id: &str) -> DbResult<Option<Medication>> {
        self.lock().map_err(poisoned)?.load_medication(id)
    }

    fn load_medications(&self) -> DbResult<Vec<Medication>> {
        self.lock().map_err(poisoned)?.load_medications()
    }

    fn save_batches(&self, medication: &Medication) -> DbResult<()> {
        self.lock().map_err(poisoned)?.save_batches(medication)
    }

    fn save_sale(&self, medications: &[Medication], sale: &Sale) -> DbResult<()> {
        self.lock().map_err(poisoned)?.save_sale(medications, sale)
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> DbError {
    DbError::LockPoisoned(e.to_string())
}
