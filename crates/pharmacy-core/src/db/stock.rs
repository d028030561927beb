//! [`StockStore`] implementation over SQLite.

use tracing::debug;

use super::medications::write_batches;
use super::prescriptions::insert_prescription;
use super::sales::insert_sale;
use super::{Database, DbResult};
use crate::ledger::StockStore;
use crate::models::{Medication, Prescription, Sale};

impl StockStore for Database {
    fn load_medication(&self, id: &str) -> DbResult<Option<Medication>> {
        self.get_medication(id)
    }

    fn load_medications(&self) -> DbResult<Vec<Medication>> {
        self.list_medications()
    }

    fn save_batches(&self, medication: &Medication) -> DbResult<()> {
        write_batches(&self.conn, medication)
    }

    fn save_sale(&self, medications: &[Medication], sale: &Sale) -> DbResult<()> {
        // Rolled back on drop unless committed.
        let tx = self.conn.unchecked_transaction()?;

        for medication in medications {
            write_batches(&tx, medication)?;
        }
        insert_sale(&tx, sale)?;
        if let Some(prescription) = Prescription::dispensed_by(sale) {
            insert_prescription(&tx, &prescription)?;
        }

        tx.commit()?;
        debug!(sale_id = %sale.id, medications = medications.len(), "sale persisted");
        Ok(())
    }
}
