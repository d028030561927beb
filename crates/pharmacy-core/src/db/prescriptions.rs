//! Prescription database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Prescription, PrescriptionStatus};

const PRESCRIPTION_COLUMNS: &str = "id, doctor_id, clinic_id, patient_name, items, notes, \
                                    file_name, file_url, status, sale_id, created_at, updated_at";

impl Database {
    /// Insert a new prescription.
    pub fn insert_prescription(&self, prescription: &Prescription) -> DbResult<()> {
        insert_prescription(&self.conn, prescription)
    }

    /// Update an existing prescription.
    pub fn update_prescription(&self, prescription: &Prescription) -> DbResult<bool> {
        let items_json = serde_json::to_string(&prescription.items)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE prescriptions SET
                doctor_id = ?2,
                clinic_id = ?3,
                patient_name = ?4,
                items = ?5,
                notes = ?6,
                file_name = ?7,
                file_url = ?8,
                status = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                prescription.id,
                prescription.doctor_id,
                prescription.clinic_id,
                prescription.patient_name,
                items_json,
                prescription.notes,
                prescription.file_name,
                prescription.file_url,
                prescription.status.as_str(),
                prescription.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a prescription by ID.
    pub fn get_prescription(&self, id: &str) -> DbResult<Option<Prescription>> {
        let sql = format!("SELECT {} FROM prescriptions WHERE id = ?", PRESCRIPTION_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], PrescriptionRow::from_row)
            .optional()?;

        row.map(|r| r.try_into()).transpose()
    }

    /// List all prescriptions, newest first.
    pub fn list_prescriptions(&self) -> DbResult<Vec<Prescription>> {
        let sql = format!(
            "SELECT {} FROM prescriptions ORDER BY created_at DESC, rowid DESC",
            PRESCRIPTION_COLUMNS
        );
        self.query_prescriptions(&sql, [])
    }

    /// Prescriptions dispensed by a sale.
    pub fn list_prescriptions_for_sale(&self, sale_id: &str) -> DbResult<Vec<Prescription>> {
        let sql = format!(
            "SELECT {} FROM prescriptions WHERE sale_id = ? ORDER BY created_at",
            PRESCRIPTION_COLUMNS
        );
        self.query_prescriptions(&sql, [sale_id])
    }

    fn query_prescriptions<P: rusqlite::Params>(&self, sql: &str, params: P) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, PrescriptionRow::from_row)?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }
}

/// Insert a prescription row (also used inside the sale transaction).
pub(super) fn insert_prescription(conn: &Connection, prescription: &Prescription) -> DbResult<()> {
    let items_json = serde_json::to_string(&prescription.items)?;

    conn.execute(
        r#"
        INSERT INTO prescriptions (
            id, doctor_id, clinic_id, patient_name, items, notes,
            file_name, file_url, status, sale_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            prescription.id,
            prescription.doctor_id,
            prescription.clinic_id,
            prescription.patient_name,
            items_json,
            prescription.notes,
            prescription.file_name,
            prescription.file_url,
            prescription.status.as_str(),
            prescription.sale_id,
            prescription.created_at,
            prescription.updated_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct PrescriptionRow {
    id: String,
    doctor_id: Option<String>,
    clinic_id: Option<String>,
    patient_name: String,
    items: String,
    notes: String,
    file_name: String,
    file_url: String,
    status: String,
    sale_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PrescriptionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            doctor_id: row.get(1)?,
            clinic_id: row.get(2)?,
            patient_name: row.get(3)?,
            items: row.get(4)?,
            notes: row.get(5)?,
            file_name: row.get(6)?,
            file_url: row.get(7)?,
            status: row.get(8)?,
            sale_id: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let status = PrescriptionStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("unknown prescription status: {}", row.status)))?;

        Ok(Prescription {
            id: row.id,
            doctor_id: row.doctor_id,
            clinic_id: row.clinic_id,
            patient_name: row.patient_name,
            items: serde_json::from_str(&row.items)?,
            notes: row.notes,
            file_name: row.file_name,
            file_url: row.file_url,
            status,
            sale_id: row.sale_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let mut rx = Prescription::new("Maria".into());
        rx.items = vec!["Amoxicillin 500mg - 1 box".into()];
        rx.doctor_id = Some("doc-1".into());
        db.insert_prescription(&rx).unwrap();

        let retrieved = db.get_prescription(&rx.id).unwrap().unwrap();
        assert_eq!(retrieved, rx);
        assert_eq!(retrieved.status, PrescriptionStatus::Pending);
    }

    #[test]
    fn test_update_status() {
        let db = Database::open_in_memory().unwrap();
        let mut rx = Prescription::new("Maria".into());
        db.insert_prescription(&rx).unwrap();

        rx.status = PrescriptionStatus::Cancelled;
        rx.notes = "duplicate".into();
        rx.touch();
        assert!(db.update_prescription(&rx).unwrap());

        let retrieved = db.get_prescription(&rx.id).unwrap().unwrap();
        assert_eq!(retrieved.status, PrescriptionStatus::Cancelled);
        assert_eq!(retrieved.notes, "duplicate");
    }

    #[test]
    fn test_update_missing() {
        let db = Database::open_in_memory().unwrap();
        let rx = Prescription::new("Maria".into());
        assert!(!db.update_prescription(&rx).unwrap());
    }

    #[test]
    fn test_list_prescriptions() {
        let db = Database::open_in_memory().unwrap();
        for name in ["Maria", "João", "Ana"] {
            db.insert_prescription(&Prescription::new(name.into())).unwrap();
        }
        assert_eq!(db.list_prescriptions().unwrap().len(), 3);
        assert!(db.list_prescriptions_for_sale("none").unwrap().is_empty());
    }
}
