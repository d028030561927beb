//! Medication catalog database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Medication, MedicationDetails};

const MEDICATION_COLUMNS: &str = "id, name, category, unit, manufacturer, composition, \
                                  available, batches, created_at, updated_at";

impl Database {
    /// Insert a new medication (with whatever batches it carries).
    pub fn insert_medication(&self, medication: &Medication) -> DbResult<()> {
        let batches_json = serde_json::to_string(&medication.batches)?;

        self.conn.execute(
            r#"
            INSERT INTO medications (
                id, name, category, unit, manufacturer, composition,
                available, batches, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                medication.id,
                medication.name,
                medication.category,
                medication.unit,
                medication.manufacturer,
                medication.composition,
                medication.available,
                batches_json,
                medication.created_at,
                medication.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update catalog fields. Batches are left untouched.
    pub fn update_medication_details(&self, id: &str, details: &MedicationDetails) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE medications SET
                name = ?2,
                category = ?3,
                unit = ?4,
                manufacturer = ?5,
                composition = ?6,
                available = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
            params![
                id,
                details.name,
                details.category,
                details.unit,
                details.manufacturer,
                details.composition,
                details.available,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: &str) -> DbResult<Option<Medication>> {
        let sql = format!("SELECT {} FROM medications WHERE id = ?", MEDICATION_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], MedicationRow::from_row)
            .optional()?;

        row.map(|r| r.try_into()).transpose()
    }

    /// List all medications ordered by name.
    pub fn list_medications(&self) -> DbResult<Vec<Medication>> {
        let sql = format!("SELECT {} FROM medications ORDER BY name, id", MEDICATION_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], MedicationRow::from_row)?;

        let mut medications = Vec::new();
        for row in rows {
            medications.push(row?.try_into()?);
        }
        Ok(medications)
    }

    /// Search medications by name, manufacturer or composition (FTS5, BM25 ranking).
    pub fn search_medications(&self, query: &str, limit: usize) -> DbResult<Vec<Medication>> {
        let escaped_query = escape_fts_query(query);
        if escaped_query.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT m.id, m.name, m.category, m.unit, m.manufacturer, m.composition,
                   m.available, m.batches, m.created_at, m.updated_at,
                   bm25(medications_fts) as rank
            FROM medications m
            JOIN medications_fts fts ON m.rowid = fts.rowid
            WHERE medications_fts MATCH ?
            ORDER BY rank
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![escaped_query, limit as i64], MedicationRow::from_row)?;

        let mut medications = Vec::new();
        for row in rows {
            medications.push(row?.try_into()?);
        }
        Ok(medications)
    }

    /// Delete a medication and its stock.
    pub fn delete_medication(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM medications WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Replace a medication's batch list in one statement.
pub(super) fn write_batches(conn: &Connection, medication: &Medication) -> DbResult<()> {
    let batches_json = serde_json::to_string(&medication.batches)?;
    let rows_affected = conn.execute(
        "UPDATE medications SET batches = ?2, updated_at = ?3 WHERE id = ?1",
        params![medication.id, batches_json, medication.updated_at],
    )?;
    if rows_affected == 0 {
        return Err(DbError::NotFound(format!("medication {}", medication.id)));
    }
    Ok(())
}

/// Intermediate row struct for database mapping.
struct MedicationRow {
    id: String,
    name: String,
    category: String,
    unit: String,
    manufacturer: String,
    composition: String,
    available: bool,
    batches: String,
    created_at: String,
    updated_at: String,
}

impl MedicationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            unit: row.get(3)?,
            manufacturer: row.get(4)?,
            composition: row.get(5)?,
            available: row.get(6)?,
            batches: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl TryFrom<MedicationRow> for Medication {
    type Error = DbError;

    fn try_from(row: MedicationRow) -> Result<Self, Self::Error> {
        Ok(Medication {
            id: row.id,
            name: row.name,
            category: row.category,
            unit: row.unit,
            manufacturer: row.manufacturer,
            composition: row.composition,
            available: row.available,
            batches: serde_json::from_str(&row.batches)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Escape special FTS5 characters and prepare query for prefix matching.
fn escape_fts_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| format!("{}*", word))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Batch, NewBatch};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn amox() -> Medication {
        let mut details = MedicationDetails::new("Amoxicillin 500mg", "Antibiotic", "box", "Acme Labs");
        details.composition = "amoxicillin trihydrate".into();
        Medication::new(details)
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let mut med = amox();
        med.batches.push(Batch::new(NewBatch {
            lot: "L-01".into(),
            expires_on: "2030-05-01".parse().unwrap(),
            quantity: 12,
        }));
        db.insert_medication(&med).unwrap();

        let retrieved = db.get_medication(&med.id).unwrap().unwrap();
        assert_eq!(retrieved, med);
    }

    #[test]
    fn test_get_missing() {
        let db = setup_db();
        assert!(db.get_medication("nope").unwrap().is_none());
    }

    #[test]
    fn test_update_details_keeps_batches() {
        let db = setup_db();
        let mut med = amox();
        med.batches.push(Batch::new(NewBatch {
            lot: "L-01".into(),
            expires_on: "2030-05-01".parse().unwrap(),
            quantity: 12,
        }));
        db.insert_medication(&med).unwrap();

        let mut details = med.details();
        details.name = "Amoxicillin 875mg".into();
        details.available = false;
        assert!(db.update_medication_details(&med.id, &details).unwrap());

        let retrieved = db.get_medication(&med.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Amoxicillin 875mg");
        assert!(!retrieved.available);
        assert_eq!(retrieved.batches, med.batches);
    }

    #[test]
    fn test_update_missing_returns_false() {
        let db = setup_db();
        let details = amox().details();
        assert!(!db.update_medication_details("nope", &details).unwrap());
    }

    #[test]
    fn test_list_ordered_by_name() {
        let db = setup_db();
        for name in ["Paracetamol", "Dipyrone", "Ibuprofen"] {
            let med = Medication::new(MedicationDetails::new(name, "Analgesic", "box", "Acme"));
            db.insert_medication(&med).unwrap();
        }

        let names: Vec<String> = db
            .list_medications()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Dipyrone", "Ibuprofen", "Paracetamol"]);
    }

    #[test]
    fn test_search_medications() {
        let db = setup_db();
        let med = amox();
        db.insert_medication(&med).unwrap();
        db.insert_medication(&Medication::new(MedicationDetails::new(
            "Ibuprofen 400mg",
            "Anti-inflammatory",
            "box",
            "Other Pharma",
        )))
        .unwrap();

        // By name
        let results = db.search_medications("amoxicillin", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, med.id);

        // By manufacturer
        let results = db.search_medications("acme", 10).unwrap();
        assert_eq!(results.len(), 1);

        // Prefix search
        let results = db.search_medications("ibu", 10).unwrap();
        assert_eq!(results.len(), 1);

        // Punctuation only
        assert!(db.search_medications("\"*", 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_follows_rename() {
        let db = setup_db();
        let med = amox();
        db.insert_medication(&med).unwrap();

        let mut details = med.details();
        details.name = "Cephalexin".into();
        details.composition = String::new();
        db.update_medication_details(&med.id, &details).unwrap();

        assert!(db.search_medications("amoxicillin", 10).unwrap().is_empty());
        assert_eq!(db.search_medications("cephalexin", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let db = setup_db();
        let med = amox();
        db.insert_medication(&med).unwrap();

        assert!(db.delete_medication(&med.id).unwrap());
        assert!(!db.delete_medication(&med.id).unwrap());
        assert!(db.get_medication(&med.id).unwrap().is_none());
        assert!(db.search_medications("amoxicillin", 10).unwrap().is_empty());
    }

    #[test]
    fn test_write_batches_missing_medication() {
        let db = setup_db();
        let med = amox();
        assert!(matches!(
            write_batches(db.conn(), &med),
            Err(DbError::NotFound(_))
        ));
    }
}
