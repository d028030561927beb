//! SQLite schema definition.

/// Complete database schema for the pharmacy.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medication Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS medications (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    unit TEXT NOT NULL,
    manufacturer TEXT NOT NULL,
    composition TEXT NOT NULL DEFAULT '',
    available INTEGER NOT NULL DEFAULT 1,
    batches TEXT NOT NULL DEFAULT '[]',          -- JSON array of Batch, ascending by expiration
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_medications_name ON medications(name);

-- FTS5 virtual table for catalog search
CREATE VIRTUAL TABLE IF NOT EXISTS medications_fts USING fts5(
    name,
    manufacturer,
    composition,
    content='medications',
    content_rowid='rowid'
);

-- Triggers to keep FTS5 in sync with main table
CREATE TRIGGER IF NOT EXISTS medications_ai AFTER INSERT ON medications BEGIN
    INSERT INTO medications_fts(rowid, name, manufacturer, composition)
    VALUES (new.rowid, new.name, new.manufacturer, new.composition);
END;

CREATE TRIGGER IF NOT EXISTS medications_ad AFTER DELETE ON medications BEGIN
    INSERT INTO medications_fts(medications_fts, rowid, name, manufacturer, composition)
    VALUES ('delete', old.rowid, old.name, old.manufacturer, old.composition);
END;

CREATE TRIGGER IF NOT EXISTS medications_au AFTER UPDATE OF name, manufacturer, composition ON medications BEGIN
    INSERT INTO medications_fts(medications_fts, rowid, name, manufacturer, composition)
    VALUES ('delete', old.rowid, old.name, old.manufacturer, old.composition);
    INSERT INTO medications_fts(rowid, name, manufacturer, composition)
    VALUES (new.rowid, new.name, new.manufacturer, new.composition);
END;

-- ============================================================================
-- Clinics & Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS clinics (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    license TEXT NOT NULL,
    clinic_id TEXT REFERENCES clinics(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_doctors_clinic ON doctors(clinic_id);

-- ============================================================================
-- Sales (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS sales (
    id TEXT PRIMARY KEY,
    items TEXT NOT NULL,                         -- JSON array of SaleItem
    customer TEXT NOT NULL DEFAULT '{}',         -- JSON CustomerInfo
    staff_id TEXT NOT NULL,
    staff_name TEXT NOT NULL,
    prescription TEXT,                           -- JSON PrescriptionAttachment
    receipt_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sales_staff ON sales(staff_id);
CREATE INDEX IF NOT EXISTS idx_sales_created ON sales(created_at);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    doctor_id TEXT,                              -- kept when the doctor is deleted
    clinic_id TEXT,
    patient_name TEXT NOT NULL DEFAULT '',
    items TEXT NOT NULL DEFAULT '[]',            -- JSON array of strings
    notes TEXT NOT NULL DEFAULT '',
    file_name TEXT NOT NULL DEFAULT '',
    file_url TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'delivered', 'cancelled')),
    sale_id TEXT REFERENCES sales(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_doctor ON prescriptions(doctor_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_clinic ON prescriptions(clinic_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_sale ON prescriptions(sale_id);

-- ============================================================================
-- Staff Directory
-- ============================================================================

CREATE TABLE IF NOT EXISTS staff (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL CHECK (role IN ('pharmacist', 'admin', 'manager', 'clerk')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_fts_trigger() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO medications (id, name, category, unit, manufacturer, composition)
             VALUES (?, ?, ?, ?, ?, ?)",
            ["m1", "Amoxicillin 500mg", "Antibiotic", "box", "Acme", "amoxicillin trihydrate"],
        )
        .unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM medications_fts WHERE medications_fts MATCH 'amoxicillin'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM medications_fts WHERE medications_fts MATCH 'acme'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_prescription_status_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO prescriptions (id, status) VALUES ('p1', 'shipped')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO prescriptions (id, status) VALUES ('p1', 'pending')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_staff_role_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO staff (id, name, email, role) VALUES ('s1', 'Ana', 'a@x', 'owner')",
            [],
        );
        assert!(result.is_err());
    }
}
