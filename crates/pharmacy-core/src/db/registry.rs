//! Clinic and doctor registry operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Clinic, Doctor};

impl Database {
    // ========================================================================
    // Clinics
    // ========================================================================

    /// Insert a new clinic.
    pub fn insert_clinic(&self, clinic: &Clinic) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO clinics (id, name, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                clinic.id,
                clinic.name,
                clinic.address,
                clinic.created_at,
                clinic.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing clinic.
    pub fn update_clinic(&self, clinic: &Clinic) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE clinics SET name = ?2, address = ?3, updated_at = ?4 WHERE id = ?1",
            params![clinic.id, clinic.name, clinic.address, clinic.updated_at],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a clinic by ID.
    pub fn get_clinic(&self, id: &str) -> DbResult<Option<Clinic>> {
        let clinic = self
            .conn
            .query_row(
                "SELECT id, name, address, created_at, updated_at FROM clinics WHERE id = ?",
                [id],
                clinic_from_row,
            )
            .optional()?;
        Ok(clinic)
    }

    /// List all clinics ordered by name.
    pub fn list_clinics(&self) -> DbResult<Vec<Clinic>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, address, created_at, updated_at FROM clinics ORDER BY name, id",
        )?;
        let clinics = stmt
            .query_map([], clinic_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clinics)
    }

    /// Delete a clinic. Its doctors are kept with no clinic.
    pub fn delete_clinic(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM clinics WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    // ========================================================================
    // Doctors
    // ========================================================================

    /// Insert a new doctor.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO doctors (id, name, license, clinic_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                doctor.id,
                doctor.name,
                doctor.license,
                doctor.clinic_id,
                doctor.created_at,
                doctor.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing doctor.
    pub fn update_doctor(&self, doctor: &Doctor) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE doctors SET name = ?2, license = ?3, clinic_id = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                doctor.id,
                doctor.name,
                doctor.license,
                doctor.clinic_id,
                doctor.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, id: &str) -> DbResult<Option<Doctor>> {
        let doctor = self
            .conn
            .query_row(
                r#"
                SELECT id, name, license, clinic_id, created_at, updated_at
                FROM doctors WHERE id = ?
                "#,
                [id],
                doctor_from_row,
            )
            .optional()?;
        Ok(doctor)
    }

    /// List all doctors ordered by name.
    pub fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, license, clinic_id, created_at, updated_at
            FROM doctors ORDER BY name, id
            "#,
        )?;
        let doctors = stmt
            .query_map([], doctor_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(doctors)
    }

    /// Delete a doctor. Prescriptions keep the dangling doctor id.
    pub fn delete_doctor(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM doctors WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn clinic_from_row(row: &Row<'_>) -> rusqlite::Result<Clinic> {
    Ok(Clinic {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        license: row.get(2)?,
        clinic_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
