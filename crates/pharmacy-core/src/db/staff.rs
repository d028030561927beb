//! Staff directory operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Role, StaffMember};

impl Database {
    /// Insert a new staff member. Emails are unique.
    pub fn insert_staff(&self, member: &StaffMember) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO staff (id, name, email, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                member.id,
                member.name,
                member.email,
                member.role.as_str(),
                member.created_at,
                member.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a staff member by ID.
    pub fn get_staff(&self, id: &str) -> DbResult<Option<StaffMember>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, email, role, created_at, updated_at FROM staff WHERE id = ?",
                [id],
                StaffRow::from_row,
            )
            .optional()?;

        row.map(|r| r.try_into()).transpose()
    }

    /// List staff ordered by name.
    pub fn list_staff(&self) -> DbResult<Vec<StaffMember>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, role, created_at, updated_at FROM staff ORDER BY name, id",
        )?;
        let rows = stmt.query_map([], StaffRow::from_row)?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?.try_into()?);
        }
        Ok(members)
    }

    /// Change a staff member's role.
    pub fn update_staff_role(&self, id: &str, role: Role) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE staff SET role = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, role.as_str(), chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Remove a staff member. Their past sales keep the recorded name.
    pub fn delete_staff(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM staff WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct StaffRow {
    id: String,
    name: String,
    email: String,
    role: String,
    created_at: String,
    updated_at: String,
}

impl StaffRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            role: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl TryFrom<StaffRow> for StaffMember {
    type Error = DbError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| DbError::Constraint(format!("unknown role: {}", row.role)))?;

        Ok(StaffMember {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
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
        let member = StaffMember::new("Ana".into(), "ana@example.com".into(), Role::Pharmacist);
        db.insert_staff(&member).unwrap();

        assert_eq!(db.get_staff(&member.id).unwrap().unwrap(), member);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_staff(&StaffMember::new("Ana".into(), "ana@example.com".into(), Role::Clerk))
            .unwrap();
        let dup = StaffMember::new("Ana B".into(), "ana@example.com".into(), Role::Clerk);
        assert!(db.insert_staff(&dup).is_err());
    }

    #[test]
    fn test_update_role_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let member = StaffMember::new("Rui".into(), "rui@example.com".into(), Role::Clerk);
        db.insert_staff(&member).unwrap();

        assert!(db.update_staff_role(&member.id, Role::Manager).unwrap());
        assert_eq!(db.get_staff(&member.id).unwrap().unwrap().role, Role::Manager);

        assert_eq!(db.list_staff().unwrap().len(), 1);
        assert!(db.delete_staff(&member.id).unwrap());
        assert!(!db.update_staff_role(&member.id, Role::Admin).unwrap());
    }
}
