//! Sale records. Sales are written only through the ledger's commit.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::Sale;

impl Database {
    /// Get a sale by ID.
    pub fn get_sale(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, items, customer, staff_id, staff_name, prescription,
                       receipt_hash, created_at
                FROM sales
                WHERE id = ?
                "#,
                [id],
                SaleRow::from_row,
            )
            .optional()?;

        row.map(|r| r.try_into()).transpose()
    }

    /// List all sales, newest first.
    pub fn list_sales(&self) -> DbResult<Vec<Sale>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, items, customer, staff_id, staff_name, prescription,
                   receipt_hash, created_at
            FROM sales
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([], SaleRow::from_row)?;

        let mut sales = Vec::new();
        for row in rows {
            sales.push(row?.try_into()?);
        }
        Ok(sales)
    }
}

/// Append a sale row.
pub(super) fn insert_sale(conn: &Connection, sale: &Sale) -> DbResult<()> {
    let items_json = serde_json::to_string(&sale.items)?;
    let customer_json = serde_json::to_string(&sale.customer)?;
    let prescription_json = sale
        .prescription
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        r#"
        INSERT INTO sales (
            id, items, customer, staff_id, staff_name, prescription,
            receipt_hash, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            sale.id,
            items_json,
            customer_json,
            sale.staff_id,
            sale.staff_name,
            prescription_json,
            sale.receipt_hash,
            sale.created_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct SaleRow {
    id: String,
    items: String,
    customer: String,
    staff_id: String,
    staff_name: String,
    prescription: Option<String>,
    receipt_hash: String,
    created_at: String,
}

impl SaleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            items: row.get(1)?,
            customer: row.get(2)?,
            staff_id: row.get(3)?,
            staff_name: row.get(4)?,
            prescription: row.get(5)?,
            receipt_hash: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl TryFrom<SaleRow> for Sale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        Ok(Sale {
            id: row.id,
            items: serde_json::from_str(&row.items)?,
            customer: serde_json::from_str(&row.customer)?,
            staff_id: row.staff_id,
            staff_name: row.staff_name,
            prescription: row
                .prescription
                .map(|s| serde_json::from_str(&s))
                .transpose()?,
            receipt_hash: row.receipt_hash,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BatchUsage, PrescriptionAttachment, SaleItem, SaleLine, SaleRequest};

    fn make_sale(staff: &str) -> Sale {
        let mut request = SaleRequest::new(vec![SaleLine::new("med-1", 2)], staff, "Ana");
        request.customer.patient_name = Some("Maria".into());
        request.prescription = Some(PrescriptionAttachment {
            file_name: "rx.pdf".into(),
            file_url: "files/rx.pdf".into(),
        });
        let items = vec![SaleItem {
            medication_id: "med-1".into(),
            medication_name: "Dipyrone".into(),
            unit: "box".into(),
            quantity: 2,
            batches: vec![BatchUsage {
                batch_id: "b-1".into(),
                lot: "L-1".into(),
                quantity_used: 2,
            }],
        }];
        Sale::from_request(&request, items).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let sale = make_sale("s-1");
        insert_sale(db.conn(), &sale).unwrap();

        let retrieved = db.get_sale(&sale.id).unwrap().unwrap();
        assert_eq!(retrieved, sale);
        assert!(retrieved.verify_receipt());
    }

    #[test]
    fn test_list_sales() {
        let db = Database::open_in_memory().unwrap();
        insert_sale(db.conn(), &make_sale("s-1")).unwrap();
        insert_sale(db.conn(), &make_sale("s-2")).unwrap();

        assert_eq!(db.list_sales().unwrap().len(), 2);
        assert!(db.get_sale("missing").unwrap().is_none());
    }
}
