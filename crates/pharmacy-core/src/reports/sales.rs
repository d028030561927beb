//! Sales aggregates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::UNKNOWN_NAME;
use crate::models::Sale;

/// Units sold for one medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationSales {
    pub medication_id: String,
    /// Name recorded on the most recent sale seen
    pub medication_name: String,
    /// Units sold across all sales
    pub total_quantity: u64,
    /// Number of sales that included the medication
    pub sale_count: u64,
}

/// Sales handled by one staff member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffSales {
    pub staff_id: String,
    pub staff_name: String,
    pub sale_count: u64,
}

/// Medications ranked by units sold.
pub fn most_sold(sales: &[Sale]) -> Vec<MedicationSales> {
    let mut by_id: BTreeMap<&str, MedicationSales> = BTreeMap::new();

    for sale in sales {
        for item in &sale.items {
            let entry = by_id
                .entry(item.medication_id.as_str())
                .or_insert_with(|| MedicationSales {
                    medication_id: item.medication_id.clone(),
                    medication_name: item.medication_name.clone(),
                    total_quantity: 0,
                    sale_count: 0,
                });
            entry.total_quantity += u64::from(item.quantity);
            entry.sale_count += 1;
        }
    }

    let mut rows: Vec<_> = by_id.into_values().collect();
    rows.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    rows
}

/// Staff ranked by number of sales.
pub fn sales_by_staff(sales: &[Sale]) -> Vec<StaffSales> {
    let mut by_id: BTreeMap<&str, StaffSales> = BTreeMap::new();

    for sale in sales {
        let entry = by_id.entry(sale.staff_id.as_str()).or_insert_with(|| StaffSales {
            staff_id: sale.staff_id.clone(),
            staff_name: if sale.staff_name.trim().is_empty() {
                UNKNOWN_NAME.to_string()
            } else {
                sale.staff_name.clone()
            },
            sale_count: 0,
        });
        entry.sale_count += 1;
    }

    let mut rows: Vec<_> = by_id.into_values().collect();
    rows.sort_by(|a, b| b.sale_count.cmp(&a.sale_count));
    rows
}
