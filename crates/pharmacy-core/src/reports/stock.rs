//! Stock level statistics.

use serde::{Deserialize, Serialize};

use crate::models::Medication;

/// A medication below the low-stock threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LowStock {
    pub medication_id: String,
    pub name: String,
    pub stock: u64,
}

/// Catalog-wide stock figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockStatistics {
    pub medication_count: u64,
    /// Units across every batch of every medication
    pub total_units: u64,
    pub threshold: u32,
    /// Medications whose stock is strictly below the threshold, in catalog order
    pub low_stock: Vec<LowStock>,
}

/// Summarize stock against a low-stock threshold.
pub fn stock_statistics(medications: &[Medication], threshold: u32) -> StockStatistics {
    let low_stock = medications
        .iter()
        .filter(|m| m.stock() < u64::from(threshold))
        .map(|m| LowStock {
            medication_id: m.id.clone(),
            name: m.name.clone(),
            stock: m.stock(),
        })
        .collect();

    StockStatistics {
        medication_count: medications.len() as u64,
        total_units: medications.iter().map(Medication::stock).sum(),
        threshold,
        low_stock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Batch, MedicationDetails, NewBatch};

    fn med(name: &str, quantities: &[u32]) -> Medication {
        let mut m = Medication::new(MedicationDetails::new(name, "Analgesic", "box", "Acme"));
        for &quantity in quantities {
            m.batches.push(Batch::new(NewBatch {
                lot: "L".into(),
                expires_on: "2030-01-01".parse().unwrap(),
                quantity,
            }));
        }
        m
    }

    #[test]
    fn test_statistics() {
        let meds = vec![med("Dipyrone", &[4, 5]), med("Ibuprofen", &[10]), med("Empty", &[])];

        let stats = stock_statistics(&meds, 10);
        assert_eq!(stats.medication_count, 3);
        assert_eq!(stats.total_units, 19);
        let low: Vec<&str> = stats.low_stock.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(low, vec!["Dipyrone", "Empty"]);
        assert_eq!(stats.low_stock[0].stock, 9);
    }

    #[test]
    fn test_zero_threshold_reports_nothing() {
        let stats = stock_statistics(&[med("Empty", &[])], 0);
        assert!(stats.low_stock.is_empty());
    }

    #[test]
    fn test_json_export() {
        let stats = stock_statistics(&[med("Dipyrone", &[3])], 10);
        let json = super::super::to_json(&stats).unwrap();
        assert!(json.contains("\"total_units\": 3"));
    }
}
