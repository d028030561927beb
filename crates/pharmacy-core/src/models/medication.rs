//! Medication catalog and batch (lot) models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::fifo;

/// A medication in the pharmacy catalog together with its stock batches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    /// Local UUID
    pub id: String,
    /// Display name (e.g., "Amoxicillin 500mg")
    pub name: String,
    /// Therapeutic category
    pub category: String,
    /// Unit of measure (e.g., "box", "tablet", "mL")
    pub unit: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Active ingredients / composition
    pub composition: String,
    /// Whether the medication is offered for sale
    pub available: bool,
    /// Stock batches, ascending by expiration date
    pub batches: Vec<Batch>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// A discrete quantity of a medication received together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    /// Local UUID
    pub id: String,
    /// Lot label printed on the packaging
    pub lot: String,
    /// Expiration date
    pub expires_on: NaiveDate,
    /// Remaining units
    pub quantity: u32,
    /// When the batch was received
    pub received_at: String,
}

/// Stock received for a medication, before it becomes a [`Batch`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBatch {
    pub lot: String,
    pub expires_on: NaiveDate,
    pub quantity: u32,
}

/// Editable catalog fields of a medication. Batches are never part of this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationDetails {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub manufacturer: String,
    pub composition: String,
    pub available: bool,
}

impl Medication {
    /// Create a new medication with no stock.
    pub fn new(details: MedicationDetails) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: details.name,
            category: details.category,
            unit: details.unit,
            manufacturer: details.manufacturer,
            composition: details.composition,
            available: details.available,
            batches: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Total units across all batches.
    pub fn stock(&self) -> u64 {
        fifo::total_available(&self.batches)
    }

    /// Current catalog fields.
    pub fn details(&self) -> MedicationDetails {
        MedicationDetails {
            name: self.name.clone(),
            category: self.category.clone(),
            unit: self.unit.clone(),
            manufacturer: self.manufacturer.clone(),
            composition: self.composition.clone(),
            available: self.available,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

impl MedicationDetails {
    /// Details with the required fields and everything else defaulted.
    pub fn new(name: &str, category: &str, unit: &str, manufacturer: &str) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            unit: unit.to_string(),
            manufacturer: manufacturer.to_string(),
            composition: String::new(),
            available: true,
        }
    }

    /// Name of the first missing required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("category", &self.category),
            ("unit", &self.unit),
            ("manufacturer", &self.manufacturer),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

impl Batch {
    /// Create a batch with a fresh identity.
    pub fn new(new_batch: NewBatch) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            lot: new_batch.lot,
            expires_on: new_batch.expires_on,
            quantity: new_batch.quantity,
            received_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.quantity == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_medication_has_no_stock() {
        let med = Medication::new(MedicationDetails::new("Amox", "Antibiotic", "box", "Acme"));
        assert_eq!(med.id.len(), 36); // UUID format
        assert!(med.batches.is_empty());
        assert_eq!(med.stock(), 0);
        assert!(med.available);
    }

    #[test]
    fn test_stock_sums_batches() {
        let mut med = Medication::new(MedicationDetails::new("Amox", "Antibiotic", "box", "Acme"));
        for qty in [5, 7, 11] {
            med.batches.push(Batch::new(NewBatch {
                lot: "L".into(),
                expires_on: date("2030-01-01"),
                quantity: qty,
            }));
        }
        assert_eq!(med.stock(), 23);
    }

    #[test]
    fn test_missing_field() {
        let mut details = MedicationDetails::new("Amox", "Antibiotic", "box", "Acme");
        assert_eq!(details.missing_field(), None);

        details.unit = "  ".into();
        assert_eq!(details.missing_field(), Some("unit"));

        details.name.clear();
        assert_eq!(details.missing_field(), Some("name"));
    }

    #[test]
    fn test_batch_date_serializes_as_iso() {
        let batch = Batch::new(NewBatch {
            lot: "A-01".into(),
            expires_on: date("2024-06-01"),
            quantity: 3,
        });
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.contains("\"expires_on\":\"2024-06-01\""));
    }
}
