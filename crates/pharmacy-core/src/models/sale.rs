//! Point-of-sale models: requests, usage traces and committed sales.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One requested line of a checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleLine {
    pub medication_id: String,
    pub quantity: u32,
}

/// Customer data captured at checkout. Carried through, never interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerInfo {
    /// Patient name
    pub patient_name: Option<String>,
    /// National document number
    pub document: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
}

/// Reference to a prescription file handed in at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrescriptionAttachment {
    pub file_name: String,
    pub file_url: String,
}

/// A checkout request against the batch ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleRequest {
    /// Requested lines in display order
    pub lines: Vec<SaleLine>,
    /// Customer metadata
    pub customer: CustomerInfo,
    /// Staff member running the till
    pub staff_id: String,
    /// Staff member display name
    pub staff_name: String,
    /// Prescription presented, if any
    pub prescription: Option<PrescriptionAttachment>,
}

/// Units drawn from one batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchUsage {
    pub batch_id: String,
    pub lot: String,
    pub quantity_used: u32,
}

/// Per-medication result of a sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleItem {
    pub medication_id: String,
    pub medication_name: String,
    pub unit: String,
    /// Combined quantity across all lines for this medication
    pub quantity: u32,
    /// Batches drawn from, earliest expiration first
    pub batches: Vec<BatchUsage>,
}

/// A committed sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sale {
    /// Unique sale ID
    pub id: String,
    /// One entry per distinct medication, in first-appearance order
    pub items: Vec<SaleItem>,
    pub customer: CustomerInfo,
    pub staff_id: String,
    pub staff_name: String,
    pub prescription: Option<PrescriptionAttachment>,
    /// Commit timestamp
    pub created_at: String,
    /// SHA-256 of the canonical JSON with this field empty
    pub receipt_hash: String,
}

impl SaleRequest {
    /// Request with the given lines and no customer metadata.
    pub fn new(lines: Vec<SaleLine>, staff_id: &str, staff_name: &str) -> Self {
        Self {
            lines,
            customer: CustomerInfo::default(),
            staff_id: staff_id.to_string(),
            staff_name: staff_name.to_string(),
            prescription: None,
        }
    }
}

impl SaleLine {
    pub fn new(medication_id: &str, quantity: u32) -> Self {
        Self {
            medication_id: medication_id.to_string(),
            quantity,
        }
    }
}

impl SaleItem {
    /// Receipt line, e.g. "Amoxicillin 500mg - 2 box".
    pub fn describe(&self) -> String {
        format!("{} - {} {}", self.medication_name, self.quantity, self.unit)
    }
}

impl Sale {
    /// Build a sale from a request and its items, sealing the receipt hash.
    pub fn from_request(request: &SaleRequest, items: Vec<SaleItem>) -> Result<Self, serde_json::Error> {
        let mut sale = Self {
            id: uuid::Uuid::new_v4().to_string(),
            items,
            customer: request.customer.clone(),
            staff_id: request.staff_id.clone(),
            staff_name: request.staff_name.clone(),
            prescription: request.prescription.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            receipt_hash: String::new(),
        };
        sale.receipt_hash = sale.compute_receipt_hash()?;
        Ok(sale)
    }

    /// Serialize to canonical JSON for hashing.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Hash of the sale contents, ignoring the stored hash.
    pub fn compute_receipt_hash(&self) -> Result<String, serde_json::Error> {
        let unsealed = Self {
            receipt_hash: String::new(),
            ..self.clone()
        };
        Ok(hash_data(unsealed.to_canonical_json()?.as_bytes()))
    }

    /// Check the stored receipt hash against the contents.
    pub fn verify_receipt(&self) -> bool {
        self.compute_receipt_hash()
            .map(|hash| hash == self.receipt_hash)
            .unwrap_or(false)
    }

    /// Total units sold for a medication in this sale.
    pub fn quantity_of(&self, medication_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|item| item.medication_id == medication_id)
            .map(|item| item.quantity)
            .sum()
    }
}

/// Compute SHA-256 hash of data, hex encoded.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
