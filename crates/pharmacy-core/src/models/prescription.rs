//! Prescription models.

use serde::{Deserialize, Serialize};

use super::Sale;

/// Prescription lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrescriptionStatus {
    /// Registered, medication not yet handed out
    Pending,
    /// Dispensed at the counter
    Delivered,
    /// Voided
    Cancelled,
}

/// A prescription registered at the pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Local UUID
    pub id: String,
    /// Prescribing doctor
    pub doctor_id: Option<String>,
    /// Issuing clinic
    pub clinic_id: Option<String>,
    pub patient_name: String,
    /// Free-text prescribed lines
    pub items: Vec<String>,
    pub notes: String,
    /// Scanned file reference
    pub file_name: String,
    pub file_url: String,
    pub status: PrescriptionStatus,
    /// Sale that dispensed this prescription
    pub sale_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PrescriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionStatus::Pending => "pending",
            PrescriptionStatus::Delivered => "delivered",
            PrescriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PrescriptionStatus::Pending),
            "delivered" => Some(PrescriptionStatus::Delivered),
            "cancelled" => Some(PrescriptionStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a manual edit may move a prescription from `self` to `next`.
    ///
    /// Only checkout marks a prescription delivered, and a delivered one
    /// stays delivered.
    pub fn can_change_to(self, next: PrescriptionStatus) -> bool {
        use PrescriptionStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Cancelled)
                | (Cancelled, Cancelled)
                | (Cancelled, Pending)
                | (Delivered, Delivered)
        )
    }
}

impl Prescription {
    /// Create a pending prescription for a patient.
    pub fn new(patient_name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            doctor_id: None,
            clinic_id: None,
            patient_name,
            items: Vec::new(),
            notes: String::new(),
            file_name: String::new(),
            file_url: String::new(),
            status: PrescriptionStatus::Pending,
            sale_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Delivered prescription recorded by a sale that carried an attachment.
    pub fn dispensed_by(sale: &Sale) -> Option<Self> {
        let attachment = sale.prescription.as_ref()?;
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            doctor_id: None,
            clinic_id: None,
            patient_name: sale.customer.patient_name.clone().unwrap_or_default(),
            items: sale.items.iter().map(|item| item.describe()).collect(),
            notes: String::new(),
            file_name: attachment.file_name.clone(),
            file_url: attachment.file_url.clone(),
            status: PrescriptionStatus::Delivered,
            sale_id: Some(sale.id.clone()),
            created_at: sale.created_at.clone(),
            updated_at: sale.created_at.clone(),
        })
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrescriptionAttachment, SaleItem, SaleLine, SaleRequest};

    #[test]
    fn test_status_roundtrip() {
        for status in [
            PrescriptionStatus::Pending,
            PrescriptionStatus::Delivered,
            PrescriptionStatus::Cancelled,
        ] {
            assert_eq!(PrescriptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PrescriptionStatus::parse("shipped"), None);
    }

    #[test]
    fn test_manual_status_changes() {
        use PrescriptionStatus::*;
        assert!(Pending.can_change_to(Cancelled));
        assert!(Cancelled.can_change_to(Pending));
        assert!(Delivered.can_change_to(Delivered));
        assert!(!Pending.can_change_to(Delivered));
        assert!(!Cancelled.can_change_to(Delivered));
        assert!(!Delivered.can_change_to(Pending));
        assert!(!Delivered.can_change_to(Cancelled));
    }

    #[test]
    fn test_dispensed_by_sale() {
        let mut request = SaleRequest::new(vec![SaleLine::new("med-1", 2)], "s-1", "Ana");
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
            batches: vec![],
        }];
        let sale = Sale::from_request(&request, items).unwrap();

        let rx = Prescription::dispensed_by(&sale).unwrap();
        assert_eq!(rx.status, PrescriptionStatus::Delivered);
        assert_eq!(rx.sale_id.as_deref(), Some(sale.id.as_str()));
        assert_eq!(rx.patient_name, "Maria");
        assert_eq!(rx.items, vec!["Dipyrone - 2 box"]);
        assert_eq!(rx.file_name, "rx.pdf");
    }

    #[test]
    fn test_no_attachment_no_prescription() {
        let request = SaleRequest::new(vec![SaleLine::new("med-1", 2)], "s-1", "Ana");
        let sale = Sale::from_request(&request, vec![]).unwrap();
        assert!(Prescription::dispensed_by(&sale).is_none());
    }
}
