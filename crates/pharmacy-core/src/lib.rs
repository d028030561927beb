//! Pharmacy Core Library
//!
//! Local-first pharmacy back office: medication catalog with batch (lot)
//! tracking, prescriptions, clinics and doctors, point-of-sale checkout and
//! management reports.
//!
//! # Architecture
//!
//! ```text
//!   Checkout (lines + customer + prescription file)
//!                         │
//!                  Role policy check
//!                         │
//!      ┌──────────────────▼──────────────────┐
//!      │             Batch Ledger            │
//!      │  lock touched medications (by id)   │
//!      │  check every line, then draw stock  │
//!      │  earliest expiration first (FIFO)   │
//!      └──────────────────┬──────────────────┘
//!                         │
//!             one SQLite transaction:
//!      batch lists + sale record + prescription
//!                         │
//!              ┌──────────┴──────────┐
//!              ▼                     ▼
//!           Receipt               Reports
//!     (usage per batch)    (most sold, prescribers,
//!                           staff, clinics, stock)
//! ```
//!
//! # Core Principle
//!
//! **A sale is all or nothing.** Either every line is satisfied and
//! persisted together with the sale record, or stock is left untouched.
//!
//! # Modules
//!
//! - [`ledger`]: FIFO batch ledger and the [`ledger::StockStore`] seam
//! - [`db`]: SQLite database layer with FTS5 search
//! - [`models`]: Domain types (Medication, Batch, Sale, Prescription, etc.)
//! - [`authz`]: Role-based authorization
//! - [`reports`]: Management reports
//! - [`pharmacy`]: Service facade used by the FFI object

pub mod authz;
pub mod config;
pub mod db;
pub mod ledger;
pub mod models;
pub mod pharmacy;
pub mod reports;
pub mod telemetry;

// Re-export commonly used types
pub use config::PharmacyConfig;
pub use db::Database;
pub use ledger::{Ledger, LedgerError, Shortfall, StockStore};
pub use models::{
    Batch, BatchUsage, Clinic, CustomerInfo, Doctor, Medication, MedicationDetails, NewBatch,
    Prescription, PrescriptionAttachment, PrescriptionStatus, Role, Sale, SaleItem, SaleLine,
    SaleRequest, StaffMember,
};
pub use pharmacy::{Pharmacy, ServiceError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PharmacyError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<ServiceError> for PharmacyError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Forbidden(e) => PharmacyError::Forbidden(e.to_string()),
            ServiceError::InvalidInput(msg) => PharmacyError::InvalidInput(msg),
            ServiceError::NotFound(msg) => PharmacyError::NotFound(msg),
            ServiceError::Database(e) => PharmacyError::DatabaseError(e.to_string()),
            ServiceError::Ledger(e) => e.into(),
        }
    }
}

impl From<LedgerError> for PharmacyError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidInput(msg) => PharmacyError::InvalidInput(msg),
            LedgerError::NotFound(id) => PharmacyError::NotFound(format!("medication {}", id)),
            LedgerError::InsufficientStock(shortfalls) => {
                let detail = shortfalls
                    .iter()
                    .map(|s| {
                        format!(
                            "{}: requested {}, available {}, short {}",
                            s.medication_id, s.requested, s.available, s.shortfall
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                PharmacyError::InsufficientStock(detail)
            }
            LedgerError::Persistence(e) => PharmacyError::DatabaseError(e.to_string()),
            LedgerError::Serialization(e) => PharmacyError::SerializationError(e.to_string()),
        }
    }
}

impl From<db::DbError> for PharmacyError {
    fn from(e: db::DbError) -> Self {
        PharmacyError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for PharmacyError {
    fn from(e: serde_json::Error) -> Self {
        PharmacyError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the log subscriber (`RUST_LOG`, default `info`).
#[uniffi::export]
pub fn init_logging() {
    telemetry::init();
}

/// Open or create a pharmacy database at the given path.
#[uniffi::export]
pub fn open_pharmacy(path: String) -> Result<Arc<PharmacyCore>, PharmacyError> {
    let config = PharmacyConfig {
        database_path: Some(path.into()),
        ..PharmacyConfig::default()
    };
    PharmacyCore::open(config)
}

/// Create an in-memory pharmacy (for testing).
#[uniffi::export]
pub fn open_pharmacy_in_memory() -> Result<Arc<PharmacyCore>, PharmacyError> {
    PharmacyCore::open(PharmacyConfig::default())
}

/// Open the pharmacy described by `PHARMACY_DB_PATH` and
/// `PHARMACY_LOW_STOCK_THRESHOLD`.
#[uniffi::export]
pub fn open_pharmacy_from_env() -> Result<Arc<PharmacyCore>, PharmacyError> {
    let config =
        PharmacyConfig::from_env().map_err(|e| PharmacyError::InvalidInput(format!("{:#}", e)))?;
    PharmacyCore::open(config)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe pharmacy handle for FFI. Every call names the acting staff
/// member by id.
#[derive(uniffi::Object)]
pub struct PharmacyCore {
    pharmacy: Pharmacy,
}

impl PharmacyCore {
    fn open(config: PharmacyConfig) -> Result<Arc<Self>, PharmacyError> {
        let pharmacy = Pharmacy::open(config)?;
        Ok(Arc::new(Self { pharmacy }))
    }

    fn actor(&self, staff_id: &str) -> Result<StaffMember, PharmacyError> {
        Ok(self.pharmacy.staff_member(staff_id)?)
    }
}

#[uniffi::export]
impl PharmacyCore {
    // =========================================================================
    // Staff Operations
    // =========================================================================

    /// Register the first administrator of an empty staff directory.
    pub fn bootstrap_admin(&self, name: String, email: String) -> Result<FfiStaffMember, PharmacyError> {
        Ok(self.pharmacy.bootstrap_admin(&name, &email)?.into())
    }

    pub fn add_staff(
        &self,
        staff_id: String,
        name: String,
        email: String,
        role: String,
    ) -> Result<FfiStaffMember, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let role = parse_role(&role)?;
        Ok(self.pharmacy.add_staff(&user, &name, &email, role)?.into())
    }

    pub fn list_staff(&self, staff_id: String) -> Result<Vec<FfiStaffMember>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let members = self.pharmacy.list_staff(&user)?;
        Ok(members.into_iter().map(|m| m.into()).collect())
    }

    pub fn set_staff_role(&self, staff_id: String, member_id: String, role: String) -> Result<(), PharmacyError> {
        let user = self.actor(&staff_id)?;
        let role = parse_role(&role)?;
        Ok(self.pharmacy.set_staff_role(&user, &member_id, role)?)
    }

    pub fn remove_staff(&self, staff_id: String, member_id: String) -> Result<(), PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.remove_staff(&user, &member_id)?)
    }

    // =========================================================================
    // Catalog & Stock Operations
    // =========================================================================

    pub fn create_medication(
        &self,
        staff_id: String,
        details: FfiMedicationDetails,
    ) -> Result<FfiMedication, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.create_medication(&user, details.into())?.into())
    }

    pub fn update_medication(
        &self,
        staff_id: String,
        medication_id: String,
        details: FfiMedicationDetails,
    ) -> Result<FfiMedication, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let medication = self
            .pharmacy
            .update_medication(&user, &medication_id, details.into())?;
        Ok(medication.into())
    }

    pub fn delete_medication(&self, staff_id: String, medication_id: String) -> Result<(), PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.delete_medication(&user, &medication_id)?)
    }

    pub fn get_medication(
        &self,
        staff_id: String,
        medication_id: String,
    ) -> Result<Option<FfiMedication>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let medication = self.pharmacy.get_medication(&user, &medication_id)?;
        Ok(medication.map(|m| m.into()))
    }

    pub fn list_medications(&self, staff_id: String) -> Result<Vec<FfiMedication>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let medications = self.pharmacy.list_medications(&user)?;
        Ok(medications.into_iter().map(|m| m.into()).collect())
    }

    /// Search catalog by name, manufacturer or composition.
    pub fn search_medications(
        &self,
        staff_id: String,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiMedication>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let medications = self
            .pharmacy
            .search_medications(&user, &query, limit as usize)?;
        Ok(medications.into_iter().map(|m| m.into()).collect())
    }

    /// Receive a batch; `expires_on` is `YYYY-MM-DD`.
    pub fn receive_batch(
        &self,
        staff_id: String,
        medication_id: String,
        lot: String,
        expires_on: String,
        quantity: u32,
    ) -> Result<FfiBatch, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let batch = NewBatch {
            lot,
            expires_on: parse_date(&expires_on)?,
            quantity,
        };
        Ok(self.pharmacy.receive_batch(&user, &medication_id, batch)?.into())
    }

    pub fn stock_level(&self, staff_id: String, medication_id: String) -> Result<u64, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.stock_level(&user, &medication_id)?)
    }

    // =========================================================================
    // Sale Operations
    // =========================================================================

    /// Finalize a checkout. Fails without touching stock if any line
    /// cannot be fully satisfied.
    pub fn checkout(&self, staff_id: String, checkout: FfiCheckout) -> Result<FfiSale, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let lines = checkout
            .lines
            .into_iter()
            .map(|l| SaleLine {
                medication_id: l.medication_id,
                quantity: l.quantity,
            })
            .collect();
        let prescription = checkout.prescription_file_name.map(|file_name| PrescriptionAttachment {
            file_name,
            file_url: checkout.prescription_file_url.unwrap_or_default(),
        });

        let sale = self
            .pharmacy
            .checkout(&user, lines, checkout.customer.into(), prescription)?;
        Ok(sale.into())
    }

    pub fn get_sale(&self, staff_id: String, sale_id: String) -> Result<Option<FfiSale>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.get_sale(&user, &sale_id)?.map(|s| s.into()))
    }

    pub fn list_sales(&self, staff_id: String) -> Result<Vec<FfiSale>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let sales = self.pharmacy.list_sales(&user)?;
        Ok(sales.into_iter().map(|s| s.into()).collect())
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    pub fn create_prescription(
        &self,
        staff_id: String,
        prescription: FfiPrescription,
    ) -> Result<FfiPrescription, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let mut new = Prescription::new(prescription.patient_name.clone());
        prescription.apply_to(&mut new)?;
        Ok(self.pharmacy.create_prescription(&user, new)?.into())
    }

    /// Update an existing prescription, including its status.
    pub fn update_prescription(
        &self,
        staff_id: String,
        prescription: FfiPrescription,
    ) -> Result<FfiPrescription, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let mut existing = self
            .pharmacy
            .get_prescription(&user, &prescription.id)?
            .ok_or_else(|| PharmacyError::NotFound(format!("prescription {}", prescription.id)))?;
        prescription.apply_to(&mut existing)?;
        Ok(self.pharmacy.update_prescription(&user, existing)?.into())
    }

    pub fn list_prescriptions(&self, staff_id: String) -> Result<Vec<FfiPrescription>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let prescriptions = self.pharmacy.list_prescriptions(&user)?;
        Ok(prescriptions.into_iter().map(|p| p.into()).collect())
    }

    pub fn prescriptions_for_sale(
        &self,
        staff_id: String,
        sale_id: String,
    ) -> Result<Vec<FfiPrescription>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let prescriptions = self.pharmacy.prescriptions_for_sale(&user, &sale_id)?;
        Ok(prescriptions.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Clinic & Doctor Operations
    // =========================================================================

    pub fn create_clinic(&self, staff_id: String, name: String, address: String) -> Result<FfiClinic, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.create_clinic(&user, &name, &address)?.into())
    }

    pub fn update_clinic(&self, staff_id: String, clinic: FfiClinic) -> Result<FfiClinic, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let mut existing = self
            .pharmacy
            .get_clinic(&user, &clinic.id)?
            .ok_or_else(|| PharmacyError::NotFound(format!("clinic {}", clinic.id)))?;
        existing.name = clinic.name;
        existing.address = clinic.address;
        Ok(self.pharmacy.update_clinic(&user, existing)?.into())
    }

    pub fn delete_clinic(&self, staff_id: String, clinic_id: String) -> Result<(), PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.delete_clinic(&user, &clinic_id)?)
    }

    pub fn list_clinics(&self, staff_id: String) -> Result<Vec<FfiClinic>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let clinics = self.pharmacy.list_clinics(&user)?;
        Ok(clinics.into_iter().map(|c| c.into()).collect())
    }

    pub fn create_doctor(
        &self,
        staff_id: String,
        name: String,
        license: String,
        clinic_id: Option<String>,
    ) -> Result<FfiDoctor, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.create_doctor(&user, &name, &license, clinic_id)?.into())
    }

    pub fn update_doctor(&self, staff_id: String, doctor: FfiDoctor) -> Result<FfiDoctor, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let mut existing = self
            .pharmacy
            .get_doctor(&user, &doctor.id)?
            .ok_or_else(|| PharmacyError::NotFound(format!("doctor {}", doctor.id)))?;
        existing.name = doctor.name;
        existing.license = doctor.license;
        existing.clinic_id = doctor.clinic_id;
        Ok(self.pharmacy.update_doctor(&user, existing)?.into())
    }

    pub fn delete_doctor(&self, staff_id: String, doctor_id: String) -> Result<(), PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(self.pharmacy.delete_doctor(&user, &doctor_id)?)
    }

    pub fn list_doctors(&self, staff_id: String) -> Result<Vec<FfiDoctor>, PharmacyError> {
        let user = self.actor(&staff_id)?;
        let doctors = self.pharmacy.list_doctors(&user)?;
        Ok(doctors.into_iter().map(|d| d.into()).collect())
    }

    // =========================================================================
    // Report Operations (JSON)
    // =========================================================================

    pub fn most_sold_report_json(&self, staff_id: String) -> Result<String, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(reports::to_json(&self.pharmacy.most_sold_report(&user)?)?)
    }

    pub fn top_prescribers_report_json(&self, staff_id: String) -> Result<String, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(reports::to_json(&self.pharmacy.top_prescribers_report(&user)?)?)
    }

    pub fn sales_by_staff_report_json(&self, staff_id: String) -> Result<String, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(reports::to_json(&self.pharmacy.sales_by_staff_report(&user)?)?)
    }

    pub fn clinics_report_json(&self, staff_id: String) -> Result<String, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(reports::to_json(&self.pharmacy.clinics_report(&user)?)?)
    }

    pub fn stock_report_json(&self, staff_id: String) -> Result<String, PharmacyError> {
        let user = self.actor(&staff_id)?;
        Ok(reports::to_json(&self.pharmacy.stock_report(&user)?)?)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, PharmacyError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| PharmacyError::InvalidInput(format!("invalid date {:?}: {}", s, e)))
}

fn parse_role(s: &str) -> Result<Role, PharmacyError> {
    Role::parse(s).ok_or_else(|| PharmacyError::InvalidInput(format!("unknown role: {}", s)))
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe catalog fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationDetails {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub manufacturer: String,
    pub composition: String,
    pub available: bool,
}

impl From<FfiMedicationDetails> for MedicationDetails {
    fn from(d: FfiMedicationDetails) -> Self {
        MedicationDetails {
            name: d.name,
            category: d.category,
            unit: d.unit,
            manufacturer: d.manufacturer,
            composition: d.composition,
            available: d.available,
        }
    }
}

/// FFI-safe medication with its stock.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub manufacturer: String,
    pub composition: String,
    pub available: bool,
    /// Units across all batches
    pub stock: u64,
    /// Earliest expiration first
    pub batches: Vec<FfiBatch>,
}

impl From<Medication> for FfiMedication {
    fn from(m: Medication) -> Self {
        Self {
            stock: m.stock(),
            id: m.id,
            name: m.name,
            category: m.category,
            unit: m.unit,
            manufacturer: m.manufacturer,
            composition: m.composition,
            available: m.available,
            batches: m.batches.into_iter().map(|b| b.into()).collect(),
        }
    }
}

/// FFI-safe batch. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBatch {
    pub id: String,
    pub lot: String,
    pub expires_on: String,
    pub quantity: u32,
}

impl From<Batch> for FfiBatch {
    fn from(b: Batch) -> Self {
        Self {
            id: b.id,
            lot: b.lot,
            expires_on: b.expires_on.format("%Y-%m-%d").to_string(),
            quantity: b.quantity,
        }
    }
}

/// FFI-safe checkout line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSaleLine {
    pub medication_id: String,
    pub quantity: u32,
}

/// FFI-safe customer data.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiCustomer {
    pub patient_name: Option<String>,
    pub document: Option<String>,
    pub phone: Option<String>,
}

impl From<FfiCustomer> for CustomerInfo {
    fn from(c: FfiCustomer) -> Self {
        CustomerInfo {
            patient_name: c.patient_name,
            document: c.document,
            phone: c.phone,
        }
    }
}

impl From<CustomerInfo> for FfiCustomer {
    fn from(c: CustomerInfo) -> Self {
        Self {
            patient_name: c.patient_name,
            document: c.document,
            phone: c.phone,
        }
    }
}

/// FFI-safe checkout request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCheckout {
    pub lines: Vec<FfiSaleLine>,
    pub customer: FfiCustomer,
    /// Prescription file handed in, if any
    pub prescription_file_name: Option<String>,
    pub prescription_file_url: Option<String>,
}

/// FFI-safe batch usage.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBatchUsage {
    pub batch_id: String,
    pub lot: String,
    pub quantity_used: u32,
}

/// FFI-safe sale item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSaleItem {
    pub medication_id: String,
    pub medication_name: String,
    pub unit: String,
    pub quantity: u32,
    pub batches: Vec<FfiBatchUsage>,
}

/// FFI-safe committed sale.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSale {
    pub id: String,
    pub items: Vec<FfiSaleItem>,
    pub customer: FfiCustomer,
    pub staff_id: String,
    pub staff_name: String,
    pub prescription_file_name: Option<String>,
    pub created_at: String,
    pub receipt_hash: String,
}

impl From<Sale> for FfiSale {
    fn from(s: Sale) -> Self {
        let items = s
            .items
            .into_iter()
            .map(|item| FfiSaleItem {
                medication_id: item.medication_id,
                medication_name: item.medication_name,
                unit: item.unit,
                quantity: item.quantity,
                batches: item
                    .batches
                    .into_iter()
                    .map(|u| FfiBatchUsage {
                        batch_id: u.batch_id,
                        lot: u.lot,
                        quantity_used: u.quantity_used,
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: s.id,
            items,
            customer: s.customer.into(),
            staff_id: s.staff_id,
            staff_name: s.staff_name,
            prescription_file_name: s.prescription.map(|p| p.file_name),
            created_at: s.created_at,
            receipt_hash: s.receipt_hash,
        }
    }
}

/// FFI-safe prescription. `status` is `pending`, `delivered` or `cancelled`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    /// Ignored on create
    pub id: String,
    pub doctor_id: Option<String>,
    pub clinic_id: Option<String>,
    pub patient_name: String,
    pub items: Vec<String>,
    pub notes: String,
    pub file_name: String,
    pub file_url: String,
    pub status: String,
    pub sale_id: Option<String>,
}

impl FfiPrescription {
    /// Copy the editable fields onto a stored prescription.
    fn apply_to(self, prescription: &mut Prescription) -> Result<(), PharmacyError> {
        prescription.status = PrescriptionStatus::parse(&self.status.to_lowercase()).ok_or_else(|| {
            PharmacyError::InvalidInput(format!("unknown prescription status: {}", self.status))
        })?;
        prescription.doctor_id = self.doctor_id;
        prescription.clinic_id = self.clinic_id;
        prescription.patient_name = self.patient_name;
        prescription.items = self.items;
        prescription.notes = self.notes;
        prescription.file_name = self.file_name;
        prescription.file_url = self.file_url;
        Ok(())
    }
}

impl From<Prescription> for FfiPrescription {
    fn from(p: Prescription) -> Self {
        Self {
            id: p.id,
            doctor_id: p.doctor_id,
            clinic_id: p.clinic_id,
            patient_name: p.patient_name,
            items: p.items,
            notes: p.notes,
            file_name: p.file_name,
            file_url: p.file_url,
            status: p.status.as_str().to_string(),
            sale_id: p.sale_id,
        }
    }
}

/// FFI-safe clinic.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinic {
    pub id: String,
    pub name: String,
    pub address: String,
}

impl From<Clinic> for FfiClinic {
    fn from(c: Clinic) -> Self {
        Self {
            id: c.id,
            name: c.name,
            address: c.address,
        }
    }
}

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: String,
    pub name: String,
    pub license: String,
    pub clinic_id: Option<String>,
}

impl From<Doctor> for FfiDoctor {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            license: d.license,
            clinic_id: d.clinic_id,
        }
    }
}

/// FFI-safe staff member.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStaffMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<StaffMember> for FfiStaffMember {
    fn from(m: StaffMember) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            role: m.role.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_with_admin() -> (Arc<PharmacyCore>, String) {
        let core = open_pharmacy_in_memory().unwrap();
        let admin = core.bootstrap_admin("Root".into(), "root@example.com".into()).unwrap();
        (core, admin.id)
    }

    fn details(name: &str) -> FfiMedicationDetails {
        FfiMedicationDetails {
            name: name.into(),
            category: "Antibiotic".into(),
            unit: "box".into(),
            manufacturer: "Acme".into(),
            composition: String::new(),
            available: true,
        }
    }

    #[test]
    fn test_checkout_through_ffi() {
        let (core, admin) = core_with_admin();
        let med = core.create_medication(admin.clone(), details("Amox")).unwrap();
        core.receive_batch(admin.clone(), med.id.clone(), "A".into(), "2024-01-01".into(), 10)
            .unwrap();
        core.receive_batch(admin.clone(), med.id.clone(), "B".into(), "2024-06-01".into(), 10)
            .unwrap();

        let sale = core
            .checkout(
                admin.clone(),
                FfiCheckout {
                    lines: vec![FfiSaleLine {
                        medication_id: med.id.clone(),
                        quantity: 12,
                    }],
                    customer: FfiCustomer::default(),
                    prescription_file_name: None,
                    prescription_file_url: None,
                },
            )
            .unwrap();

        assert_eq!(sale.items[0].batches.len(), 2);
        assert_eq!(sale.items[0].batches[0].quantity_used, 10);
        assert_eq!(sale.staff_name, "Root");

        let stored = core.get_medication(admin, med.id).unwrap().unwrap();
        assert_eq!(stored.stock, 8);
        assert_eq!(stored.batches[0].lot, "B");
        assert_eq!(stored.batches[0].expires_on, "2024-06-01");
    }

    #[test]
    fn test_insufficient_stock_message() {
        let (core, admin) = core_with_admin();
        let med = core.create_medication(admin.clone(), details("Amox")).unwrap();
        core.receive_batch(admin.clone(), med.id.clone(), "A".into(), "2024-01-01".into(), 20)
            .unwrap();

        let err = core
            .checkout(
                admin,
                FfiCheckout {
                    lines: vec![FfiSaleLine {
                        medication_id: med.id.clone(),
                        quantity: 100,
                    }],
                    customer: FfiCustomer::default(),
                    prescription_file_name: None,
                    prescription_file_url: None,
                },
            )
            .unwrap_err();

        match err {
            PharmacyError::InsufficientStock(msg) => assert!(msg.contains("short 80")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_is_invalid_input() {
        let (core, admin) = core_with_admin();
        let med = core.create_medication(admin.clone(), details("Amox")).unwrap();
        let err = core
            .receive_batch(admin, med.id, "A".into(), "01/02/2024".into(), 5)
            .unwrap_err();
        assert!(matches!(err, PharmacyError::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_actor() {
        let (core, _) = core_with_admin();
        assert!(matches!(
            core.list_medications("ghost".into()),
            Err(PharmacyError::NotFound(_))
        ));
    }

    #[test]
    fn test_clerk_forbidden_from_reports() {
        let (core, admin) = core_with_admin();
        let clerk = core
            .add_staff(admin.clone(), "Rui".into(), "rui@example.com".into(), "clerk".into())
            .unwrap();

        assert!(matches!(
            core.stock_report_json(clerk.id),
            Err(PharmacyError::Forbidden(_))
        ));
        assert!(core.stock_report_json(admin).unwrap().contains("low_stock"));
    }

    #[test]
    fn test_prescription_status_update() {
        let (core, admin) = core_with_admin();
        let created = core
            .create_prescription(
                admin.clone(),
                FfiPrescription {
                    id: String::new(),
                    doctor_id: None,
                    clinic_id: None,
                    patient_name: "Maria".into(),
                    items: vec!["Amox - 1 box".into()],
                    notes: String::new(),
                    file_name: String::new(),
                    file_url: String::new(),
                    status: "pending".into(),
                    sale_id: None,
                },
            )
            .unwrap();

        let mut edit = created.clone();
        edit.status = "Cancelled".into();
        let updated = core.update_prescription(admin.clone(), edit).unwrap();
        assert_eq!(updated.status, "cancelled");

        let mut bad = created;
        bad.status = "lost".into();
        assert!(matches!(
            core.update_prescription(admin, bad),
            Err(PharmacyError::InvalidInput(_))
        ));
    }
}
