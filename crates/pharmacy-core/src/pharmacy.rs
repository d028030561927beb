//! Service facade.
//!
//! [`Pharmacy`] is the single entry point used by the FFI layer: every
//! method takes the acting staff member, checks the [`Policy`], then
//! delegates to the ledger, the database or the report builders.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{info, warn};

use crate::authz::{authorize, Action, AuthzError, Policy, Resource, RolePolicy};
use crate::config::PharmacyConfig;
use crate::db::{Database, DbError};
use crate::ledger::{Ledger, LedgerError};
use crate::models::{
    Batch, Clinic, CustomerInfo, Doctor, Medication, MedicationDetails, NewBatch, Prescription,
    PrescriptionAttachment, PrescriptionStatus, Role, Sale, SaleLine, SaleRequest, StaffMember,
};
use crate::reports::{
    self, ClinicPrescriptions, DoctorPrescriptions, MedicationSales, StaffSales, StockStatistics,
};

/// Facade errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

type SharedDb = Arc<Mutex<Database>>;

/// Pharmacy back office over one database.
pub struct Pharmacy {
    db: SharedDb,
    ledger: Ledger<SharedDb>,
    policy: Box<dyn Policy>,
    config: PharmacyConfig,
}

impl Pharmacy {
    /// Open the database named by the config (in memory when unset).
    pub fn open(config: PharmacyConfig) -> ServiceResult<Self> {
        let db = match &config.database_path {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        info!(
            path = ?config.database_path,
            low_stock_threshold = config.low_stock_threshold,
            "pharmacy opened"
        );
        Ok(Self::new(db, config))
    }

    /// Wrap an open database with the default role policy.
    pub fn new(db: Database, config: PharmacyConfig) -> Self {
        let db = Arc::new(Mutex::new(db));
        Self {
            ledger: Ledger::new(Arc::clone(&db)),
            db,
            policy: Box::new(RolePolicy),
            config,
        }
    }

    /// Replace the authorization policy.
    pub fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &PharmacyConfig {
        &self.config
    }

    fn db(&self) -> ServiceResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|e| ServiceError::Database(DbError::LockPoisoned(e.to_string())))
    }

    /// Resolve the staff member acting on a call.
    pub fn staff_member(&self, id: &str) -> ServiceResult<StaffMember> {
        self.db()?
            .get_staff(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("staff member {}", id)))
    }

    fn check(&self, user: &StaffMember, action: Action, resource: Resource) -> ServiceResult<()> {
        authorize(self.policy.as_ref(), user, action, resource).map_err(|e| {
            warn!(staff_id = %user.id, role = %user.role, "{}", e);
            ServiceError::from(e)
        })
    }

    // ========================================================================
    // Staff
    // ========================================================================

    /// Register the first administrator. Fails once any staff exists.
    pub fn bootstrap_admin(&self, name: &str, email: &str) -> ServiceResult<StaffMember> {
        let db = self.db()?;
        if !db.list_staff()?.is_empty() {
            return Err(ServiceError::InvalidInput("staff directory is not empty".into()));
        }
        let admin = new_staff(name, email, Role::Admin)?;
        db.insert_staff(&admin)?;
        info!(staff_id = %admin.id, "administrator bootstrapped");
        Ok(admin)
    }

    pub fn add_staff(&self, user: &StaffMember, name: &str, email: &str, role: Role) -> ServiceResult<StaffMember> {
        self.check(user, Action::Create, Resource::Staff)?;
        let member = new_staff(name, email, role)?;
        self.db()?.insert_staff(&member)?;
        Ok(member)
    }

    pub fn get_staff(&self, user: &StaffMember, id: &str) -> ServiceResult<Option<StaffMember>> {
        self.check(user, Action::View, Resource::Staff)?;
        Ok(self.db()?.get_staff(id)?)
    }

    pub fn list_staff(&self, user: &StaffMember) -> ServiceResult<Vec<StaffMember>> {
        self.check(user, Action::View, Resource::Staff)?;
        Ok(self.db()?.list_staff()?)
    }

    pub fn set_staff_role(&self, user: &StaffMember, id: &str, role: Role) -> ServiceResult<()> {
        self.check(user, Action::Update, Resource::Staff)?;
        if !self.db()?.update_staff_role(id, role)? {
            return Err(ServiceError::NotFound(format!("staff member {}", id)));
        }
        Ok(())
    }

    pub fn remove_staff(&self, user: &StaffMember, id: &str) -> ServiceResult<()> {
        self.check(user, Action::Delete, Resource::Staff)?;
        if !self.db()?.delete_staff(id)? {
            return Err(ServiceError::NotFound(format!("staff member {}", id)));
        }
        Ok(())
    }

    // ========================================================================
    // Medications & stock
    // ========================================================================

    pub fn create_medication(&self, user: &StaffMember, details: MedicationDetails) -> ServiceResult<Medication> {
        self.check(user, Action::Create, Resource::Medication)?;
        require_details(&details)?;

        let medication = Medication::new(details);
        self.db()?.insert_medication(&medication)?;
        info!(medication_id = %medication.id, name = %medication.name, "medication created");
        Ok(medication)
    }

    pub fn get_medication(&self, user: &StaffMember, id: &str) -> ServiceResult<Option<Medication>> {
        self.check(user, Action::View, Resource::Medication)?;
        Ok(self.db()?.get_medication(id)?)
    }

    pub fn list_medications(&self, user: &StaffMember) -> ServiceResult<Vec<Medication>> {
        self.check(user, Action::View, Resource::Medication)?;
        Ok(self.db()?.list_medications()?)
    }

    pub fn search_medications(&self, user: &StaffMember, query: &str, limit: usize) -> ServiceResult<Vec<Medication>> {
        self.check(user, Action::View, Resource::Medication)?;
        Ok(self.db()?.search_medications(query, limit)?)
    }

    /// Edit catalog fields. Stock is never touched.
    pub fn update_medication(
        &self,
        user: &StaffMember,
        id: &str,
        details: MedicationDetails,
    ) -> ServiceResult<Medication> {
        self.check(user, Action::Update, Resource::Medication)?;
        require_details(&details)?;

        let db = self.db()?;
        if !db.update_medication_details(id, &details)? {
            return Err(ServiceError::NotFound(format!("medication {}", id)));
        }
        db.get_medication(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("medication {}", id)))
    }

    pub fn delete_medication(&self, user: &StaffMember, id: &str) -> ServiceResult<()> {
        self.check(user, Action::Delete, Resource::Medication)?;

        let deleted = self.ledger.retire(id, || -> ServiceResult<bool> {
            Ok(self.db()?.delete_medication(id)?)
        })?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("medication {}", id)));
        }
        info!(medication_id = id, "medication deleted");
        Ok(())
    }

    /// Receive a batch into stock.
    pub fn receive_batch(&self, user: &StaffMember, medication_id: &str, batch: NewBatch) -> ServiceResult<Batch> {
        self.check(user, Action::Create, Resource::Batch)?;
        Ok(self.ledger.add_batch(medication_id, batch)?)
    }

    /// Units on hand.
    pub fn stock_level(&self, user: &StaffMember, medication_id: &str) -> ServiceResult<u64> {
        self.check(user, Action::View, Resource::Medication)?;
        Ok(self.ledger.total_available(medication_id)?)
    }

    // ========================================================================
    // Sales
    // ========================================================================

    /// Finalize a checkout run by `user`.
    pub fn checkout(
        &self,
        user: &StaffMember,
        lines: Vec<SaleLine>,
        customer: CustomerInfo,
        prescription: Option<PrescriptionAttachment>,
    ) -> ServiceResult<Sale> {
        self.check(user, Action::Create, Resource::Sale)?;

        let mut request = SaleRequest::new(lines, &user.id, &user.name);
        request.customer = customer;
        request.prescription = prescription;

        Ok(self.ledger.consume_sale(&request)?)
    }

    pub fn get_sale(&self, user: &StaffMember, id: &str) -> ServiceResult<Option<Sale>> {
        self.check(user, Action::View, Resource::Sale)?;
        Ok(self.db()?.get_sale(id)?)
    }

    pub fn list_sales(&self, user: &StaffMember) -> ServiceResult<Vec<Sale>> {
        self.check(user, Action::View, Resource::Sale)?;
        Ok(self.db()?.list_sales()?)
    }

    // ========================================================================
    // Prescriptions
    // ========================================================================

    /// Register a prescription. It always starts pending and unlinked.
    pub fn create_prescription(&self, user: &StaffMember, mut prescription: Prescription) -> ServiceResult<Prescription> {
        self.check(user, Action::Create, Resource::Prescription)?;
        if prescription.patient_name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("patient name is required".into()));
        }

        prescription.status = PrescriptionStatus::Pending;
        prescription.sale_id = None;
        self.db()?.insert_prescription(&prescription)?;
        Ok(prescription)
    }

    /// Edit a prescription. The sale link is kept from the stored record and
    /// the status may only move between pending and cancelled.
    pub fn update_prescription(&self, user: &StaffMember, mut prescription: Prescription) -> ServiceResult<Prescription> {
        self.check(user, Action::Update, Resource::Prescription)?;

        let db = self.db()?;
        let stored = db
            .get_prescription(&prescription.id)?
            .ok_or_else(|| ServiceError::NotFound(format!("prescription {}", prescription.id)))?;
        if !stored.status.can_change_to(prescription.status) {
            return Err(ServiceError::InvalidInput(format!(
                "prescription status cannot change from {} to {}",
                stored.status.as_str(),
                prescription.status.as_str()
            )));
        }

        prescription.sale_id = stored.sale_id;
        prescription.created_at = stored.created_at;
        prescription.touch();
        if !db.update_prescription(&prescription)? {
            return Err(ServiceError::NotFound(format!("prescription {}", prescription.id)));
        }
        Ok(prescription)
    }

    pub fn get_prescription(&self, user: &StaffMember, id: &str) -> ServiceResult<Option<Prescription>> {
        self.check(user, Action::View, Resource::Prescription)?;
        Ok(self.db()?.get_prescription(id)?)
    }

    pub fn list_prescriptions(&self, user: &StaffMember) -> ServiceResult<Vec<Prescription>> {
        self.check(user, Action::View, Resource::Prescription)?;
        Ok(self.db()?.list_prescriptions()?)
    }

    pub fn prescriptions_for_sale(&self, user: &StaffMember, sale_id: &str) -> ServiceResult<Vec<Prescription>> {
        self.check(user, Action::View, Resource::Prescription)?;
        Ok(self.db()?.list_prescriptions_for_sale(sale_id)?)
    }

    // ========================================================================
    // Clinics & doctors
    // ========================================================================

    pub fn create_clinic(&self, user: &StaffMember, name: &str, address: &str) -> ServiceResult<Clinic> {
        self.check(user, Action::Create, Resource::Clinic)?;
        require("clinic name", name)?;
        require("clinic address", address)?;

        let clinic = Clinic::new(name.trim().to_string(), address.trim().to_string());
        self.db()?.insert_clinic(&clinic)?;
        Ok(clinic)
    }

    pub fn update_clinic(&self, user: &StaffMember, mut clinic: Clinic) -> ServiceResult<Clinic> {
        self.check(user, Action::Update, Resource::Clinic)?;
        require("clinic name", &clinic.name)?;
        require("clinic address", &clinic.address)?;

        clinic.updated_at = chrono::Utc::now().to_rfc3339();
        if !self.db()?.update_clinic(&clinic)? {
            return Err(ServiceError::NotFound(format!("clinic {}", clinic.id)));
        }
        Ok(clinic)
    }

    pub fn delete_clinic(&self, user: &StaffMember, id: &str) -> ServiceResult<()> {
        self.check(user, Action::Delete, Resource::Clinic)?;
        if !self.db()?.delete_clinic(id)? {
            return Err(ServiceError::NotFound(format!("clinic {}", id)));
        }
        Ok(())
    }

    pub fn get_clinic(&self, user: &StaffMember, id: &str) -> ServiceResult<Option<Clinic>> {
        self.check(user, Action::View, Resource::Clinic)?;
        Ok(self.db()?.get_clinic(id)?)
    }

    pub fn list_clinics(&self, user: &StaffMember) -> ServiceResult<Vec<Clinic>> {
        self.check(user, Action::View, Resource::Clinic)?;
        Ok(self.db()?.list_clinics()?)
    }

    pub fn create_doctor(
        &self,
        user: &StaffMember,
        name: &str,
        license: &str,
        clinic_id: Option<String>,
    ) -> ServiceResult<Doctor> {
        self.check(user, Action::Create, Resource::Doctor)?;
        require("doctor name", name)?;
        require("doctor license", license)?;

        let doctor = Doctor::new(name.trim().to_string(), license.trim().to_string(), clinic_id);
        self.db()?.insert_doctor(&doctor)?;
        Ok(doctor)
    }

    pub fn update_doctor(&self, user: &StaffMember, mut doctor: Doctor) -> ServiceResult<Doctor> {
        self.check(user, Action::Update, Resource::Doctor)?;
        require("doctor name", &doctor.name)?;
        require("doctor license", &doctor.license)?;

        doctor.updated_at = chrono::Utc::now().to_rfc3339();
        if !self.db()?.update_doctor(&doctor)? {
            return Err(ServiceError::NotFound(format!("doctor {}", doctor.id)));
        }
        Ok(doctor)
    }

    pub fn delete_doctor(&self, user: &StaffMember, id: &str) -> ServiceResult<()> {
        self.check(user, Action::Delete, Resource::Doctor)?;
        if !self.db()?.delete_doctor(id)? {
            return Err(ServiceError::NotFound(format!("doctor {}", id)));
        }
        Ok(())
    }

    pub fn get_doctor(&self, user: &StaffMember, id: &str) -> ServiceResult<Option<Doctor>> {
        self.check(user, Action::View, Resource::Doctor)?;
        Ok(self.db()?.get_doctor(id)?)
    }

    pub fn list_doctors(&self, user: &StaffMember) -> ServiceResult<Vec<Doctor>> {
        self.check(user, Action::View, Resource::Doctor)?;
        Ok(self.db()?.list_doctors()?)
    }

    // ========================================================================
    // Reports
    // ========================================================================

    pub fn most_sold_report(&self, user: &StaffMember) -> ServiceResult<Vec<MedicationSales>> {
        self.check(user, Action::View, Resource::Report)?;
        let sales = self.db()?.list_sales()?;
        Ok(reports::most_sold(&sales))
    }

    pub fn sales_by_staff_report(&self, user: &StaffMember) -> ServiceResult<Vec<StaffSales>> {
        self.check(user, Action::View, Resource::Report)?;
        let sales = self.db()?.list_sales()?;
        Ok(reports::sales_by_staff(&sales))
    }

    pub fn top_prescribers_report(&self, user: &StaffMember) -> ServiceResult<Vec<DoctorPrescriptions>> {
        self.check(user, Action::View, Resource::Report)?;
        let db = self.db()?;
        Ok(reports::top_prescribers(&db.list_prescriptions()?, &db.list_doctors()?))
    }

    pub fn clinics_report(&self, user: &StaffMember) -> ServiceResult<Vec<ClinicPrescriptions>> {
        self.check(user, Action::View, Resource::Report)?;
        let db = self.db()?;
        Ok(reports::clinics_by_prescriptions(&db.list_prescriptions()?, &db.list_clinics()?))
    }

    /// Stock figures against the configured low-stock threshold.
    pub fn stock_report(&self, user: &StaffMember) -> ServiceResult<StockStatistics> {
        self.check(user, Action::View, Resource::Report)?;
        let medications = self.db()?.list_medications()?;
        Ok(reports::stock_statistics(&medications, self.config.low_stock_threshold))
    }
}

fn require(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn require_details(details: &MedicationDetails) -> ServiceResult<()> {
    match details.missing_field() {
        Some(field) => Err(ServiceError::InvalidInput(format!("medication {} is required", field))),
        None => Ok(()),
    }
}

fn new_staff(name: &str, email: &str, role: Role) -> ServiceResult<StaffMember> {
    require("staff name", name)?;
    require("staff email", email)?;
    Ok(StaffMember::new(name.trim().to_string(), email.trim().to_string(), role))
}
