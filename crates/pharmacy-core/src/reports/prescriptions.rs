//! Prescription aggregates.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::UNKNOWN_NAME;
use crate::models::{Clinic, Doctor, Prescription};

/// Prescriptions written by one doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorPrescriptions {
    pub doctor_id: String,
    pub doctor_name: String,
    /// Registration number; empty when the doctor was deleted
    pub license: String,
    pub prescription_count: u64,
}

/// Prescriptions issued by one clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClinicPrescriptions {
    pub clinic_id: String,
    pub clinic_name: String,
    pub address: String,
    pub prescription_count: u64,
}

/// Doctors ranked by prescriptions written. Prescriptions without a doctor
/// are not counted.
pub fn top_prescribers(prescriptions: &[Prescription], doctors: &[Doctor]) -> Vec<DoctorPrescriptions> {
    let known: HashMap<&str, &Doctor> = doctors.iter().map(|d| (d.id.as_str(), d)).collect();
    let mut by_id: BTreeMap<&str, DoctorPrescriptions> = BTreeMap::new();

    for doctor_id in prescriptions.iter().filter_map(|p| p.doctor_id.as_deref()) {
        let entry = by_id.entry(doctor_id).or_insert_with(|| {
            let doctor = known.get(doctor_id);
            DoctorPrescriptions {
                doctor_id: doctor_id.to_string(),
                doctor_name: doctor.map_or_else(|| UNKNOWN_NAME.to_string(), |d| d.name.clone()),
                license: doctor.map(|d| d.license.clone()).unwrap_or_default(),
                prescription_count: 0,
            }
        });
        entry.prescription_count += 1;
    }

    let mut rows: Vec<_> = by_id.into_values().collect();
    rows.sort_by(|a, b| b.prescription_count.cmp(&a.prescription_count));
    rows
}

/// Clinics ranked by prescriptions issued.
pub fn clinics_by_prescriptions(
    prescriptions: &[Prescription],
    clinics: &[Clinic],
) -> Vec<ClinicPrescriptions> {
    let known: HashMap<&str, &Clinic> = clinics.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut by_id: BTreeMap<&str, ClinicPrescriptions> = BTreeMap::new();

    for clinic_id in prescriptions.iter().filter_map(|p| p.clinic_id.as_deref()) {
        let entry = by_id.entry(clinic_id).or_insert_with(|| {
            let clinic = known.get(clinic_id);
            ClinicPrescriptions {
                clinic_id: clinic_id.to_string(),
                clinic_name: clinic.map_or_else(|| UNKNOWN_NAME.to_string(), |c| c.name.clone()),
                address: clinic.map(|c| c.address.clone()).unwrap_or_default(),
                prescription_count: 0,
            }
        });
        entry.prescription_count += 1;
    }

    let mut rows: Vec<_> = by_id.into_values().collect();
    rows.sort_by(|a, b| b.prescription_count.cmp(&a.prescription_count));
    rows
}
