//! Referring clinics and prescribing doctors.

use serde::{Deserialize, Serialize};

/// A referring health unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clinic {
    /// Local UUID
    pub id: String,
    pub name: String,
    pub address: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A prescribing doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    /// Local UUID
    pub id: String,
    pub name: String,
    /// Professional registration number
    pub license: String,
    /// Clinic the doctor works at
    pub clinic_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Clinic {
    pub fn new(name: String, address: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            address,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl Doctor {
    pub fn new(name: String, license: String, clinic_id: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            license,
            clinic_id,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
