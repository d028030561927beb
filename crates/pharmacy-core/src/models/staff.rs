//! Staff directory models.

use serde::{Deserialize, Serialize};

/// Staff role, used by the authorization policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Pharmacist,
    Admin,
    Manager,
    Clerk,
}

/// A member of staff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffMember {
    /// Local UUID
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pharmacist => "pharmacist",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Clerk => "clerk",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pharmacist" => Some(Role::Pharmacist),
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "clerk" => Some(Role::Clerk),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StaffMember {
    pub fn new(name: String, email: String, role: Role) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            role,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
