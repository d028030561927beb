//! Role-based authorization.
//!
//! Every service operation is described as an [`Action`] on a [`Resource`]
//! and checked against a [`Policy`] before it runs. [`RolePolicy`] is the
//! default table; callers may supply their own policy.

use serde::Serialize;
use thiserror::Error;

use crate::models::{Role, StaffMember};

/// What the caller wants to do.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

/// What the caller wants to do it to.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Resource {
    Medication,
    /// Receiving stock into a medication
    Batch,
    Prescription,
    Doctor,
    Clinic,
    Sale,
    Report,
    Staff,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Medication => "medication",
            Resource::Batch => "batch",
            Resource::Prescription => "prescription",
            Resource::Doctor => "doctor",
            Resource::Clinic => "clinic",
            Resource::Sale => "sale",
            Resource::Report => "report",
            Resource::Staff => "staff",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' may not {} {}", .action.as_str(), .resource.as_str())]
    Forbidden {
        role: Role,
        action: Action,
        resource: Resource,
    },
}

/// Capability check.
pub trait Policy: Send + Sync {
    fn can(&self, user: &StaffMember, action: Action, resource: Resource) -> bool;
}

/// The pharmacy's role table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl Policy for RolePolicy {
    fn can(&self, user: &StaffMember, action: Action, resource: Resource) -> bool {
        use Role::*;

        let role = user.role;
        let is = |allowed: &[Role]| allowed.contains(&role);

        match (resource, action) {
            (Resource::Report, _) => is(&[Admin, Manager]),
            (Resource::Staff, _) => is(&[Admin]),
            (_, Action::View) => true,
            (Resource::Sale, Action::Create) => true,
            (Resource::Sale, _) => is(&[Admin, Manager]),
            (Resource::Medication, Action::Delete) => is(&[Admin, Manager]),
            (Resource::Medication | Resource::Batch | Resource::Prescription, _) => {
                is(&[Pharmacist, Admin, Manager])
            }
            (Resource::Doctor | Resource::Clinic, _) => is(&[Admin, Manager]),
        }
    }
}

/// Check a capability, for use with `?`.
pub fn authorize(
    policy: &dyn Policy,
    user: &StaffMember,
    action: Action,
    resource: Resource,
) -> Result<(), AuthzError> {
    if policy.can(user, action, resource) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: user.role,
            action,
            resource,
        })
    }
}
