//! Domain models for the pharmacy.

mod clinic;
mod medication;
mod prescription;
mod sale;
mod staff;

pub use clinic::*;
pub use medication::*;
pub use prescription::*;
pub use sale::*;
pub use staff::*;
