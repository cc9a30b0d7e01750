//! Company settings: the singleton `companyInfo` record

pub mod manager;
pub mod models;

pub use manager::CompanySettings;
pub use models::*;
