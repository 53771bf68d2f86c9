pub mod auth;
pub mod clinic;
pub mod dashboard;
pub mod manager;
pub mod scheduling;
pub mod tenancy;
