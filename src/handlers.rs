// src/handlers.rs

pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod patients;
pub mod procedures;
pub mod users;
