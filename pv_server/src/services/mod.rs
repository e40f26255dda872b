//! PV services — record rules and credential checks.

pub mod auth_service;
pub mod record_service;
