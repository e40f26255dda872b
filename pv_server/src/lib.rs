//! Gestion PV — record tracking for dated administrative records.
//!
//! Two configured users maintain a list of PV records, each identified by its
//! (date, caidat) pair and carrying a processing status, plus a manually
//! entered counter. Anonymous visitors see the counter and the processed
//! records.
//!
//! Storage is either a JSON document or PostgreSQL, behind [`store::PvStore`].

pub mod config;
pub mod error;
pub mod metrics;
pub mod migration;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod session;
pub mod store;
