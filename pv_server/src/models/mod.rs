//! PV data models — records, their status, and the counter row.

pub mod counter;
pub mod record;
