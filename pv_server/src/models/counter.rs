//! counter — single-row table holding the manually entered total.

use diesel::prelude::*;

use crate::schema::counter;

/// Primary key of the only counter row.
pub const COUNTER_ROW_ID: i32 = 1;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = counter)]
pub struct CounterRow {
    pub id: i32,
    pub value: i64,
}

impl CounterRow {
    pub fn new(value: i64) -> Self {
        Self {
            id: COUNTER_ROW_ID,
            value,
        }
    }
}
