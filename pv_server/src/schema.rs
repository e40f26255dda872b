//! Diesel table definitions for the relational store.
//!
//! Tables: pvs (one row per record), counter (single row, id = 1).

diesel::table! {
    pvs (id) {
        id -> Int8,
        date -> Varchar,
        caidat -> Varchar,
        status -> Varchar,
    }
}

diesel::table! {
    counter (id) {
        id -> Int4,
        value -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(pvs, counter);
