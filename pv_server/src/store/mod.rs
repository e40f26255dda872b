//! Persistence backends for records and the counter.
//!
//! Both backends honor the same contract: lookups return `None` on a miss,
//! and every mutation is durable before the call returns.

pub mod json;
pub mod postgres;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::record::{Record, Status};

pub use json::JsonStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PvStore: Send + Sync {
    /// All records, ordered by id.
    async fn list_all(&self) -> StoreResult<Vec<Record>>;

    /// Records with the given status, ordered by id.
    async fn list_by_status(&self, status: Status) -> StoreResult<Vec<Record>>;

    async fn find(&self, id: i64) -> StoreResult<Option<Record>>;

    async fn find_by(&self, date: &str, caidat: &str) -> StoreResult<Option<Record>>;

    /// Highest id in use, `None` for an empty store.
    async fn max_id(&self) -> StoreResult<Option<i64>>;

    /// Persist a record whose id has already been assigned.
    ///
    /// Fails with [`StoreError::Conflict`] if the id or the (date, caidat)
    /// pair is already taken.
    async fn insert(&self, record: &Record) -> StoreResult<()>;

    /// Overwrite the record with the same id. Returns `false` if it is gone.
    async fn update(&self, record: &Record) -> StoreResult<bool>;

    /// Returns `true` if a record was removed.
    async fn delete(&self, id: i64) -> StoreResult<bool>;

    /// Current counter value, initialized to 0 when absent.
    async fn get_counter(&self) -> StoreResult<i64>;

    async fn set_counter(&self, value: i64) -> StoreResult<()>;
}
