//! PostgreSQL store (diesel-async over a deadpool connection pool).

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use super::{PvStore, StoreResult};
use crate::error::StoreError;
use crate::models::counter::{CounterRow, COUNTER_ROW_ID};
use crate::models::record::{PvRow, Record, Status};
use crate::schema::{counter, pvs};

pub type DieselPool = Pool<AsyncPgConnection>;

pub struct PgStore {
    pool: DieselPool,
}

impl PgStore {
    /// Build the pool. Connections are established lazily.
    pub fn connect(database_url: &str, max_connections: usize) -> StoreResult<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager)
            .max_size(max_connections)
            .build()
            .map_err(|e| StoreError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Create the tables if needed.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        let mut conn = self.conn().await?;
        tracing::info!("Running PV schema migration...");
        crate::migration::run_migration(&mut *conn).await?;
        tracing::info!("PV schema migration completed.");
        Ok(())
    }

    async fn conn(&self) -> StoreResult<Object<AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

fn into_records(rows: Vec<PvRow>) -> StoreResult<Vec<Record>> {
    rows.into_iter()
        .map(|row| Record::try_from(row).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl PvStore for PgStore {
    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        let mut conn = self.conn().await?;
        let rows = pvs::table
            .order(pvs::id.asc())
            .select(PvRow::as_select())
            .load::<PvRow>(&mut *conn)
            .await?;
        into_records(rows)
    }

    async fn list_by_status(&self, status: Status) -> StoreResult<Vec<Record>> {
        let mut conn = self.conn().await?;
        let rows = pvs::table
            .filter(pvs::status.eq(status.as_str()))
            .order(pvs::id.asc())
            .select(PvRow::as_select())
            .load::<PvRow>(&mut *conn)
            .await?;
        into_records(rows)
    }

    async fn find(&self, id: i64) -> StoreResult<Option<Record>> {
        let mut conn = self.conn().await?;
        let row = pvs::table
            .find(id)
            .select(PvRow::as_select())
            .first::<PvRow>(&mut *conn)
            .await
            .optional()?;
        Ok(row.map(Record::try_from).transpose()?)
    }

    async fn find_by(&self, date: &str, caidat: &str) -> StoreResult<Option<Record>> {
        let mut conn = self.conn().await?;
        let row = pvs::table
            .filter(pvs::date.eq(date))
            .filter(pvs::caidat.eq(caidat))
            .select(PvRow::as_select())
            .first::<PvRow>(&mut *conn)
            .await
            .optional()?;
        Ok(row.map(Record::try_from).transpose()?)
    }

    async fn max_id(&self) -> StoreResult<Option<i64>> {
        let mut conn = self.conn().await?;
        let max = pvs::table
            .select(diesel::dsl::max(pvs::id))
            .first::<Option<i64>>(&mut *conn)
            .await?;
        Ok(max)
    }

    async fn insert(&self, record: &Record) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let result = diesel::insert_into(pvs::table)
            .values(PvRow::from(record))
            .execute(&mut *conn)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, record: &Record) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(pvs::table.find(record.id))
            .set((
                pvs::date.eq(&record.date),
                pvs::caidat.eq(&record.caidat),
                pvs::status.eq(record.status.as_str()),
            ))
            .execute(&mut *conn)
            .await?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(pvs::table.find(id))
            .execute(&mut *conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn get_counter(&self) -> StoreResult<i64> {
        let mut conn = self.conn().await?;
        let value = counter::table
            .find(COUNTER_ROW_ID)
            .select(counter::value)
            .first::<i64>(&mut *conn)
            .await
            .optional()?;

        match value {
            Some(v) => Ok(v),
            None => {
                diesel::insert_into(counter::table)
                    .values(CounterRow::new(0))
                    .on_conflict_do_nothing()
                    .execute(&mut *conn)
                    .await?;
                Ok(0)
            }
        }
    }

    async fn set_counter(&self, value: i64) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        diesel::insert_into(counter::table)
            .values(CounterRow::new(value))
            .on_conflict(counter::id)
            .do_update()
            .set(counter::value.eq(value))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
