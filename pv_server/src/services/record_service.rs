//! Record rules: (date, caidat) uniqueness, id assignment, status changes,
//! deletion, and the counter.

use serde::Serialize;

use crate::error::{PvError, StoreError};
use crate::models::record::{Record, Status};
use crate::store::PvStore;

/// Counter plus the processed records, as shown to anonymous visitors.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSnapshot {
    pub counter: i64,
    pub processed: Vec<Record>,
}

/// Counter plus every record, as shown on the admin panel.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSnapshot {
    pub counter: i64,
    pub entries: Vec<Record>,
}

/// Create a record for a new (date, caidat) pair.
///
/// Both values are stored exactly as given; blank values are rejected.
pub async fn add(store: &dyn PvStore, date: &str, caidat: &str) -> Result<Record, PvError> {
    if date.trim().is_empty() || caidat.trim().is_empty() {
        return Err(PvError::InvalidInput(
            "Both date and caidat are required.".to_string(),
        ));
    }

    let duplicate = || PvError::Duplicate {
        date: date.to_string(),
        caidat: caidat.to_string(),
    };

    if store.find_by(date, caidat).await?.is_some() {
        return Err(duplicate());
    }

    let id = store.max_id().await?.map_or(1, |max| max + 1);
    let record = Record::new(id, date, caidat);

    match store.insert(&record).await {
        Ok(()) => {}
        // Lost a race with a concurrent add.
        Err(StoreError::Conflict) => return Err(duplicate()),
        Err(e) => return Err(e.into()),
    }

    crate::metrics::record_created();
    tracing::info!(record_id = id, date = %record.date, caidat = %record.caidat, "Record created");

    Ok(record)
}

/// Change the status of an existing record.
pub async fn set_status(store: &dyn PvStore, id: i64, status: Status) -> Result<Record, PvError> {
    let mut record = store.find(id).await?.ok_or(PvError::NotFound(id))?;
    let previous = record.status;
    record.status = status;

    if !store.update(&record).await? {
        return Err(PvError::NotFound(id));
    }

    crate::metrics::status_changed(status);
    tracing::info!(record_id = id, from = %previous, to = %status, "Record status updated");

    Ok(record)
}

/// Delete a record. Deleting an unknown id is a successful no-op.
///
/// Returns whether a record was actually removed.
pub async fn remove(store: &dyn PvStore, id: i64) -> Result<bool, PvError> {
    let removed = store.delete(id).await?;
    if removed {
        crate::metrics::record_deleted();
        tracing::info!(record_id = id, "Record deleted");
    } else {
        tracing::debug!(record_id = id, "Delete of unknown record ignored");
    }
    Ok(removed)
}

/// Overwrite the counter from user input.
pub async fn set_counter(store: &dyn PvStore, raw: &str) -> Result<i64, PvError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| PvError::InvalidInput("Please enter a valid number.".to_string()))?;

    store.set_counter(value).await?;

    crate::metrics::counter_updated();
    tracing::info!(counter = value, "Counter updated");

    Ok(value)
}

pub async fn public_snapshot(store: &dyn PvStore) -> Result<PublicSnapshot, PvError> {
    Ok(PublicSnapshot {
        counter: store.get_counter().await?,
        processed: store.list_by_status(Status::Processed).await?,
    })
}

pub async fn admin_snapshot(store: &dyn PvStore) -> Result<AdminSnapshot, PvError> {
    Ok(AdminSnapshot {
        counter: store.get_counter().await?,
        entries: store.list_all().await?,
    })
}
