//! Single-document JSON store: `{"counter": <int>, "entries": [...]}`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{PvStore, StoreResult};
use crate::error::StoreError;
use crate::models::record::{Record, Status};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PvDocument {
    #[serde(default)]
    pub counter: i64,
    #[serde(default)]
    pub entries: Vec<Record>,
}

/// Document store backed by one file, rewritten atomically on every mutation.
pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Open the document at `path`, creating an empty one if it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
        };

        // Parse once up front so a corrupt file fails startup, not the first request.
        let doc = store.load().await?;
        if !tokio::fs::try_exists(&store.path).await? {
            store.save(&doc).await?;
            tracing::info!(path = %store.path.display(), "Created empty PV document");
        } else {
            tracing::info!(
                path = %store.path.display(),
                entries = doc.entries.len(),
                "Loaded PV document"
            );
        }

        Ok(store)
    }

    async fn load(&self) -> StoreResult<PvDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(PvDocument::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(PvDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, doc: &PvDocument) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Load, apply `f`, and write back while holding the write lock.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut PvDocument) -> StoreResult<T> + Send,
    ) -> StoreResult<T> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let out = f(&mut doc)?;
        self.save(&doc).await?;
        Ok(out)
    }
}

#[async_trait]
impl PvStore for JsonStore {
    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        let mut entries = self.load().await?.entries;
        entries.sort_by_key(|r| r.id);
        Ok(entries)
    }

    async fn list_by_status(&self, status: Status) -> StoreResult<Vec<Record>> {
        let mut entries = self.list_all().await?;
        entries.retain(|r| r.status == status);
        Ok(entries)
    }

    async fn find(&self, id: i64) -> StoreResult<Option<Record>> {
        let doc = self.load().await?;
        Ok(doc.entries.into_iter().find(|r| r.id == id))
    }

    async fn find_by(&self, date: &str, caidat: &str) -> StoreResult<Option<Record>> {
        let doc = self.load().await?;
        Ok(doc.entries.into_iter().find(|r| r.matches(date, caidat)))
    }

    async fn max_id(&self) -> StoreResult<Option<i64>> {
        let doc = self.load().await?;
        Ok(doc.entries.iter().map(|r| r.id).max())
    }

    async fn insert(&self, record: &Record) -> StoreResult<()> {
        let record = record.clone();
        self.mutate(move |doc| {
            if doc
                .entries
                .iter()
                .any(|r| r.id == record.id || r.matches(&record.date, &record.caidat))
            {
                return Err(StoreError::Conflict);
            }
            doc.entries.push(record);
            Ok(())
        })
        .await
    }

    async fn update(&self, record: &Record) -> StoreResult<bool> {
        let record = record.clone();
        self.mutate(move |doc| match doc.entries.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                Ok(true)
            }
            None => Ok(false),
        })
        .await
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.mutate(move |doc| {
            let before = doc.entries.len();
            doc.entries.retain(|r| r.id != id);
            Ok(doc.entries.len() != before)
        })
        .await
    }

    async fn get_counter(&self) -> StoreResult<i64> {
        Ok(self.load().await?.counter)
    }

    async fn set_counter(&self, value: i64) -> StoreResult<()> {
        self.mutate(move |doc| {
            doc.counter = value;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn open_creates_empty_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("pv.json");

        let store = JsonStore::open(&path).await.unwrap();
        assert_eq!(store.get_counter().await.unwrap(), 0);
        assert!(store.list_all().await.unwrap().is_empty());

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"counter": 0, "entries": []}));
    }

    #[tokio::test]
    async fn open_rejects_corrupt_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pv.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            JsonStore::open(&path).await,
            Err(StoreError::Serde(_))
        ));
    }

    #[tokio::test]
    async fn mutations_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pv.json");

        {
            let store = JsonStore::open(&path).await.unwrap();
            store.insert(&Record::new(1, "2024-01-01", "C1")).await.unwrap();
            let mut second = Record::new(2, "2024-01-02", "C2");
            store.insert(&second).await.unwrap();
            second.status = Status::Processed;
            assert!(store.update(&second).await.unwrap());
            store.set_counter(17).await.unwrap();
        }

        let store = JsonStore::open(&path).await.unwrap();
        assert_eq!(store.get_counter().await.unwrap(), 17);
        assert_eq!(store.max_id().await.unwrap(), Some(2));
        let processed = store.list_by_status(Status::Processed).await.unwrap();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].caidat, "C2");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn lookups_signal_absence_with_none() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("pv.json")).await.unwrap();
        store.insert(&Record::new(1, "2024-01-01", "C1")).await.unwrap();

        assert!(store.find(9).await.unwrap().is_none());
        assert!(store.find_by("2024-01-01", "C2").await.unwrap().is_none());
        assert_eq!(
            store.find_by("2024-01-01", "C1").await.unwrap().map(|r| r.id),
            Some(1)
        );
        assert!(!store.delete(9).await.unwrap());
        assert!(!store.update(&Record::new(9, "x", "y")).await.unwrap());
    }

    #[tokio::test]
    async fn insert_refuses_taken_pair_or_id() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("pv.json")).await.unwrap();
        store.insert(&Record::new(1, "2024-01-01", "C1")).await.unwrap();

        assert!(matches!(
            store.insert(&Record::new(2, "2024-01-01", "C1")).await,
            Err(StoreError::Conflict)
        ));
        assert!(matches!(
            store.insert(&Record::new(1, "2024-01-05", "C5")).await,
            Err(StoreError::Conflict)
        ));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn legacy_document_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pv.json");
        std::fs::write(
            &path,
            r#"{"counter": 42, "entries": [
                {"id": 3, "date": "2023-12-01", "caidat": "C3", "status": "en cours"},
                {"id": 1, "date": "2023-11-01", "caidat": "C1", "status": "traité"}
            ]}"#,
        )
        .unwrap();

        let store = JsonStore::open(&path).await.unwrap();
        let ids: Vec<i64> = store.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.get_counter().await.unwrap(), 42);
        assert_eq!(
            store.find(3).await.unwrap().map(|r| r.status),
            Some(Status::InProgress)
        );
    }
}
