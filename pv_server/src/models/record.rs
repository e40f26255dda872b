//! pvs — a dated administrative record identified by its (date, caidat) pair.

use std::fmt;
use std::str::FromStr;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::pvs;

/// Processing state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[serde(alias = "traité")]
    Processed,
    #[serde(alias = "en cours")]
    InProgress,
    #[default]
    #[serde(alias = "non traité")]
    NotProcessed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Processed, Status::InProgress, Status::NotProcessed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Processed => "processed",
            Status::InProgress => "in_progress",
            Status::NotProcessed => "not_processed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    /// Accepts the canonical names as well as the labels stored by earlier
    /// deployments (`traité`, `en cours`, `non traité`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "processed" | "traité" => Ok(Status::Processed),
            "in_progress" | "en cours" => Ok(Status::InProgress),
            "not_processed" | "non traité" => Ok(Status::NotProcessed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A tracked PV entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub date: String,
    pub caidat: String,
    #[serde(default)]
    pub status: Status,
}

impl Record {
    pub fn new(id: i64, date: impl Into<String>, caidat: impl Into<String>) -> Self {
        Self {
            id,
            date: date.into(),
            caidat: caidat.into(),
            status: Status::default(),
        }
    }

    pub fn matches(&self, date: &str, caidat: &str) -> bool {
        self.date == date && self.caidat == caidat
    }
}

/// Row shape of the `pvs` table; status is stored as text.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = pvs)]
pub struct PvRow {
    pub id: i64,
    pub date: String,
    pub caidat: String,
    pub status: String,
}

impl TryFrom<PvRow> for Record {
    type Error = ParseStatusError;

    fn try_from(row: PvRow) -> Result<Self, Self::Error> {
        Ok(Record {
            id: row.id,
            date: row.date,
            caidat: row.caidat,
            status: row.status.parse()?,
        })
    }
}

impl From<&Record> for PvRow {
    fn from(record: &Record) -> Self {
        PvRow {
            id: record.id,
            date: record.date.clone(),
            caidat: record.caidat.clone(),
            status: record.status.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_canonical_and_legacy_labels() {
        assert_eq!("processed".parse::<Status>(), Ok(Status::Processed));
        assert_eq!("en cours".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!(" non traité ".parse::<Status>(), Ok(Status::NotProcessed));
        assert_eq!(
            "archived".parse::<Status>(),
            Err(ParseStatusError("archived".to_string()))
        );
    }

    #[test]
    fn record_defaults_to_not_processed() {
        let record = Record::new(1, "2024-01-01", "C1");
        assert_eq!(record.status, Status::NotProcessed);
        assert!(record.matches("2024-01-01", "C1"));
        assert!(!record.matches("2024-01-01", "C2"));
    }

    #[test]
    fn record_deserializes_legacy_document_entry() {
        let record: Record = serde_json::from_str(
            r#"{"id": 4, "date": "2024-02-10", "caidat": "Ain Harrouda", "status": "traité"}"#,
        )
        .unwrap();
        assert_eq!(record.status, Status::Processed);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "processed");
    }

    #[test]
    fn row_conversion_rejects_unknown_status() {
        let row = PvRow {
            id: 2,
            date: "2024-01-01".to_string(),
            caidat: "C1".to_string(),
            status: "???".to_string(),
        };
        assert!(Record::try_from(row).is_err());

        let record = Record::new(3, "2024-01-02", "C2");
        let row = PvRow::from(&record);
        assert_eq!(row.status, "not_processed");
        assert_eq!(Record::try_from(row).unwrap(), record);
    }
}
