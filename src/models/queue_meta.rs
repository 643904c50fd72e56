use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Singleton record holding the last issued number and the last reset instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMeta {
    pub queue_number: String,
    pub last_reset_date: DateTime<Utc>,
}

/// [`QueueMeta`] as read from the store, with the version used for
/// compare-and-swap writes. Version 0 means no meta has been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedMeta {
    pub meta: QueueMeta,
    pub version: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct QueueMetaRow {
    pub queue_number: String,
    pub last_reset_date: DateTime<Utc>,
    pub version: i64,
}

impl From<QueueMetaRow> for VersionedMeta {
    fn from(row: QueueMetaRow) -> Self {
        VersionedMeta {
            meta: QueueMeta {
                queue_number: row.queue_number,
                last_reset_date: row.last_reset_date,
            },
            version: row.version,
        }
    }
}
