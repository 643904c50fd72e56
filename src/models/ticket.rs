use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a queue entry. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Waiting,
    Serving,
    Completed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Waiting => "waiting",
            TicketStatus::Serving => "serving",
            TicketStatus::Completed => "completed",
        }
    }

    /// Waiting and serving tickets occupy their id for the day.
    pub fn is_active(&self) -> bool {
        !matches!(self, TicketStatus::Completed)
    }

    /// Only `waiting -> serving -> completed` is legal.
    pub fn can_become(&self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Waiting, TicketStatus::Serving)
                | (TicketStatus::Serving, TicketStatus::Completed)
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TicketStatus::Waiting),
            "serving" => Ok(TicketStatus::Serving),
            "completed" => Ok(TicketStatus::Completed),
            other => Err(format!("unknown ticket status '{}'", other)),
        }
    }
}

/// A patient's entry in the queue for one day.
///
/// `id` doubles as the record key, so it is unique among the day's tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub queue_number: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub date: NaiveDate,
    pub employee_id: String,
    pub name: Option<String>,
}

/// Row shape of the `queue_tickets` table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: String,
    pub queue_number: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub date: NaiveDate,
    pub employee_id: String,
    pub name: Option<String>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = String;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            status: row.status.parse()?,
            id: row.id,
            queue_number: row.queue_number,
            created_at: row.created_at,
            date: row.date,
            employee_id: row.employee_id,
            name: row.name,
        })
    }
}
