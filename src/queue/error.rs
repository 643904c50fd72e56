use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by queue operations.
///
/// Every variant carries enough context (operation, ticket id) for an
/// operator to tell what was attempted.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Bad input or an id missing from the roster. Nothing was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A concurrent writer changed the state this operation was based on,
    /// and the single retry conflicted as well.
    #[error("{operation} conflicted with a concurrent update{}", ticket_suffix(.ticket_id))]
    Conflict {
        operation: &'static str,
        ticket_id: Option<String>,
    },

    /// The id already holds a waiting or serving ticket today.
    #[error("Ticket {0} is already waiting or being served")]
    DuplicateTicket(String),

    /// The store could not be reached or timed out.
    #[error("Backend unavailable during {operation}: {reason}")]
    BackendUnavailable {
        operation: &'static str,
        reason: String,
    },

    #[error("Queue invariant violated: {0}")]
    InvariantViolation(String),
}

fn ticket_suffix(ticket_id: &Option<String>) -> String {
    match ticket_id {
        Some(id) => format!(" on ticket {}", id),
        None => String::new(),
    }
}

impl QueueError {
    pub fn from_store(operation: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::Conflict { ticket_id } => QueueError::Conflict {
                operation,
                ticket_id,
            },
            StoreError::Duplicate(id) => QueueError::DuplicateTicket(id),
            StoreError::Database(e) => QueueError::BackendUnavailable {
                operation,
                reason: e.to_string(),
            },
            StoreError::Corrupt(msg) => {
                QueueError::InvariantViolation(format!("{}: {}", operation, msg))
            }
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, QueueError::Conflict { .. })
    }
}
