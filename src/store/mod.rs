//! Persistence contract for the queue and the roster.
//!
//! Every [`QueueStore`] method is one atomic unit: it either applies in full
//! or leaves the store untouched. Writes carry the precondition they were
//! planned against (meta version, ticket status) and fail with
//! [`StoreError::Conflict`] when another writer got there first.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Employee, QueueMeta, Ticket, VersionedMeta};
use crate::queue::Transition;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("precondition no longer holds")]
    Conflict { ticket_id: Option<String> },

    #[error("ticket {0} is already active")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Meta and tickets read together.
#[derive(Debug, Clone, Default)]
pub struct QueueSnapshot {
    pub meta: Option<VersionedMeta>,
    /// Creation order; equal timestamps keep insertion order.
    pub tickets: Vec<Ticket>,
}

impl QueueSnapshot {
    pub fn version(&self) -> i64 {
        meta_version(self.meta.as_ref())
    }
}

pub fn meta_version(meta: Option<&VersionedMeta>) -> i64 {
    meta.map_or(0, |m| m.version)
}

#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn load_meta(&self) -> Result<Option<VersionedMeta>, StoreError>;

    async fn snapshot(&self) -> Result<QueueSnapshot, StoreError>;

    /// Write `meta` and insert `ticket` if the meta is still at
    /// `expected_version`. A completed ticket with the same id is replaced;
    /// a waiting or serving one is a [`StoreError::Duplicate`].
    async fn commit_registration(
        &self,
        expected_version: i64,
        meta: &QueueMeta,
        ticket: &Ticket,
    ) -> Result<(), StoreError>;

    /// Apply every transition or none of them.
    async fn apply_transitions(&self, transitions: &[Transition]) -> Result<(), StoreError>;

    /// Delete all tickets and write `meta`, if the meta is still at
    /// `expected_version`. Returns the number of tickets removed.
    async fn reset(&self, expected_version: i64, meta: &QueueMeta) -> Result<u64, StoreError>;
}

/// Registry of employees allowed to take a ticket.
#[async_trait]
pub trait Roster: Send + Sync {
    async fn find(&self, employee_id: &str) -> Result<Option<Employee>, StoreError>;

    async fn exists(&self, employee_id: &str) -> Result<bool, StoreError> {
        Ok(self.find(employee_id).await?.is_some())
    }

    /// Insert or replace by `emp_id`.
    async fn add(&self, employee: &Employee) -> Result<(), StoreError>;
}
