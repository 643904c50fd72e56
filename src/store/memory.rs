use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{meta_version, QueueSnapshot, QueueStore, Roster, StoreError};
use crate::models::{Employee, QueueMeta, Ticket, VersionedMeta};
use crate::queue::Transition;

#[derive(Debug, Default)]
struct Inner {
    meta: Option<VersionedMeta>,
    tickets: Vec<Ticket>,
    employees: HashMap<String, Employee>,
}

/// Single-process store. One lock covers meta, tickets and roster, so each
/// call is trivially atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn check_version(&self, expected: i64) -> Result<i64, StoreError> {
        let current = meta_version(self.meta.as_ref());
        if current != expected {
            return Err(StoreError::Conflict { ticket_id: None });
        }
        Ok(current)
    }

    fn write_meta(&mut self, current: i64, meta: &QueueMeta) {
        self.meta = Some(VersionedMeta {
            meta: meta.clone(),
            version: current + 1,
        });
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn load_meta(&self) -> Result<Option<VersionedMeta>, StoreError> {
        Ok(self.inner.lock().await.meta.clone())
    }

    async fn snapshot(&self) -> Result<QueueSnapshot, StoreError> {
        let inner = self.inner.lock().await;
        let mut tickets = inner.tickets.clone();
        tickets.sort_by_key(|t| t.created_at);
        Ok(QueueSnapshot {
            meta: inner.meta.clone(),
            tickets,
        })
    }

    async fn commit_registration(
        &self,
        expected_version: i64,
        meta: &QueueMeta,
        ticket: &Ticket,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let current = inner.check_version(expected_version)?;

        if let Some(pos) = inner.tickets.iter().position(|t| t.id == ticket.id) {
            if inner.tickets[pos].status.is_active() {
                return Err(StoreError::Duplicate(ticket.id.clone()));
            }
            inner.tickets.remove(pos);
        }

        inner.tickets.push(ticket.clone());
        inner.write_meta(current, meta);
        Ok(())
    }

    async fn apply_transitions(&self, transitions: &[Transition]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        // Check every precondition before touching anything.
        let mut targets = Vec::with_capacity(transitions.len());
        for transition in transitions {
            let pos = inner
                .tickets
                .iter()
                .position(|t| t.id == transition.ticket_id && t.status == transition.from)
                .filter(|_| transition.from.can_become(transition.to))
                .ok_or_else(|| StoreError::Conflict {
                    ticket_id: Some(transition.ticket_id.clone()),
                })?;
            targets.push((pos, transition.to));
        }

        for (pos, to) in targets {
            inner.tickets[pos].status = to;
        }
        Ok(())
    }

    async fn reset(&self, expected_version: i64, meta: &QueueMeta) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let current = inner.check_version(expected_version)?;

        let cleared = inner.tickets.len() as u64;
        inner.tickets.clear();
        inner.write_meta(current, meta);
        Ok(cleared)
    }
}

#[async_trait]
impl Roster for MemoryStore {
    async fn find(&self, employee_id: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self.inner.lock().await.employees.get(employee_id).cloned())
    }

    async fn add(&self, employee: &Employee) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .employees
            .insert(employee.emp_id.clone(), employee.clone());
        Ok(())
    }
}
