//! Change notifications for live views.
//!
//! [`QueueFeed`] fans out a [`QueueEvent`] after every successful write.
//! Events only say *that* something changed; subscribers re-read the store
//! for the authoritative state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{QueueError, QueueService, QueueView};

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    Registered {
        ticket_id: String,
        queue_number: String,
    },
    Called {
        completed: Option<String>,
        serving: Option<String>,
    },
    Reset {
        cleared: u64,
    },
}

pub struct QueueFeed {
    sender: broadcast::Sender<QueueEvent>,
}

impl QueueFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Dropped silently when nobody is listening.
    pub fn publish(&self, event: QueueEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }
}

impl Default for QueueFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Register `on_change` to receive a fresh [`QueueView`] now and after every
/// change, until `cancel` fires.
///
/// Store failures are handed to the callback as `Err` so the consumer can
/// show a "data unavailable" state; the observer keeps running. A lagging
/// receiver just re-reads, since only the latest view matters.
pub fn observe<F>(
    service: Arc<QueueService>,
    cancel: CancellationToken,
    mut on_change: F,
) -> JoinHandle<()>
where
    F: FnMut(Result<QueueView, QueueError>) + Send + 'static,
{
    let mut rx = service.subscribe();

    tokio::spawn(async move {
        on_change(service.view().await);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(_) | Err(RecvError::Lagged(_)) => on_change(service.view().await),
                    Err(RecvError::Closed) => break,
                },
            }
        }

        tracing::debug!("Queue observer stopped");
    })
}
