//! Daily reset: the timer-driven trigger and the staleness rule shared with
//! the lazy check.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::{QueueCounter, QueueService};
use crate::models::QueueMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResetOutcome {
    NotDue,
    Performed { cleared: u64 },
}

/// A reset is due when no meta exists yet or its reset date falls on a
/// different calendar day than `today`.
pub fn reset_due(meta: Option<&QueueMeta>, today: NaiveDate, counter: &QueueCounter) -> bool {
    match meta {
        Some(meta) => counter.day_of(meta.last_reset_date) != today,
        None => true,
    }
}

/// The first instant strictly after `now` at which the local clock at
/// `offset` reads `reset_at`.
pub fn next_reset_at(
    now: DateTime<Utc>,
    reset_at: NaiveTime,
    offset: &FixedOffset,
) -> DateTime<Utc> {
    let local_now = now.with_timezone(offset).naive_local();
    let mut candidate = local_now.date().and_time(reset_at);
    if candidate <= local_now {
        candidate += Duration::days(1);
    }
    let as_utc = candidate - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&as_utc)
}

/// Fires [`QueueService::ensure_current_day`] once a day at a fixed local time.
pub struct ResetScheduler {
    service: Arc<QueueService>,
    reset_at: NaiveTime,
}

impl ResetScheduler {
    pub fn new(service: Arc<QueueService>, reset_at: NaiveTime) -> Self {
        Self { service, reset_at }
    }

    /// Run until `cancel` is triggered. A failed run is logged and left for
    /// the next trigger (timer or lazy check) to retry.
    pub async fn run(self, cancel: CancellationToken) {
        let offset = *self.service.counter().offset();
        tracing::info!(reset_at = %self.reset_at, offset = %offset, "Daily reset job started");

        loop {
            let now = self.service.clock().now();
            let next = next_reset_at(now, self.reset_at, &offset);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::debug!(next_reset = %next, "Daily reset scheduled");

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Daily reset job stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    match self.service.ensure_current_day().await {
                        Ok(ResetOutcome::Performed { cleared }) => {
                            tracing::info!(cleared, "Daily queue reset completed");
                        }
                        Ok(ResetOutcome::NotDue) => {
                            tracing::debug!("Daily reset: queue already current");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Daily reset failed");
                        }
                    }
                }
            }
        }
    }
}
