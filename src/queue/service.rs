use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use super::feed::{QueueEvent, QueueFeed};
use super::scheduler::{reset_due, ResetOutcome};
use super::state::{self, CallNextPlan, QueueView, Transition};
use super::{QueueCounter, QueueError};
use crate::clock::Clock;
use crate::models::{Employee, NewEmployee, Ticket, TicketStatus};
use crate::store::{meta_version, QueueStore, Roster, StoreError};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// One try plus one retry after a conflict.
const MAX_ATTEMPTS: u32 = 2;

/// Result of a call-next, with what the operator and the display need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallNextOutcome {
    pub completed: Option<Transition>,
    pub serving: Option<Transition>,
    pub queue_empty: bool,
    /// Serving tickets left for manual reconciliation.
    pub stray_serving: Vec<String>,
    pub announcement: Option<String>,
}

impl From<CallNextPlan> for CallNextOutcome {
    fn from(plan: CallNextPlan) -> Self {
        let queue_empty = plan.queue_empty();
        let announcement = plan
            .promoted
            .as_ref()
            .map(|t| format!("Now serving {}", t.queue_number));
        Self {
            completed: plan.completed,
            serving: plan.promoted,
            queue_empty,
            stray_serving: plan.stray_serving,
            announcement,
        }
    }
}

impl CallNextOutcome {
    pub fn message(&self) -> String {
        match &self.serving {
            Some(t) => format!("Invited: {}", t.queue_number),
            None => "No more patients waiting!".to_string(),
        }
    }
}

/// Exactly six ASCII digits.
pub fn validate_employee_id(employee_id: &str) -> Result<(), QueueError> {
    if employee_id.len() == 6 && employee_id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(QueueError::Validation(
            "Employee ID must be exactly 6 digits!".to_string(),
        ))
    }
}

/// Registration, call-next and the day rollover, run against a shared store.
///
/// Each write is planned from a fresh read and committed with the read's
/// precondition; a conflict is retried once from a new read. No queue state
/// is cached between calls.
pub struct QueueService {
    store: Arc<dyn QueueStore>,
    roster: Arc<dyn Roster>,
    clock: Arc<dyn Clock>,
    counter: QueueCounter,
    feed: QueueFeed,
    store_timeout: Duration,
    // Held while a reset is in progress in this process.
    reset_gate: Mutex<()>,
}

impl QueueService {
    pub fn new(
        store: Arc<dyn QueueStore>,
        roster: Arc<dyn Roster>,
        clock: Arc<dyn Clock>,
        counter: QueueCounter,
    ) -> Self {
        Self {
            store,
            roster,
            clock,
            counter,
            feed: QueueFeed::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            reset_gate: Mutex::new(()),
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn counter(&self) -> &QueueCounter {
        &self.counter
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.feed.subscribe()
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, QueueError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(|e| QueueError::from_store(operation, e)),
            Err(_) => Err(QueueError::BackendUnavailable {
                operation,
                reason: format!("no answer within {:?}", self.store_timeout),
            }),
        }
    }

    /// Issue a ticket to a rostered employee.
    pub async fn register(&self, employee_id: &str) -> Result<Ticket, QueueError> {
        const OP: &str = "register";

        validate_employee_id(employee_id)?;
        let employee = self
            .bounded(OP, self.roster.find(employee_id))
            .await?
            .ok_or_else(|| {
                QueueError::Validation(
                    "Invalid Employee ID! This employee does not exist in the database."
                        .to_string(),
                )
            })?;

        let mut attempt = 1;
        loop {
            let snapshot = self.bounded(OP, self.store.snapshot()).await?;
            let now = self.clock.now();

            // Yesterday's queue is wiped before any number for today is issued.
            let meta = snapshot.meta.as_ref().map(|m| &m.meta);
            if reset_due(meta, self.counter.day_of(now), &self.counter) {
                let _resetting = self.reset_gate.lock().await;
                match self.roll_over(OP, snapshot.version(), now).await {
                    Ok(_) => continue,
                    Err(e) if e.is_conflict() && attempt < MAX_ATTEMPTS => {
                        warn!(operation = OP, "Meta changed during rollover, re-reading");
                        attempt += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            let issued = self.counter.issue_after(meta, snapshot.tickets.len(), now);
            let ticket = Ticket {
                id: employee.emp_id.clone(),
                queue_number: issued.queue_number,
                status: TicketStatus::Waiting,
                created_at: now,
                date: self.counter.day_of(now),
                employee_id: employee.emp_id.clone(),
                name: Some(employee.name.clone()),
            };

            let committed = self
                .bounded(
                    OP,
                    self.store
                        .commit_registration(snapshot.version(), &issued.meta, &ticket),
                )
                .await;

            match committed {
                Ok(()) => {
                    info!(
                        ticket_id = %ticket.id,
                        queue_number = %ticket.queue_number,
                        "Patient registered"
                    );
                    self.feed.publish(QueueEvent::Registered {
                        ticket_id: ticket.id.clone(),
                        queue_number: ticket.queue_number.clone(),
                    });
                    return Ok(ticket);
                }
                Err(e) if e.is_conflict() && attempt < MAX_ATTEMPTS => {
                    warn!(operation = OP, ticket_id = %ticket.id, "Concurrent write, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    warn!(operation = OP, ticket_id = %ticket.id, error = %e, "Registration failed");
                    return Err(e);
                }
            }
        }
    }

    /// Complete the ticket being served and promote the next waiting one.
    pub async fn call_next(&self) -> Result<CallNextOutcome, QueueError> {
        const OP: &str = "call_next";

        let mut attempt = 1;
        loop {
            let snapshot = self.bounded(OP, self.store.snapshot()).await?;
            let plan = state::call_next(&snapshot.tickets);

            if !plan.stray_serving.is_empty() {
                warn!(
                    operation = OP,
                    stray = ?plan.stray_serving,
                    "Several tickets serving; earliest kept, rest need manual reconciliation"
                );
            }

            let transitions = plan.transitions();
            if transitions.is_empty() {
                info!("No patients waiting");
                return Ok(plan.into());
            }

            match self.bounded(OP, self.store.apply_transitions(&transitions)).await {
                Ok(()) => {
                    let outcome = CallNextOutcome::from(plan);
                    if let Some(done) = &outcome.completed {
                        info!(ticket_id = %done.ticket_id, queue_number = %done.queue_number, "Marked as completed");
                    }
                    if let Some(next) = &outcome.serving {
                        info!(ticket_id = %next.ticket_id, queue_number = %next.queue_number, "Marked as serving");
                    }
                    self.feed.publish(QueueEvent::Called {
                        completed: outcome.completed.as_ref().map(|t| t.queue_number.clone()),
                        serving: outcome.serving.as_ref().map(|t| t.queue_number.clone()),
                    });
                    return Ok(outcome);
                }
                Err(e) if e.is_conflict() && attempt < MAX_ATTEMPTS => {
                    warn!(operation = OP, error = %e, "Concurrent call-next, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    warn!(operation = OP, error = %e, "Call-next failed");
                    return Err(e);
                }
            }
        }
    }

    /// Wipe the queue and restart numbering if the stored reset date is not
    /// today. Safe to call from any number of triggers.
    pub async fn ensure_current_day(&self) -> Result<ResetOutcome, QueueError> {
        const OP: &str = "reset";

        let _resetting = self.reset_gate.lock().await;

        let mut attempt = 1;
        loop {
            let current = self.bounded(OP, self.store.load_meta()).await?;
            let now = self.clock.now();
            let today = self.counter.day_of(now);

            if !reset_due(current.as_ref().map(|m| &m.meta), today, &self.counter) {
                return Ok(ResetOutcome::NotDue);
            }

            match self.roll_over(OP, meta_version(current.as_ref()), now).await {
                Ok(cleared) => return Ok(ResetOutcome::Performed { cleared }),
                Err(e) if e.is_conflict() && attempt < MAX_ATTEMPTS => {
                    warn!(operation = OP, "Meta changed during reset, re-checking");
                    attempt += 1;
                }
                Err(e) => {
                    error!(operation = OP, error = %e, "Error resetting the queue");
                    return Err(e);
                }
            }
        }
    }

    /// Wipe every ticket and restart numbering for the day containing `now`.
    /// Callers hold `reset_gate`.
    async fn roll_over(
        &self,
        operation: &'static str,
        expected_version: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, QueueError> {
        let meta = self.counter.reset_meta(now);
        let cleared = self
            .bounded(operation, self.store.reset(expected_version, &meta))
            .await?;
        info!(cleared, today = %self.counter.day_of(now), "Queue reset for the day completed");
        self.feed.publish(QueueEvent::Reset { cleared });
        Ok(cleared)
    }

    pub async fn view(&self) -> Result<QueueView, QueueError> {
        let snapshot = self.bounded("view", self.store.snapshot()).await?;
        Ok(QueueView::from_tickets(&snapshot.tickets))
    }

    /// Tickets for one calendar day, defaulting to today. Earlier days come
    /// back empty once the rollover has wiped them.
    pub async fn tickets_on(&self, date: Option<NaiveDate>) -> Result<Vec<Ticket>, QueueError> {
        let date = date.unwrap_or_else(|| self.clock.today(self.counter.offset()));
        let snapshot = self.bounded("tickets_on", self.store.snapshot()).await?;
        Ok(state::tickets_on(&snapshot.tickets, date)
            .into_iter()
            .cloned()
            .collect())
    }

    /// What a display sees when it opens: roll the day over if needed,
    /// then read.
    pub async fn open_view(&self) -> Result<QueueView, QueueError> {
        self.ensure_current_day().await?;
        self.view().await
    }

    pub async fn add_employee(&self, submission: NewEmployee) -> Result<Employee, QueueError> {
        let employee = submission.validate()?;
        validate_employee_id(&employee.emp_id)?;
        self.bounded("add_employee", self.roster.add(&employee)).await?;
        info!(emp_id = %employee.emp_id, "Employee added to roster");
        Ok(employee)
    }

    pub async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, QueueError> {
        self.bounded("find_employee", self.roster.find(employee_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::QueueMeta;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    async fn setup(now: DateTime<Utc>) -> (Arc<MemoryStore>, Arc<ManualClock>, QueueService) {
        let store = Arc::new(MemoryStore::new());
        for (id, name) in [("100200", "Siti Aminah"), ("100300", "Budi Santoso"), ("100400", "Rina")] {
            store
                .add(&Employee {
                    emp_id: id.to_string(),
                    name: name.to_string(),
                    gender: "Female".to_string(),
                    department: "Finance".to_string(),
                    mobile: "Not provided".to_string(),
                })
                .await
                .unwrap();
        }
        let clock = Arc::new(ManualClock::new(now));
        let service = QueueService::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            QueueCounter::default(),
        );
        (store, clock, service)
    }

    #[tokio::test]
    async fn register_then_call_twice() {
        let (_, clock, service) = setup(at(5, 8)).await;

        let first = service.register("100200").await.unwrap();
        assert_eq!(first.queue_number, "S5-01");
        assert_eq!(first.status, TicketStatus::Waiting);
        assert_eq!(first.name.as_deref(), Some("Siti Aminah"));

        clock.advance(chrono::Duration::minutes(1));
        let second = service.register("100300").await.unwrap();
        assert_eq!(second.queue_number, "S5-02");

        let call = service.call_next().await.unwrap();
        assert!(call.completed.is_none());
        assert_eq!(call.serving.as_ref().unwrap().ticket_id, "100200");
        assert_eq!(call.message(), "Invited: S5-01");

        let call = service.call_next().await.unwrap();
        assert_eq!(call.completed.unwrap().ticket_id, "100200");
        assert_eq!(call.serving.unwrap().ticket_id, "100300");

        let view = service.view().await.unwrap();
        assert_eq!(view.current_serving.unwrap().id, "100300");
        assert_eq!(view.completed_today.len(), 1);
        assert!(view.upcoming.is_empty());
    }

    #[tokio::test]
    async fn stale_meta_resets_before_issuing() {
        let (store, _, service) = setup(at(5, 9)).await;
        store
            .reset(
                0,
                &QueueMeta {
                    queue_number: "S5-07".to_string(),
                    last_reset_date: at(4, 0),
                },
            )
            .await
            .unwrap();

        let ticket = service.register("100200").await.unwrap();
        assert_eq!(ticket.queue_number, "S5-01");

        let meta = store.load_meta().await.unwrap().unwrap().meta;
        assert_eq!(meta.queue_number, "S5-01");
        assert_eq!(meta.last_reset_date.date_naive(), at(5, 9).date_naive());
    }

    #[tokio::test]
    async fn yesterdays_tickets_are_wiped_on_registration() {
        let (store, clock, service) = setup(at(4, 15)).await;
        service.register("100200").await.unwrap();
        service.register("100300").await.unwrap();

        clock.set(at(5, 8));
        let ticket = service.register("100400").await.unwrap();
        assert_eq!(ticket.queue_number, "S5-01");

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.tickets.len(), 1);
        assert_eq!(snapshot.tickets[0].id, "100400");
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids_are_rejected_without_writes() {
        let (store, _, service) = setup(at(5, 9)).await;

        assert!(matches!(
            service.register("12345").await,
            Err(QueueError::Validation(_))
        ));
        assert!(matches!(
            service.register("99999x").await,
            Err(QueueError::Validation(_))
        ));
        assert!(matches!(
            service.register("999999").await,
            Err(QueueError::Validation(msg)) if msg.starts_with("Invalid Employee ID")
        ));
        assert!(store.load_meta().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_re_registration_is_rejected() {
        let (_, _, service) = setup(at(5, 9)).await;
        service.register("100200").await.unwrap();
        assert!(matches!(
            service.register("100200").await,
            Err(QueueError::DuplicateTicket(id)) if id == "100200"
        ));
    }

    #[tokio::test]
    async fn completed_patient_can_register_again() {
        let (_, _, service) = setup(at(5, 9)).await;
        service.register("100200").await.unwrap();
        service.call_next().await.unwrap();
        service.call_next().await.unwrap();

        let again = service.register("100200").await.unwrap();
        assert_eq!(again.queue_number, "S5-02");
    }

    #[tokio::test]
    async fn last_call_completes_and_reports_empty() {
        let (_, _, service) = setup(at(5, 9)).await;
        service.register("100200").await.unwrap();
        service.call_next().await.unwrap();

        let outcome = service.call_next().await.unwrap();
        assert_eq!(outcome.completed.as_ref().unwrap().ticket_id, "100200");
        assert!(outcome.queue_empty);
        assert_eq!(outcome.message(), "No more patients waiting!");

        let outcome = service.call_next().await.unwrap();
        assert!(outcome.completed.is_none() && outcome.queue_empty);
    }

    #[tokio::test]
    async fn reset_is_once_per_day() {
        let (store, clock, service) = setup(at(5, 0)).await;

        assert_eq!(
            service.ensure_current_day().await.unwrap(),
            ResetOutcome::Performed { cleared: 0 }
        );
        let after_first = store.load_meta().await.unwrap().unwrap();
        assert_eq!(after_first.meta.queue_number, "S5-01");

        assert_eq!(service.ensure_current_day().await.unwrap(), ResetOutcome::NotDue);
        assert_eq!(store.load_meta().await.unwrap().unwrap(), after_first);

        // First registration after a scheduled reset still gets -01.
        let ticket = service.register("100200").await.unwrap();
        assert_eq!(ticket.queue_number, "S5-01");

        clock.set(at(6, 0));
        assert_eq!(
            service.ensure_current_day().await.unwrap(),
            ResetOutcome::Performed { cleared: 1 }
        );
    }

    #[tokio::test]
    async fn concurrent_registrations_get_distinct_numbers() {
        let (_, _, service) = setup(at(5, 9)).await;
        let service = Arc::new(service);

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.register("100200").await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.register("100300").await }
        });

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert_ne!(a.queue_number, b.queue_number);
    }

    #[tokio::test]
    async fn concurrent_call_next_never_double_serves() {
        let (_, clock, service) = setup(at(5, 9)).await;
        service.register("100200").await.unwrap();
        clock.advance(chrono::Duration::minutes(1));
        service.register("100300").await.unwrap();
        let service = Arc::new(service);

        let calls: Vec<_> = (0..2)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.call_next().await })
            })
            .collect();
        for call in calls {
            call.await.unwrap().unwrap();
        }

        let view = service.view().await.unwrap();
        assert_eq!(view.current_serving.unwrap().id, "100300");
        assert_eq!(view.completed_today.len(), 1);
    }

    /// Delegates to a [`MemoryStore`], failing the next `conflicts` writes
    /// and optionally moving the clock when the first snapshot is taken.
    struct ContendedStore {
        inner: Arc<MemoryStore>,
        conflicts: AtomicU32,
        jump_on_snapshot: std::sync::Mutex<Option<(Arc<ManualClock>, DateTime<Utc>)>>,
    }

    impl ContendedStore {
        fn new(inner: Arc<MemoryStore>) -> Self {
            Self {
                inner,
                conflicts: AtomicU32::new(0),
                jump_on_snapshot: std::sync::Mutex::new(None),
            }
        }

        fn conflicting(self, times: u32) -> Self {
            self.conflicts.store(times, Ordering::SeqCst);
            self
        }

        fn jumping(self, clock: Arc<ManualClock>, to: DateTime<Utc>) -> Self {
            *self.jump_on_snapshot.lock().unwrap() = Some((clock, to));
            self
        }

        fn take_conflict(&self) -> Result<(), StoreError> {
            let injected = self
                .conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            match injected {
                Ok(_) => Err(StoreError::Conflict { ticket_id: None }),
                Err(_) => Ok(()),
            }
        }
    }

    #[async_trait]
    impl QueueStore for ContendedStore {
        async fn load_meta(&self) -> Result<Option<crate::models::VersionedMeta>, StoreError> {
            self.inner.load_meta().await
        }

        async fn snapshot(&self) -> Result<crate::store::QueueSnapshot, StoreError> {
            let snapshot = self.inner.snapshot().await;
            if let Some((clock, to)) = self.jump_on_snapshot.lock().unwrap().take() {
                clock.set(to);
            }
            snapshot
        }

        async fn commit_registration(
            &self,
            expected_version: i64,
            meta: &QueueMeta,
            ticket: &Ticket,
        ) -> Result<(), StoreError> {
            self.take_conflict()?;
            self.inner
                .commit_registration(expected_version, meta, ticket)
                .await
        }

        async fn apply_transitions(&self, transitions: &[Transition]) -> Result<(), StoreError> {
            self.take_conflict()?;
            self.inner.apply_transitions(transitions).await
        }

        async fn reset(&self, expected_version: i64, meta: &QueueMeta) -> Result<u64, StoreError> {
            self.inner.reset(expected_version, meta).await
        }
    }

    fn contended(
        store: ContendedStore,
        roster: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    ) -> QueueService {
        QueueService::new(Arc::new(store), roster, clock, QueueCounter::default())
    }

    #[tokio::test]
    async fn midnight_during_registration_still_wipes_yesterday() {
        let (store, clock, service) = setup(at(4, 23)).await;
        service.register("100200").await.unwrap();

        let midnight = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 1).unwrap();
        let service = contended(
            ContendedStore::new(store.clone()).jumping(clock.clone(), midnight),
            store.clone(),
            clock.clone(),
        );

        let ticket = service.register("100300").await.unwrap();
        assert_eq!(ticket.queue_number, "S5-01");
        assert_eq!(ticket.date, midnight.date_naive());

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.tickets.len(), 1);
        assert_eq!(snapshot.tickets[0].id, "100300");
        assert_eq!(service.ensure_current_day().await.unwrap(), ResetOutcome::NotDue);
    }

    #[tokio::test]
    async fn single_conflict_is_retried() {
        let (store, clock, _) = setup(at(5, 9)).await;
        let service = contended(
            ContendedStore::new(store.clone()).conflicting(1),
            store.clone(),
            clock.clone(),
        );
        let ticket = service.register("100200").await.unwrap();
        assert_eq!(ticket.queue_number, "S5-01");

        let service = contended(
            ContendedStore::new(store.clone()).conflicting(1),
            store.clone(),
            clock,
        );
        let outcome = service.call_next().await.unwrap();
        assert_eq!(outcome.serving.unwrap().ticket_id, "100200");
    }

    #[tokio::test]
    async fn second_conflict_surfaces() {
        let (store, clock, _) = setup(at(5, 9)).await;
        let service = contended(
            ContendedStore::new(store.clone()).conflicting(2),
            store.clone(),
            clock.clone(),
        );
        assert!(matches!(
            service.register("100200").await,
            Err(QueueError::Conflict { operation: "register", .. })
        ));
        // The reset that opened the day went through; no ticket did.
        assert!(store.snapshot().await.unwrap().tickets.is_empty());

        service.register("100200").await.unwrap();
        let service = contended(
            ContendedStore::new(store.clone()).conflicting(2),
            store.clone(),
            clock,
        );
        assert!(matches!(
            service.call_next().await,
            Err(QueueError::Conflict { operation: "call_next", .. })
        ));
        let view = QueueView::from_tickets(&store.snapshot().await.unwrap().tickets);
        assert!(view.current_serving.is_none());
        assert_eq!(view.upcoming.len(), 1);
    }

    struct StalledStore;

    #[async_trait]
    impl QueueStore for StalledStore {
        async fn load_meta(&self) -> Result<Option<crate::models::VersionedMeta>, StoreError> {
            std::future::pending().await
        }

        async fn snapshot(&self) -> Result<crate::store::QueueSnapshot, StoreError> {
            std::future::pending().await
        }

        async fn commit_registration(
            &self,
            _: i64,
            _: &QueueMeta,
            _: &Ticket,
        ) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn apply_transitions(&self, _: &[Transition]) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn reset(&self, _: i64, _: &QueueMeta) -> Result<u64, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn unresponsive_store_surfaces_as_unavailable() {
        let roster = Arc::new(MemoryStore::new());
        let service = QueueService::new(
            Arc::new(StalledStore),
            roster,
            Arc::new(ManualClock::new(at(5, 9))),
            QueueCounter::default(),
        )
        .with_store_timeout(Duration::from_millis(20));

        assert!(matches!(
            service.view().await,
            Err(QueueError::BackendUnavailable { operation: "view", .. })
        ));
        assert!(matches!(
            service.call_next().await,
            Err(QueueError::BackendUnavailable { operation: "call_next", .. })
        ));
    }
}
