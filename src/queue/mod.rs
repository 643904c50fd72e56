//! Queue numbering, call-next transitions and the daily reset.
//!
//! [`counter`], [`state`] and the decision half of [`scheduler`] are pure
//! functions over records read from the store. [`service`] wraps them in
//! read / plan / compare-and-swap rounds against a [`crate::store::QueueStore`].

pub mod counter;
pub mod error;
pub mod feed;
pub mod scheduler;
pub mod service;
pub mod state;

pub use counter::{Issued, QueueCounter, DEFAULT_PREFIX};
pub use error::QueueError;
pub use feed::{observe, QueueEvent, QueueFeed};
pub use scheduler::{next_reset_at, reset_due, ResetOutcome, ResetScheduler};
pub use service::{validate_employee_id, CallNextOutcome, QueueService};
pub use state::{CallNextPlan, QueueView, Transition};
