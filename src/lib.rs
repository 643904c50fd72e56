//! Clinic patient-queue server.
//!
//! Staff register rostered employees as walk-in patients, an admin calls the
//! next patient, displays follow the queue live, and numbering restarts
//! every day.

pub mod clock;
pub mod config;
pub mod handlers;
pub mod models;
pub mod queue;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
