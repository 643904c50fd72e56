//! Projections over the day's tickets and the call-next transition plan.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Ticket, TicketStatus};

/// One compare-and-swap on a ticket's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub ticket_id: String,
    pub queue_number: String,
    pub from: TicketStatus,
    pub to: TicketStatus,
}

impl Transition {
    fn of(ticket: &Ticket, to: TicketStatus) -> Self {
        Self {
            ticket_id: ticket.id.clone(),
            queue_number: ticket.queue_number.clone(),
            from: ticket.status,
            to,
        }
    }
}

/// What a call-next should write, computed from a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallNextPlan {
    /// The ticket being served, moving to completed.
    pub completed: Option<Transition>,
    /// The earliest waiting ticket, moving to serving.
    pub promoted: Option<Transition>,
    /// Ids of serving tickets beyond the earliest one. Left untouched for
    /// manual reconciliation.
    pub stray_serving: Vec<String>,
}

impl CallNextPlan {
    pub fn transitions(&self) -> Vec<Transition> {
        self.completed
            .iter()
            .chain(self.promoted.iter())
            .cloned()
            .collect()
    }

    /// No waiting ticket was left to promote.
    pub fn queue_empty(&self) -> bool {
        self.promoted.is_none()
    }
}

/// Plan the call-next transition: complete whoever is being served and
/// promote the earliest waiting ticket.
///
/// Ticket order in `tickets` breaks `created_at` ties.
pub fn call_next(tickets: &[Ticket]) -> CallNextPlan {
    let mut serving = by_status(tickets, TicketStatus::Serving);
    serving.sort_by_key(|t| t.created_at);

    let mut serving = serving.into_iter();
    let completed = serving
        .next()
        .map(|t| Transition::of(t, TicketStatus::Completed));
    let stray_serving = serving.map(|t| t.id.clone()).collect();

    let promoted = tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Waiting)
        .min_by_key(|t| t.created_at)
        .map(|t| Transition::of(t, TicketStatus::Serving));

    CallNextPlan {
        completed,
        promoted,
        stray_serving,
    }
}

/// Earliest-created serving ticket.
pub fn current_serving(tickets: &[Ticket]) -> Option<&Ticket> {
    tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Serving)
        .min_by_key(|t| t.created_at)
}

/// Waiting tickets, oldest first.
pub fn upcoming(tickets: &[Ticket]) -> Vec<&Ticket> {
    let mut waiting = by_status(tickets, TicketStatus::Waiting);
    waiting.sort_by_key(|t| t.created_at);
    waiting
}

/// Completed tickets, most recent first.
pub fn completed_today(tickets: &[Ticket]) -> Vec<&Ticket> {
    let mut done = by_status(tickets, TicketStatus::Completed);
    done.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    done
}

fn by_status(tickets: &[Ticket], status: TicketStatus) -> Vec<&Ticket> {
    tickets.iter().filter(|t| t.status == status).collect()
}

/// Tickets created on `date`, oldest first, whatever their status.
pub fn tickets_on(tickets: &[Ticket], date: NaiveDate) -> Vec<&Ticket> {
    let mut on_day: Vec<_> = tickets.iter().filter(|t| t.date == date).collect();
    on_day.sort_by_key(|t| t.created_at);
    on_day
}

/// Everything the admin console and the TV display render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueView {
    pub current_serving: Option<Ticket>,
    pub upcoming: Vec<Ticket>,
    pub completed_today: Vec<Ticket>,
}

impl QueueView {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        Self {
            current_serving: current_serving(tickets).cloned(),
            upcoming: upcoming(tickets).into_iter().cloned().collect(),
            completed_today: completed_today(tickets).into_iter().cloned().collect(),
        }
    }
}
