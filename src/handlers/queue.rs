use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Response;
use axum::Json;
use chrono::NaiveDate;
use futures::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::broadcast::{error::RecvError, Receiver};

use crate::queue::{QueueError, QueueEvent, QueueService, QueueView, ResetOutcome};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct RegisterTicketRequest {
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TicketsQuery {
    pub date: Option<NaiveDate>,
}

/// Opening the queue view doubles as the lazy day-rollover check.
pub async fn get_queue(State(state): State<AppState>) -> Result<Response, AppError> {
    let view = state.service.open_view().await?;
    Ok(success(view, "Queue loaded"))
}

pub async fn register_ticket(
    State(state): State<AppState>,
    payload: Result<Json<RegisterTicketRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let ticket = state.service.register(request.employee_id.trim()).await?;
    let message = format!(
        "Patient registered successfully! Queue number: {}",
        ticket.queue_number
    );
    Ok(created(ticket, message))
}

/// Day listing for the admin calendar; `?date=YYYY-MM-DD`, today if absent.
pub async fn list_tickets(
    State(state): State<AppState>,
    query: Result<Query<TicketsQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let tickets = state.service.tickets_on(query.date).await?;
    let message = if tickets.is_empty() {
        "No transactions found for this date."
    } else {
        "Tickets loaded"
    };
    Ok(success(tickets, message))
}

pub async fn call_next(State(state): State<AppState>) -> Result<Response, AppError> {
    let outcome = state.service.call_next().await?;
    let message = outcome.message();
    Ok(success(outcome, message))
}

pub async fn check_reset(State(state): State<AppState>) -> Result<Response, AppError> {
    let outcome = state.service.ensure_current_day().await?;
    let message = match outcome {
        ResetOutcome::Performed { .. } => "Queue reset for the day completed",
        ResetOutcome::NotDue => "Queue is already current",
    };
    Ok(success(outcome, message))
}

struct FeedCursor {
    service: Arc<QueueService>,
    rx: Receiver<QueueEvent>,
    primed: bool,
}

/// Live view for the TV display: one `queue` event on connect and another
/// after every change. Store failures become `unavailable` events; the
/// stream stays open. Dropping the connection drops the subscription.
pub async fn stream_queue(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let cursor = FeedCursor {
        rx: state.service.subscribe(),
        service: state.service,
        primed: false,
    };

    let events = stream::unfold(cursor, |mut cursor| async move {
        if cursor.primed {
            match cursor.rx.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
        cursor.primed = true;

        let event = view_event(cursor.service.view().await);
        Some((Ok(event), cursor))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn view_event(view: Result<QueueView, QueueError>) -> Event {
    let unavailable = |reason: String| {
        tracing::warn!(reason = %reason, "Queue feed: data unavailable");
        Event::default()
            .event("unavailable")
            .data("Queue data is temporarily unavailable")
    };

    match view {
        Ok(view) => match Event::default().event("queue").json_data(&view) {
            Ok(event) => event,
            Err(e) => unavailable(e.to_string()),
        },
        Err(e) => unavailable(e.to_string()),
    }
}
