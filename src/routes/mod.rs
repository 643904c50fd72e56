use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_response_headers_layer, Config};
use crate::handlers::{employees, health_check, queue};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/queue", get(queue::get_queue))
        .route("/queue/stream", get(queue::stream_queue))
        .route(
            "/queue/tickets",
            get(queue::list_tickets).post(queue::register_ticket),
        )
        .route("/queue/call-next", post(queue::call_next))
        .route("/queue/reset", post(queue::check_reset))
        .route("/employees", post(employees::add_employee))
        .route("/employees/:emp_id", get(employees::get_employee));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_response_headers_layer(config.include_hsts))
        .layer(create_cors_layer(&config.cors_origins))
}
