use std::sync::Arc;

use crate::queue::QueueService;

/// Shared state handed to every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueueService>,
}
