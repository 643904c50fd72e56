use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use clinic_queue_server::clock::SystemClock;
use clinic_queue_server::config::Config;
use clinic_queue_server::queue::{QueueService, ResetScheduler};
use clinic_queue_server::routes::create_routes;
use clinic_queue_server::state::AppState;
use clinic_queue_server::store::{MemoryStore, PgStore, QueueStore, Roster};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let (store, roster): (Arc<dyn QueueStore>, Arc<dyn Roster>) = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(config.store_timeout)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            tracing::info!("Successfully connected to database");

            sqlx::migrate!()
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            tracing::info!("Migrations run successfully");

            let pg = Arc::new(PgStore::new(pool));
            let store: Arc<dyn QueueStore> = pg.clone();
            let roster: Arc<dyn Roster> = pg;
            (store, roster)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, queue state is kept in memory only");
            let memory = Arc::new(MemoryStore::new());
            let store: Arc<dyn QueueStore> = memory.clone();
            let roster: Arc<dyn Roster> = memory;
            (store, roster)
        }
    };

    let service = Arc::new(
        QueueService::new(store, roster, Arc::new(SystemClock), config.counter())
            .with_store_timeout(config.store_timeout),
    );

    let cancel = CancellationToken::new();
    let scheduler = ResetScheduler::new(service.clone(), config.reset_time);
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    let app = create_routes(AppState { service }, &config);

    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .expect("Server failed");

    cancel.cancel();
    let _ = scheduler_task.await;
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        cancel.cancelled().await;
        return;
    }
    tracing::info!("Shutdown signal received");
    cancel.cancel();
}
