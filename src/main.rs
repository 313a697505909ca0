// src/main.rs

use std::{sync::Arc, time::Duration};

use adaptive_assessment::{
    bank::{InMemoryQuestionBank, PgQuestionBank, QuestionBank},
    config::{Config, SESSION_SWEEP_SECONDS},
    routes,
    state::AppState,
    store::SessionStore,
};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "assessment.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let bank = open_question_bank(&config).await?;
    let state = AppState::new(bank, config.clone());
    spawn_session_sweeper(
        state.sessions.clone(),
        chrono::Duration::minutes(config.session_retention_minutes),
    );

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drops finished sessions that have outlived the retention window.
fn spawn_session_sweeper(sessions: SessionStore, retention: chrono::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SESSION_SWEEP_SECONDS));
        loop {
            interval.tick().await;
            let evicted = sessions.evict_finished(retention, chrono::Utc::now()).await;
            if evicted > 0 {
                let remaining = sessions.len().await;
                tracing::info!(
                    evicted,
                    remaining,
                    "Evicted finished sessions"
                );
            }
        }
    });
}

/// Postgres when `DATABASE_URL` is set, the JSON bank otherwise.
async fn open_question_bank(
    config: &Config,
) -> Result<Arc<dyn QuestionBank>, Box<dyn std::error::Error>> {
    let Some(database_url) = &config.database_url else {
        let bank: Arc<dyn QuestionBank> =
            Arc::new(InMemoryQuestionBank::from_path(&config.question_bank_path)?);
        return Ok(bank);
    };

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    return Err(format!(
                        "Failed to connect to database after 5 retries: {}",
                        e
                    )
                    .into());
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };
    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    let bank: Arc<dyn QuestionBank> = Arc::new(PgQuestionBank::new(pool));
    Ok(bank)
}
