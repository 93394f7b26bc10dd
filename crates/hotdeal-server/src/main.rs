mod api;
mod jobs;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::scheduler::DealScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(hotdeal_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = hotdeal_db::PoolConfig::from_app_config(&config);
    let pool = hotdeal_db::connect_pool(&config.database_url, pool_config).await?;
    hotdeal_db::run_migrations(&pool).await?;

    let mut scheduler = DealScheduler::new();
    scheduler.start(pool.clone(), Arc::clone(&config)).await?;
    let scheduler = Arc::new(tokio::sync::Mutex::new(scheduler));

    let app = build_app(AppState {
        pool,
        config: Arc::clone(&config),
        scheduler: Arc::clone(&scheduler),
    });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "hotdeal server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.lock().await.stop().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
