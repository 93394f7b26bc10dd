use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use hotdeal_core::{AppConfig, CrawlerConfig, Environment, ExpiryConfig};

use super::DealScheduler;

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        database_url: "postgres://localhost/unused".to_string(),
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("valid addr"),
        log_level: "info".to_string(),
        db_max_connections: 1,
        db_min_connections: 0,
        db_acquire_timeout_secs: 1,
        crawler: CrawlerConfig::default(),
        expiry: ExpiryConfig::default(),
    })
}

// Lazy pool: no connection is made until a job actually fires, which none
// does within the test.
fn lazy_pool() -> sqlx::PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .expect("lazy pool")
}

#[tokio::test]
async fn start_registers_jobs_and_is_idempotent() {
    let mut scheduler = DealScheduler::new();
    let config = test_config();

    scheduler
        .start(lazy_pool(), Arc::clone(&config))
        .await
        .expect("first start");
    let status = scheduler.status().await;
    assert!(status.running);
    assert_eq!(status.jobs, 3);

    scheduler
        .start(lazy_pool(), config)
        .await
        .expect("second start is a no-op");
    assert_eq!(scheduler.status().await.jobs, 3);

    scheduler.stop().await.expect("stop");
}

#[tokio::test]
async fn stop_is_idempotent_and_clears_status() {
    let mut scheduler = DealScheduler::new();
    scheduler
        .start(lazy_pool(), test_config())
        .await
        .expect("start");

    scheduler.stop().await.expect("stop");
    let status = scheduler.status().await;
    assert!(!status.running);
    assert_eq!(status.jobs, 0);
    assert_eq!(status.next_job_in_secs, None);

    scheduler.stop().await.expect("second stop is a no-op");
}
