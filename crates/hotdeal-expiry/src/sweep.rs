//! Batched expiry sweep over the active set.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use hotdeal_core::{DealStore, ExpiryConfig, ExpiryStats, StoreError};

/// Walks every active deal in `end_date` order and expires the overdue ones.
///
/// Batching bounds memory on large active sets; the inter-batch pause keeps
/// the sweep from monopolizing the store. A record that fails to transition
/// only bumps the error counter, so the rest of the sweep still runs. In dry
/// run mode the counters fill in but nothing is written.
///
/// # Errors
///
/// Returns an error only when the active set itself cannot be read.
pub async fn run_expiry_sweep<S: DealStore + ?Sized>(
    store: &S,
    config: &ExpiryConfig,
    now: DateTime<Utc>,
) -> Result<ExpiryStats, StoreError> {
    let started = Instant::now();
    let mut stats = ExpiryStats::default();

    let total_active = store.count_active().await?;
    let batch_limit = i64::try_from(config.batch_size.max(1)).unwrap_or(i64::MAX);

    info!(
        total_active,
        batch_size = config.batch_size,
        dry_run = config.dry_run,
        "expiry sweep starting"
    );

    // Expired records leave the active set mid-sweep, so the offset only
    // advances past records that stayed active. A record that fails to
    // transition also advances the offset, otherwise the loop would retry
    // it forever.
    let mut offset: i64 = 0;
    loop {
        let records = store.list_active_by_end_date(batch_limit, offset).await?;
        if records.is_empty() {
            break;
        }
        let full_batch = records.len() == usize::try_from(batch_limit).unwrap_or(usize::MAX);

        for record in &records {
            stats.total_checked += 1;

            // Exact deadline comparison: a deal with minutes left is still
            // live, so no truncation to whole hours here.
            if record.is_expired(now) {
                if config.dry_run {
                    debug!(id = %record.id, "would expire (dry run)");
                    stats.expired += 1;
                    offset += 1;
                } else {
                    match store.mark_expired(record.id).await {
                        Ok(()) => {
                            debug!(id = %record.id, title = %record.title, "deal expired");
                            stats.expired += 1;
                        }
                        Err(e) => {
                            warn!(id = %record.id, "expiry transition failed: {e}");
                            stats.errors += 1;
                            offset += 1;
                        }
                    }
                }
            } else {
                if record.expires_within(now, config.warning_hours) {
                    debug!(id = %record.id, end_date = %record.end_date, "deal expiring soon");
                    stats.expiring_soon += 1;
                }
                offset += 1;
            }
        }

        if full_batch && config.batch_pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.batch_pause_ms)).await;
        }
        if !full_batch {
            break;
        }
    }

    stats.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        checked = stats.total_checked,
        expired = stats.expired,
        expiring_soon = stats.expiring_soon,
        errors = stats.errors,
        "expiry sweep finished"
    );
    Ok(stats)
}

/// Pushes a deal's current deadline forward by `additional_hours` and forces
/// it active, whatever state it was in. Returns the new deadline.
///
/// Relative to the stored `end_date`, not to now: extending a deal that
/// still has lifetime left never shortens it.
///
/// # Errors
///
/// Propagates store failures, including the id not existing.
pub async fn extend_deal<S: DealStore + ?Sized>(
    store: &S,
    id: uuid::Uuid,
    additional_hours: i64,
) -> Result<DateTime<Utc>, StoreError> {
    let new_end_date = store.extend_expiry(id, additional_hours).await?;
    info!(%id, %new_end_date, "deal expiry extended");
    Ok(new_end_date)
}

/// Brings an expired deal back with a fresh `now + extend_hours` deadline.
///
/// Conditional on the record still being expired: losing the race against a
/// concurrent writer that already reactivated it returns `false` rather than
/// double-applying.
///
/// # Errors
///
/// Propagates store failures, including the id not existing.
pub async fn reactivate_deal<S: DealStore + ?Sized>(
    store: &S,
    id: uuid::Uuid,
    extend_hours: i64,
    now: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let new_end_date = now + chrono::Duration::hours(extend_hours);
    let reactivated = store.reactivate_expired(id, new_end_date).await?;
    if reactivated {
        info!(%id, %new_end_date, "deal reactivated");
    } else {
        info!(%id, "reactivation skipped, deal is not expired");
    }
    Ok(reactivated)
}

#[cfg(test)]
#[path = "sweep_test.rs"]
mod tests;
