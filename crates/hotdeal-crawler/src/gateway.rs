//! Natural-key dedup gateway between the crawler and the store.

use tracing::debug;

use hotdeal_core::{DealRecord, DealStore, NormalizedDeal, StoreError};

/// What the upsert did with the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Inserts or fully overwrites by the `(source, source_id)` natural key.
///
/// Re-crawling an existing post is the normal case, not a conflict: counts
/// and titles drift between crawls and the freshest extraction wins.
///
/// # Errors
///
/// Propagates store failures; the caller decides whether one item's failure
/// aborts the run (it should not).
pub async fn upsert_deal<S: DealStore + ?Sized>(
    store: &S,
    deal: &NormalizedDeal,
) -> Result<(UpsertOutcome, DealRecord), StoreError> {
    match store
        .find_by_source_and_post_id(deal.source, &deal.source_id)
        .await?
    {
        Some(existing) => {
            let record = store.update(existing.id, deal).await?;
            debug!(
                source = %deal.source,
                source_id = %deal.source_id,
                "updated existing deal"
            );
            Ok((UpsertOutcome::Updated, record))
        }
        None => {
            let record = store.create(deal).await?;
            debug!(
                source = %deal.source,
                source_id = %deal.source_id,
                "created new deal"
            );
            Ok((UpsertOutcome::Created, record))
        }
    }
}
