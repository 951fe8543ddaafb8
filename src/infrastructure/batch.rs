// Chunked fan-out over the store's bounded `In` / id-set operations.
// Large id sets are split into store-sized batches, fetched concurrently and
// merged client-side in batch order.

use futures::future::try_join_all;
use serde_json::Value;

use crate::error::AppResult;
use crate::infrastructure::database::{DocumentStore, Query, StoredDocument};

/// Split `items` into batches of at most `size` (a zero size is treated as one).
pub fn chunks<T>(items: &[T], size: usize) -> impl Iterator<Item = &[T]> {
    items.chunks(size.max(1))
}

/// `get_many` over an id set of any size.
pub async fn get_many_chunked(
    store: &dyn DocumentStore,
    collection: &str,
    ids: &[String],
) -> AppResult<Vec<StoredDocument>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let batches = chunks(ids, store.max_in_values()).map(|batch| store.get_many(collection, batch));
    let results = try_join_all(batches).await?;
    Ok(results.into_iter().flatten().collect())
}

/// Run `base` once per batch of `values`, each time with an added
/// `field IN batch` filter, and concatenate the results.
///
/// Ordering and limits in `base` apply per batch only; callers that need a
/// global order must re-sort and re-truncate the merged rows.
pub async fn query_in_chunked(
    store: &dyn DocumentStore,
    base: &Query,
    field: &str,
    values: &[Value],
) -> AppResult<Vec<StoredDocument>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let queries: Vec<Query> = chunks(values, store.max_in_values())
        .map(|batch| base.clone().where_in(field, batch.to_vec()))
        .collect();
    tracing::debug!(
        collection = %base.collection,
        batches = queries.len(),
        "fanning out chunked query"
    );

    let results = try_join_all(queries.iter().map(|q| store.query(q))).await?;
    Ok(results.into_iter().flatten().collect())
}
