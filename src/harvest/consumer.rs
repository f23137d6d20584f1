//! Parse-and-store consumer
//!
//! A single blocking worker drains the handoff channel, extracts a record
//! from every successfully fetched page and upserts it. It is the only writer
//! of the store. The loop ends when the channel closes, which happens once
//! every fetch task has finished.

use crate::harvest::extractor::Extractor;
use crate::harvest::fetcher::{FetchResult, FetchedDocument};
use crate::storage::Storage;
use crate::{HarvestError, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Counters describing one harvest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    /// Item URLs handed to the fetch fan-out
    pub dispatched: usize,
    /// Documents the consumer received
    pub received: usize,
    /// Documents whose fetch failed
    pub fetch_failures: usize,
    /// Fetched pages that yielded no name and were skipped
    pub unnamed: usize,
    /// Records newly written to the store
    pub stored: usize,
    /// Records ignored because their name was already stored
    pub duplicates: usize,
}

/// Drains `rx` into `storage` until the channel closes
///
/// Must run on a blocking thread (it uses `blocking_recv`).
///
/// # Arguments
///
/// * `rx` - Receiving end of the handoff channel
/// * `storage` - The store; written only from here
/// * `expected` - Number of documents the fan-out will send
///
/// # Returns
///
/// * `Ok(HarvestStats)` - Channel drained
/// * `Err(HarvestError)` - A store write failed; nothing after it was processed
pub fn consume<S: Storage>(
    mut rx: mpsc::Receiver<FetchedDocument>,
    storage: &Mutex<S>,
    expected: usize,
) -> Result<HarvestStats> {
    let extractor = Extractor::new()?;
    let mut stats = HarvestStats {
        dispatched: expected,
        ..HarvestStats::default()
    };
    let mut remaining = expected;

    while let Some(document) = rx.blocking_recv() {
        stats.received += 1;
        remaining = remaining.saturating_sub(1);

        let FetchedDocument { source_url, result } = document;
        let body = match result {
            FetchResult::Success { body, .. } => body,
            failed => {
                stats.fetch_failures += 1;
                tracing::warn!(
                    "Skipping {}: fetch failed ({})",
                    source_url,
                    failed.failure_reason().unwrap_or_default()
                );
                continue;
            }
        };

        let record = extractor.extract(&body);
        if !record.has_name() {
            stats.unnamed += 1;
            tracing::warn!("Skipping {}: no name found on page", source_url);
            continue;
        }

        let inserted = {
            let mut store = storage
                .lock()
                .map_err(|_| HarvestError::Task("storage lock poisoned".to_string()))?;
            store.upsert_record(&record).map_err(|e| {
                tracing::error!("Failed to store '{}' from {}: {}", record.name, source_url, e);
                HarvestError::Storage(e)
            })?
        };

        if inserted {
            stats.stored += 1;
            tracing::info!("Stored '{}' ({} remaining)", record.name, remaining);
        } else {
            stats.duplicates += 1;
            tracing::debug!("'{}' already stored, ignoring {}", record.name, source_url);
        }

        if remaining == 0 {
            tracing::debug!("All {} expected documents received", expected);
        }
    }

    if remaining != 0 {
        tracing::warn!(
            "Channel closed with {} of {} documents outstanding",
            remaining,
            expected
        );
    }

    Ok(stats)
}

/// Runs [`consume`] on the blocking pool
pub fn spawn_consumer<S>(
    rx: mpsc::Receiver<FetchedDocument>,
    storage: Arc<Mutex<S>>,
    expected: usize,
) -> tokio::task::JoinHandle<Result<HarvestStats>>
where
    S: Storage + Send + 'static,
{
    tokio::task::spawn_blocking(move || consume(rx, &storage, expected))
}
