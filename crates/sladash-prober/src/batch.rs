//! Chunked fan-out over a list of work units.
//!
//! Units are split into chunks of `batch_size`. Probes inside a chunk run
//! concurrently; each chunk is fully drained before the next starts, and a
//! fixed cooldown separates consecutive chunks to bound the request rate
//! against the upstream API. Failed probes never stop later chunks.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use sladash_core::{Item, Location, PayloadShape, Store, StoreItemPair};

use crate::prober::{ProbeOutcome, Prober};
use crate::record::CheckRecord;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Chunk width; values below 1 are treated as 1.
    pub batch_size: usize,
    /// Delay between consecutive chunks. Not applied after the last chunk.
    pub cooldown: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// A unit whose probe failed, with the record substituted for it.
#[derive(Debug, Clone, Serialize)]
pub struct FailedProbe<U, R> {
    pub unit: U,
    pub error: String,
    pub fallback: R,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Successful probes whose payload matched no known shape.
    pub unrecognized: usize,
    /// Percentage of successful probes, two decimals; `0.0` for an empty run.
    pub success_rate: f64,
    pub duration_seconds: f64,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult<U, R> {
    pub successful: Vec<R>,
    pub failed: Vec<FailedProbe<U, R>>,
    pub summary: BatchSummary,
}

/// Probes every unit, chunk by chunk.
///
/// Records come back in input order. An empty `units` slice returns
/// immediately with zero counts.
pub async fn run_batch<P: Prober>(
    prober: &P,
    units: &[P::Unit],
    options: BatchOptions,
) -> BatchResult<P::Unit, P::Record> {
    let started = tokio::time::Instant::now();
    let batch_size = options.batch_size.max(1);
    let chunk_count = units.len().div_ceil(batch_size);

    let mut successful = Vec::with_capacity(units.len());
    let mut failed = Vec::new();
    let mut unrecognized = 0usize;

    for (idx, chunk) in units.chunks(batch_size).enumerate() {
        if idx > 0 && !options.cooldown.is_zero() {
            tokio::time::sleep(options.cooldown).await;
        }

        tracing::debug!(
            chunk = idx + 1,
            chunks = chunk_count,
            size = chunk.len(),
            "probing chunk"
        );

        let outcomes: Vec<ProbeOutcome<P::Unit, P::Record>> =
            join_all(chunk.iter().map(|unit| prober.probe(unit))).await;

        for outcome in outcomes {
            match outcome {
                ProbeOutcome::Success { record, .. } => {
                    if matches!(
                        record.shape(),
                        PayloadShape::Unrecognized | PayloadShape::Malformed
                    ) {
                        unrecognized += 1;
                    }
                    successful.push(record);
                }
                ProbeOutcome::Failure {
                    unit,
                    error,
                    checked_at,
                    fallback,
                } => failed.push(FailedProbe {
                    unit,
                    error,
                    fallback,
                    checked_at,
                }),
            }
        }
    }

    let summary = summarize(
        units.len(),
        successful.len(),
        failed.len(),
        unrecognized,
        chunk_count,
        started.elapsed(),
    );

    BatchResult {
        successful,
        failed,
        summary,
    }
}

#[allow(clippy::cast_precision_loss)]
fn summarize(
    total: usize,
    successful: usize,
    failed: usize,
    unrecognized: usize,
    chunks: usize,
    elapsed: Duration,
) -> BatchSummary {
    let success_rate = if total == 0 {
        0.0
    } else {
        round_to(successful as f64 / total as f64 * 100.0, 2)
    };
    BatchSummary {
        total,
        successful,
        failed,
        unrecognized,
        success_rate,
        duration_seconds: round_to(elapsed.as_secs_f64(), 3),
        chunks,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Builds the stores × items cross product.
///
/// With `subset`, only those item ids are paired (duplicates dropped, order
/// kept); ids missing from `items` are still checked, without a name.
#[must_use]
pub fn expand_store_items(
    stores: &[Store],
    items: &[Item],
    subset: Option<&[String]>,
) -> Vec<StoreItemPair> {
    let selected: Vec<Item> = match subset {
        None => items.to_vec(),
        Some(ids) => {
            let mut seen = std::collections::HashSet::new();
            ids.iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty() && seen.insert(id.to_string()))
                .map(|id| {
                    items
                        .iter()
                        .find(|item| item.item_id == id)
                        .cloned()
                        .unwrap_or_else(|| Item {
                            item_id: id.to_string(),
                            item_name: None,
                        })
                })
                .collect()
        }
    };

    stores
        .iter()
        .flat_map(|store| selected.iter().map(move |item| StoreItemPair::new(store, item)))
        .collect()
}

/// Narrows locations to the given names (case-insensitive). `None` keeps all.
#[must_use]
pub fn select_locations(locations: &[Location], names: Option<&[String]>) -> Vec<Location> {
    let Some(names) = names else {
        return locations.to_vec();
    };

    let wanted: Vec<String> = names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    for name in &wanted {
        if !locations.iter().any(|l| l.name.to_lowercase() == *name) {
            tracing::warn!(location = %name, "requested location is not in the location list");
        }
    }

    locations
        .iter()
        .filter(|l| wanted.contains(&l.name.to_lowercase()))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;
