//! Turns a finished batch into the report handed back to the caller.
//!
//! Persistence is best-effort: a failed write is logged and recorded in the
//! report, but `success` only reflects whether probing completed.

use std::convert::Infallible;

use serde::Serialize;
use sladash_core::{CheckKind, RecordSink};

use crate::batch::{BatchResult, BatchSummary, FailedProbe};
use crate::record::CheckRecord;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub kind: CheckKind,
    /// Who triggered the run, e.g. `"api"`, `"scheduler"`, `"cli"`.
    pub source: String,
    /// Skip persistence entirely.
    pub test_mode: bool,
    /// Include full per-unit records instead of the simplified projection.
    pub return_full_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceStatus {
    /// Test mode; nothing was written.
    Skipped,
    Persisted { rows: u64 },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SimplifiedFailure<S> {
    pub error: String,
    pub fallback: S,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "detail", rename_all = "snake_case")]
#[serde(bound(serialize = "U: Serialize, R: CheckRecord"))]
pub enum ReportDetail<U, R: CheckRecord> {
    Full {
        successful: Vec<R>,
        failed: Vec<FailedProbe<U, R>>,
    },
    Simplified {
        successful: Vec<R::Simplified>,
        failed: Vec<SimplifiedFailure<R::Simplified>>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "U: Serialize, R: CheckRecord"))]
pub struct FinalReport<U, R: CheckRecord> {
    pub success: bool,
    pub kind: CheckKind,
    pub source: String,
    pub test_mode: bool,
    pub message: String,
    pub summary: BatchSummary,
    pub persistence: PersistenceStatus,
    pub results: ReportDetail<U, R>,
}

/// Persists the successful records (unless in test mode) and builds the report.
pub async fn reconcile<U, R, S>(
    batch: BatchResult<U, R>,
    sink: &S,
    options: &ReconcileOptions,
) -> FinalReport<U, R>
where
    R: CheckRecord,
    S: RecordSink<R>,
{
    let persistence = persist(&batch.successful, sink, options).await;

    let summary = batch.summary;
    let message = format!(
        "processed {} {} units: {} successful, {} failed",
        summary.total, options.kind, summary.successful, summary.failed
    );

    let results = if options.return_full_data {
        ReportDetail::Full {
            successful: batch.successful,
            failed: batch.failed,
        }
    } else {
        ReportDetail::Simplified {
            successful: batch.successful.iter().map(CheckRecord::simplify).collect(),
            failed: batch
                .failed
                .iter()
                .map(|f| SimplifiedFailure {
                    error: f.error.clone(),
                    fallback: f.fallback.simplify(),
                })
                .collect(),
        }
    };

    FinalReport {
        success: true,
        kind: options.kind,
        source: options.source.clone(),
        test_mode: options.test_mode,
        message,
        summary,
        persistence,
        results,
    }
}

async fn persist<R, S>(records: &[R], sink: &S, options: &ReconcileOptions) -> PersistenceStatus
where
    R: CheckRecord,
    S: RecordSink<R>,
{
    if options.test_mode {
        tracing::info!(kind = %options.kind, "test mode; skipping persistence");
        return PersistenceStatus::Skipped;
    }
    if records.is_empty() {
        return PersistenceStatus::Persisted { rows: 0 };
    }

    match sink.bulk_insert(records).await {
        Ok(rows) => {
            tracing::info!(kind = %options.kind, rows, "persisted check records");
            PersistenceStatus::Persisted { rows }
        }
        Err(e) => {
            tracing::error!(
                kind = %options.kind,
                records = records.len(),
                error = %e,
                "failed to persist check records; report is still returned"
            );
            PersistenceStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Sink that accepts and drops every record. Used when no database is
/// configured for a test-mode run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl<R: Sync> RecordSink<R> for DiscardSink {
    type Error = Infallible;

    async fn bulk_insert(&self, records: &[R]) -> Result<u64, Infallible> {
        Ok(records.len() as u64)
    }
}
