//! End-to-end check invocation: load units, probe in batches, reconcile.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sladash_core::{
    load_items, load_locations, load_stores, AppConfig, AvailabilityRecord, CheckKind, Location,
    RecordSink, ServiceabilityRecord, StoreItemPair,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::batch::{
    expand_store_items, run_batch, select_locations, BatchOptions, BatchSummary,
    DEFAULT_BATCH_SIZE,
};
use crate::client::ProbeClient;
use crate::error::{PipelineError, ProbeError};
use crate::fallback::FallbackGenerator;
use crate::prober::{HttpAvailabilityProber, HttpServiceabilityProber};
use crate::reconcile::{reconcile, FinalReport, ReconcileOptions};

/// Tunables for one checker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerConfig {
    pub batch_size: usize,
    pub api_timeout_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            api_timeout_ms: 10_000,
            cooldown_ms: 1_000,
        }
    }
}

impl CheckerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            api_timeout_ms: config.api_timeout_ms,
            cooldown_ms: config.cooldown_ms,
        }
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Paths of the delimited unit lists, re-read on every run.
#[derive(Debug, Clone)]
pub struct UnitSources {
    pub locations_path: PathBuf,
    pub stores_path: PathBuf,
    pub items_path: PathBuf,
}

impl UnitSources {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            locations_path: config.locations_path.clone(),
            stores_path: config.stores_path.clone(),
            items_path: config.items_path.clone(),
        }
    }
}

/// Caller-supplied options for one invocation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckRequest {
    pub source: String,
    /// Location names (serviceability) or item ids (availability).
    pub explicit_unit_ids: Option<Vec<String>>,
    pub test_mode: bool,
    pub return_full_data: bool,
    /// Overrides the configured chunk width for this run.
    pub batch_size: Option<usize>,
}

impl CheckRequest {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }
}

/// Report of either check kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CheckReport {
    Serviceability(FinalReport<Location, ServiceabilityRecord>),
    Availability(FinalReport<StoreItemPair, AvailabilityRecord>),
}

impl CheckReport {
    #[must_use]
    pub fn summary(&self) -> &BatchSummary {
        match self {
            CheckReport::Serviceability(r) => &r.summary,
            CheckReport::Availability(r) => &r.summary,
        }
    }
}

/// Rejects overlapping runs of the same check kind.
///
/// Clones share the same locks, so the HTTP trigger and the scheduler
/// can hold one guard between them.
#[derive(Debug, Clone, Default)]
pub struct CheckGuard {
    serviceability: Arc<Mutex<()>>,
    availability: Arc<Mutex<()>>,
}

impl CheckGuard {
    /// Takes the run slot for `kind`; released when the returned guard drops.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyRunning`] if a run of `kind` holds it.
    pub fn try_acquire(&self, kind: CheckKind) -> Result<OwnedMutexGuard<()>, PipelineError> {
        let lock = match kind {
            CheckKind::Serviceability => &self.serviceability,
            CheckKind::Availability => &self.availability,
        };
        Arc::clone(lock)
            .try_lock_owned()
            .map_err(|_| PipelineError::AlreadyRunning { kind })
    }
}

/// Runs serviceability and availability checks against the commerce API.
pub struct Checker {
    client: Arc<ProbeClient>,
    fallback: Arc<dyn FallbackGenerator>,
    config: CheckerConfig,
    sources: UnitSources,
    guard: CheckGuard,
}

impl Checker {
    #[must_use]
    pub fn new(
        client: ProbeClient,
        fallback: Arc<dyn FallbackGenerator>,
        config: CheckerConfig,
        sources: UnitSources,
    ) -> Self {
        Self {
            client: Arc::new(client),
            fallback,
            config,
            sources,
            guard: CheckGuard::default(),
        }
    }

    /// Builds the API client and checker from application config.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the API client cannot be constructed.
    pub fn from_app_config(
        config: &AppConfig,
        fallback: Arc<dyn FallbackGenerator>,
    ) -> Result<Self, ProbeError> {
        let client = ProbeClient::new(
            &config.api_base_url,
            config.api_timeout_ms,
            &config.api_user_agent,
        )?;
        Ok(Self::new(
            client,
            fallback,
            CheckerConfig::from_app_config(config),
            UnitSources::from_app_config(config),
        ))
    }

    #[must_use]
    pub fn guard(&self) -> &CheckGuard {
        &self.guard
    }

    /// Runs the check of the given kind.
    ///
    /// # Errors
    ///
    /// See [`Self::run_serviceability`] and [`Self::run_availability`].
    pub async fn run_check<S>(
        &self,
        kind: CheckKind,
        request: &CheckRequest,
        sink: &S,
    ) -> Result<CheckReport, PipelineError>
    where
        S: RecordSink<ServiceabilityRecord> + RecordSink<AvailabilityRecord>,
    {
        match kind {
            CheckKind::Serviceability => self
                .run_serviceability(request, sink)
                .await
                .map(CheckReport::Serviceability),
            CheckKind::Availability => self
                .run_availability(request, sink)
                .await
                .map(CheckReport::Availability),
        }
    }

    /// Probes every configured location (or the named subset).
    ///
    /// # Errors
    ///
    /// - [`PipelineError::AlreadyRunning`] if a serviceability run is in progress.
    /// - [`PipelineError::InvalidRequest`] for a zero batch size.
    /// - [`PipelineError::UnitLoad`] if the location list cannot be read.
    pub async fn run_serviceability<S>(
        &self,
        request: &CheckRequest,
        sink: &S,
    ) -> Result<FinalReport<Location, ServiceabilityRecord>, PipelineError>
    where
        S: RecordSink<ServiceabilityRecord>,
    {
        let kind = CheckKind::Serviceability;
        let options = self.batch_options(request)?;
        let _running = self.guard.try_acquire(kind)?;

        let locations = load_locations(&self.sources.locations_path)?;
        let units = select_locations(&locations, request.explicit_unit_ids.as_deref());
        tracing::info!(
            kind = %kind,
            source = %request.source,
            units = units.len(),
            test_mode = request.test_mode,
            "starting check"
        );

        let prober =
            HttpServiceabilityProber::new(Arc::clone(&self.client), Arc::clone(&self.fallback));
        let batch = run_batch(&prober, &units, options).await;
        let report = reconcile(batch, sink, &self.reconcile_options(kind, request)).await;

        log_finished(kind, &report.summary);
        Ok(report)
    }

    /// Probes every store × item pair (or store × the requested item ids).
    ///
    /// # Errors
    ///
    /// - [`PipelineError::AlreadyRunning`] if an availability run is in progress.
    /// - [`PipelineError::InvalidRequest`] for a zero batch size.
    /// - [`PipelineError::UnitLoad`] if the store or item list cannot be read.
    pub async fn run_availability<S>(
        &self,
        request: &CheckRequest,
        sink: &S,
    ) -> Result<FinalReport<StoreItemPair, AvailabilityRecord>, PipelineError>
    where
        S: RecordSink<AvailabilityRecord>,
    {
        let kind = CheckKind::Availability;
        let options = self.batch_options(request)?;
        let _running = self.guard.try_acquire(kind)?;

        let stores = load_stores(&self.sources.stores_path)?;
        let items = load_items(&self.sources.items_path)?;
        let units = expand_store_items(&stores, &items, request.explicit_unit_ids.as_deref());
        tracing::info!(
            kind = %kind,
            source = %request.source,
            stores = stores.len(),
            units = units.len(),
            test_mode = request.test_mode,
            "starting check"
        );

        let prober =
            HttpAvailabilityProber::new(Arc::clone(&self.client), Arc::clone(&self.fallback));
        let batch = run_batch(&prober, &units, options).await;
        let report = reconcile(batch, sink, &self.reconcile_options(kind, request)).await;

        log_finished(kind, &report.summary);
        Ok(report)
    }

    fn batch_options(&self, request: &CheckRequest) -> Result<BatchOptions, PipelineError> {
        let batch_size = match request.batch_size {
            Some(0) => {
                return Err(PipelineError::InvalidRequest(
                    "batch_size must be at least 1".to_string(),
                ))
            }
            Some(n) => n,
            None => self.config.batch_size,
        };
        Ok(BatchOptions {
            batch_size,
            cooldown: self.config.cooldown(),
        })
    }

    fn reconcile_options(&self, kind: CheckKind, request: &CheckRequest) -> ReconcileOptions {
        ReconcileOptions {
            kind,
            source: request.source.clone(),
            test_mode: request.test_mode,
            return_full_data: request.return_full_data,
        }
    }
}

fn log_finished(kind: CheckKind, summary: &BatchSummary) {
    tracing::info!(
        kind = %kind,
        total = summary.total,
        successful = summary.successful,
        failed = summary.failed,
        unrecognized = summary.unrecognized,
        duration_seconds = summary.duration_seconds,
        "check finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejects_overlapping_runs_of_same_kind() {
        let guard = CheckGuard::default();
        let held = guard.try_acquire(CheckKind::Serviceability).unwrap();

        let shared = guard.clone();
        let err = shared.try_acquire(CheckKind::Serviceability).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AlreadyRunning {
                kind: CheckKind::Serviceability
            }
        ));

        assert!(
            guard.try_acquire(CheckKind::Availability).is_ok(),
            "other kinds are independent"
        );

        drop(held);
        assert!(guard.try_acquire(CheckKind::Serviceability).is_ok());
    }

    #[test]
    fn checker_config_cooldown_is_milliseconds() {
        let config = CheckerConfig {
            cooldown_ms: 250,
            ..CheckerConfig::default()
        };
        assert_eq!(config.cooldown(), Duration::from_millis(250));
    }

    #[test]
    fn check_request_deserializes_with_defaults() {
        let request: CheckRequest = serde_json::from_str(r#"{"test_mode": true}"#).unwrap();
        assert!(request.test_mode);
        assert!(!request.return_full_data);
        assert!(request.explicit_unit_ids.is_none());
        assert_eq!(request.batch_size, None);
    }
}
