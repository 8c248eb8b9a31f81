use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sladash_core::{
    AvailabilityRecord, Location, PayloadShape, ServiceabilityRecord, StoreItemPair,
};

use crate::client::ProbeClient;
use crate::fallback::FallbackGenerator;
use crate::normalize::{normalize_availability, normalize_serviceability};
use crate::record::CheckRecord;

/// Result of probing one work unit. Both arms carry a usable record.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome<U, R> {
    Success {
        unit: U,
        record: R,
        http_status: u16,
        checked_at: DateTime<Utc>,
    },
    Failure {
        unit: U,
        error: String,
        checked_at: DateTime<Utc>,
        fallback: R,
    },
}

impl<U, R> ProbeOutcome<U, R> {
    #[must_use]
    pub fn record(&self) -> &R {
        match self {
            ProbeOutcome::Success { record, .. } => record,
            ProbeOutcome::Failure { fallback, .. } => fallback,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }
}

/// One outbound call plus extraction for a single unit.
///
/// Implementations never fail: transport problems become
/// [`ProbeOutcome::Failure`] with a synthesized record.
pub trait Prober: Send + Sync {
    type Unit: Clone + Send + Sync + Serialize;
    type Record: CheckRecord;

    fn probe(
        &self,
        unit: &Self::Unit,
    ) -> impl Future<Output = ProbeOutcome<Self::Unit, Self::Record>> + Send;
}

/// Probes store serviceability for delivery locations.
#[derive(Clone)]
pub struct HttpServiceabilityProber {
    client: Arc<ProbeClient>,
    fallback: Arc<dyn FallbackGenerator>,
}

impl HttpServiceabilityProber {
    pub fn new(client: Arc<ProbeClient>, fallback: Arc<dyn FallbackGenerator>) -> Self {
        Self { client, fallback }
    }
}

impl Prober for HttpServiceabilityProber {
    type Unit = Location;
    type Record = ServiceabilityRecord;

    async fn probe(&self, location: &Location) -> ProbeOutcome<Location, ServiceabilityRecord> {
        let checked_at = Utc::now();
        match self
            .client
            .fetch_serviceability(location.latitude, location.longitude)
            .await
        {
            Ok(response) => {
                let record = normalize_serviceability(Some(&response.body), location, checked_at);
                log_unrecognized(record.shape, &location.name);
                ProbeOutcome::Success {
                    unit: location.clone(),
                    record,
                    http_status: response.status,
                    checked_at,
                }
            }
            Err(e) => {
                tracing::warn!(
                    location = %location.name,
                    error = %e,
                    "serviceability probe failed; substituting fallback"
                );
                ProbeOutcome::Failure {
                    unit: location.clone(),
                    error: e.to_string(),
                    checked_at,
                    fallback: self.fallback.serviceability(location, checked_at),
                }
            }
        }
    }
}

/// Probes item availability for store × item pairs.
#[derive(Clone)]
pub struct HttpAvailabilityProber {
    client: Arc<ProbeClient>,
    fallback: Arc<dyn FallbackGenerator>,
}

impl HttpAvailabilityProber {
    pub fn new(client: Arc<ProbeClient>, fallback: Arc<dyn FallbackGenerator>) -> Self {
        Self { client, fallback }
    }
}

impl Prober for HttpAvailabilityProber {
    type Unit = StoreItemPair;
    type Record = AvailabilityRecord;

    async fn probe(&self, pair: &StoreItemPair) -> ProbeOutcome<StoreItemPair, AvailabilityRecord> {
        let checked_at = Utc::now();
        match self
            .client
            .fetch_item(&pair.store_id, &pair.item_id, pair.latitude, pair.longitude)
            .await
        {
            Ok(response) => {
                let record = normalize_availability(Some(&response.body), pair, checked_at);
                log_unrecognized(record.shape, &format!("{}/{}", pair.store_id, pair.item_id));
                ProbeOutcome::Success {
                    unit: pair.clone(),
                    record,
                    http_status: response.status,
                    checked_at,
                }
            }
            Err(e) => {
                tracing::warn!(
                    store_id = %pair.store_id,
                    item_id = %pair.item_id,
                    error = %e,
                    "availability probe failed; substituting fallback"
                );
                ProbeOutcome::Failure {
                    unit: pair.clone(),
                    error: e.to_string(),
                    checked_at,
                    fallback: self.fallback.availability(pair, checked_at),
                }
            }
        }
    }
}

fn log_unrecognized(shape: PayloadShape, unit: &str) {
    if matches!(shape, PayloadShape::Unrecognized | PayloadShape::Malformed) {
        tracing::warn!(unit, shape = shape.as_str(), "response did not match a known shape");
    }
}
