//! Synthesized records substituted for failed probes.

use chrono::{DateTime, Utc};
use rand::Rng;
use sladash_core::{
    Availability, AvailabilityRecord, Location, PayloadShape, ServiceabilityRecord,
    ServiceabilityStatus, StoreItemPair, SLA_WARNING_MAX_MINUTES,
};

use crate::normalize::DEFAULT_STORE_DESCRIPTION;

/// Produces a structurally complete record for a unit whose probe failed.
///
/// Injected into the probers so production can emit plausible random values
/// while tests and `--deterministic-fallback` runs get fixed ones.
pub trait FallbackGenerator: Send + Sync {
    fn serviceability(&self, location: &Location, checked_at: DateTime<Utc>)
        -> ServiceabilityRecord;

    fn availability(&self, pair: &StoreItemPair, checked_at: DateTime<Utc>) -> AvailabilityRecord;
}

/// Pseudo-random plausible values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomFallback;

impl FallbackGenerator for RandomFallback {
    fn serviceability(
        &self,
        location: &Location,
        checked_at: DateTime<Utc>,
    ) -> ServiceabilityRecord {
        let mut rng = rand::rng();
        let store_id = rng.random_range(1000..10_000_u32).to_string();
        let minutes = rng.random_range(8..=SLA_WARNING_MAX_MINUTES);
        let serviceability = if rng.random_bool(0.85) {
            ServiceabilityStatus::Serviceable
        } else {
            ServiceabilityStatus::NotServiceable
        };

        synthesized_serviceability(
            location,
            checked_at,
            store_id,
            format!("{minutes} MINS"),
            serviceability,
        )
    }

    fn availability(&self, pair: &StoreItemPair, checked_at: DateTime<Utc>) -> AvailabilityRecord {
        let available = rand::rng().random_bool(0.7);
        synthesized_availability(pair, checked_at, Availability::from(Some(available)))
    }
}

/// Fixed values, for deterministic runs.
#[derive(Debug, Clone)]
pub struct FixedFallback {
    pub store_id: String,
    pub sla_minutes_label: String,
    pub serviceability: ServiceabilityStatus,
    pub available: Availability,
}

impl Default for FixedFallback {
    fn default() -> Self {
        Self {
            store_id: "0000".to_string(),
            sla_minutes_label: "30 MINS".to_string(),
            serviceability: ServiceabilityStatus::Serviceable,
            available: Availability::Unavailable,
        }
    }
}

impl FallbackGenerator for FixedFallback {
    fn serviceability(
        &self,
        location: &Location,
        checked_at: DateTime<Utc>,
    ) -> ServiceabilityRecord {
        synthesized_serviceability(
            location,
            checked_at,
            self.store_id.clone(),
            self.sla_minutes_label.clone(),
            self.serviceability,
        )
    }

    fn availability(&self, pair: &StoreItemPair, checked_at: DateTime<Utc>) -> AvailabilityRecord {
        synthesized_availability(pair, checked_at, self.available)
    }
}

fn synthesized_serviceability(
    location: &Location,
    checked_at: DateTime<Utc>,
    store_id: String,
    sla_minutes_label: String,
    serviceability: ServiceabilityStatus,
) -> ServiceabilityRecord {
    ServiceabilityRecord {
        store_id,
        store_description: DEFAULT_STORE_DESCRIPTION.to_string(),
        store_locality: location.name.clone(),
        sla_minutes_label,
        serviceability,
        shape: PayloadShape::Synthesized,
        ..ServiceabilityRecord::unknown(location, checked_at)
    }
}

fn synthesized_availability(
    pair: &StoreItemPair,
    checked_at: DateTime<Utc>,
    available: Availability,
) -> AvailabilityRecord {
    let base = AvailabilityRecord::unknown(pair, checked_at);
    AvailabilityRecord {
        item_name: base.item_internal_name.clone(),
        store_description: DEFAULT_STORE_DESCRIPTION.to_string(),
        available,
        shape: PayloadShape::Synthesized,
        ..base
    }
}
