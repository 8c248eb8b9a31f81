//! Behaviour shared by the two record kinds a check can produce.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sladash_core::{
    classify_availability, classify_sla, Availability, AvailabilityBand, AvailabilityRecord,
    PayloadShape, ServiceabilityRecord, ServiceabilityStatus, SlaBand,
};

pub trait CheckRecord: Clone + Send + Sync + Serialize + 'static {
    /// Field-trimmed projection returned when full detail is not requested.
    type Simplified: Clone + std::fmt::Debug + Serialize + Send;

    fn shape(&self) -> PayloadShape;

    fn simplify(&self) -> Self::Simplified;
}

#[derive(Debug, Clone, Serialize)]
pub struct SimplifiedServiceability {
    pub location_name: String,
    pub store_id: String,
    pub store_description: String,
    pub sla_minutes_label: String,
    pub serviceability: ServiceabilityStatus,
    pub band: SlaBand,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimplifiedAvailability {
    pub store_id: String,
    pub item_id: String,
    pub item_name: String,
    pub available: Availability,
    pub band: AvailabilityBand,
    pub checked_at: DateTime<Utc>,
}

impl CheckRecord for ServiceabilityRecord {
    type Simplified = SimplifiedServiceability;

    fn shape(&self) -> PayloadShape {
        self.shape
    }

    fn simplify(&self) -> SimplifiedServiceability {
        SimplifiedServiceability {
            location_name: self.location_name.clone(),
            store_id: self.store_id.clone(),
            store_description: self.store_description.clone(),
            sla_minutes_label: self.sla_minutes_label.clone(),
            serviceability: self.serviceability,
            band: classify_sla(Some(&self.sla_minutes_label)),
            checked_at: self.checked_at,
        }
    }
}

impl CheckRecord for AvailabilityRecord {
    type Simplified = SimplifiedAvailability;

    fn shape(&self) -> PayloadShape {
        self.shape
    }

    fn simplify(&self) -> SimplifiedAvailability {
        SimplifiedAvailability {
            store_id: self.store_id.clone(),
            item_id: self.item_id.clone(),
            item_name: self.item_name.clone(),
            available: self.available,
            band: classify_availability(self.available),
            checked_at: self.checked_at,
        }
    }
}
