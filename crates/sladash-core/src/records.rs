//! Internal record shapes persisted for every check.
//!
//! Fields the upstream payload did not provide carry [`UNKNOWN`] rather than
//! being absent, so every record is structurally complete. The availability
//! tri-state uses its own `Unknown` variant, serialized as JSON `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::units::{Location, StoreItemPair};

/// Sentinel for string fields the payload did not provide.
pub const UNKNOWN: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceabilityStatus {
    Serviceable,
    NotServiceable,
    Unknown,
}

impl ServiceabilityStatus {
    /// Map an upstream status string. Anything unrecognised is `Unknown`.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "SERVICEABLE" => ServiceabilityStatus::Serviceable,
            "NOT_SERVICEABLE" | "UNSERVICEABLE" | "NON_SERVICEABLE" => {
                ServiceabilityStatus::NotServiceable
            }
            _ => ServiceabilityStatus::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceabilityStatus::Serviceable => "SERVICEABLE",
            ServiceabilityStatus::NotServiceable => "NOT_SERVICEABLE",
            ServiceabilityStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Tri-state item availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

impl Availability {
    #[must_use]
    pub fn as_option(self) -> Option<bool> {
        self.into()
    }
}

impl From<Option<bool>> for Availability {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Availability::Available,
            Some(false) => Availability::Unavailable,
            None => Availability::Unknown,
        }
    }
}

impl From<Availability> for Option<bool> {
    fn from(value: Availability) -> Self {
        match value {
            Availability::Available => Some(true),
            Availability::Unavailable => Some(false),
            Availability::Unknown => None,
        }
    }
}

/// How much of the upstream payload the normalizer understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// Every expected field was present.
    Recognized,
    /// Some fields were present; the rest carry sentinels.
    Partial,
    /// Nothing recognisable; every field carries a sentinel.
    Unrecognized,
    /// A nested block had the wrong JSON type.
    Malformed,
    /// Produced by a fallback generator after a failed probe.
    Synthesized,
}

impl PayloadShape {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadShape::Recognized => "recognized",
            PayloadShape::Partial => "partial",
            PayloadShape::Unrecognized => "unrecognized",
            PayloadShape::Malformed => "malformed",
            PayloadShape::Synthesized => "synthesized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Pickup spot metadata reported alongside a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    pub name: String,
    pub area: String,
    pub city: String,
}

impl Spot {
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            area: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceabilityRecord {
    pub location_name: String,
    pub coordinates: Coordinates,
    pub store_id: String,
    pub store_description: String,
    pub store_locality: String,
    /// Upstream SLA label, e.g. `"15 MINS"`.
    pub sla_minutes_label: String,
    pub serviceability: ServiceabilityStatus,
    pub checked_at: DateTime<Utc>,
    pub shape: PayloadShape,
}

impl ServiceabilityRecord {
    /// An all-sentinel record for `location`.
    #[must_use]
    pub fn unknown(location: &Location, checked_at: DateTime<Utc>) -> Self {
        Self {
            location_name: location.name.clone(),
            coordinates: Coordinates {
                latitude: location.latitude,
                longitude: location.longitude,
            },
            store_id: UNKNOWN.to_string(),
            store_description: UNKNOWN.to_string(),
            store_locality: UNKNOWN.to_string(),
            sla_minutes_label: UNKNOWN.to_string(),
            serviceability: ServiceabilityStatus::Unknown,
            checked_at,
            shape: PayloadShape::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub store_id: String,
    pub item_id: String,
    /// Name from the unit list, or the sentinel when the list has none.
    pub item_internal_name: String,
    /// Display name reported upstream.
    pub item_name: String,
    pub brand: String,
    pub category: String,
    pub available: Availability,
    pub store_locality: String,
    pub store_description: String,
    pub spot: Spot,
    pub coordinates: Coordinates,
    pub checked_at: DateTime<Utc>,
    pub shape: PayloadShape,
}

impl AvailabilityRecord {
    /// An all-sentinel record for `pair`.
    #[must_use]
    pub fn unknown(pair: &StoreItemPair, checked_at: DateTime<Utc>) -> Self {
        Self {
            store_id: pair.store_id.clone(),
            item_id: pair.item_id.clone(),
            item_internal_name: pair
                .item_name
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            item_name: UNKNOWN.to_string(),
            brand: UNKNOWN.to_string(),
            category: UNKNOWN.to_string(),
            available: Availability::Unknown,
            store_locality: UNKNOWN.to_string(),
            store_description: UNKNOWN.to_string(),
            spot: Spot::unknown(),
            coordinates: Coordinates {
                latitude: pair.latitude,
                longitude: pair.longitude,
            },
            checked_at,
            shape: PayloadShape::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serviceability_status_accepts_spelling_variants() {
        assert_eq!(
            ServiceabilityStatus::from_raw("serviceable"),
            ServiceabilityStatus::Serviceable
        );
        assert_eq!(
            ServiceabilityStatus::from_raw("Not Serviceable"),
            ServiceabilityStatus::NotServiceable
        );
        assert_eq!(
            ServiceabilityStatus::from_raw("UNSERVICEABLE"),
            ServiceabilityStatus::NotServiceable
        );
        assert_eq!(
            ServiceabilityStatus::from_raw("PARTIALLY_SERVICEABLE"),
            ServiceabilityStatus::Unknown
        );
    }

    #[test]
    fn availability_serializes_as_nullable_bool() {
        assert_eq!(
            serde_json::to_string(&Availability::Available).unwrap(),
            "true"
        );
        assert_eq!(
            serde_json::to_string(&Availability::Unavailable).unwrap(),
            "false"
        );
        assert_eq!(serde_json::to_string(&Availability::Unknown).unwrap(), "null");

        let parsed: Availability = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, Availability::Unknown);
    }

    #[test]
    fn unknown_availability_record_keeps_unit_identity() {
        let pair = StoreItemPair {
            store_id: "1001".to_string(),
            latitude: 12.97,
            longitude: 77.59,
            item_id: "A1B2".to_string(),
            item_name: Some("Amul Milk 500ml".to_string()),
        };
        let record = AvailabilityRecord::unknown(&pair, Utc::now());
        assert_eq!(record.store_id, "1001");
        assert_eq!(record.item_id, "A1B2");
        assert_eq!(record.item_internal_name, "Amul Milk 500ml");
        assert_eq!(record.item_name, UNKNOWN);
        assert_eq!(record.available, Availability::Unknown);
        assert_eq!(record.shape, PayloadShape::Unrecognized);
    }

    #[test]
    fn serviceability_record_serializes_status_in_upper_case() {
        let location = Location {
            name: "Indiranagar".to_string(),
            latitude: 12.9784,
            longitude: 77.6408,
        };
        let record = ServiceabilityRecord::unknown(&location, Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["serviceability"], "UNKNOWN");
        assert_eq!(json["shape"], "unrecognized");
        assert_eq!(json["store_id"], UNKNOWN);
    }
}
