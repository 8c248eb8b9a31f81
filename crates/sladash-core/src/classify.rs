//! Severity bands for SLA labels and availability values.
//!
//! Shared by the check pipeline and the read API so both colour results the
//! same way.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::records::Availability;

/// Labels at or under this many minutes are healthy.
pub const SLA_SUCCESS_MAX_MINUTES: u32 = 20;
/// Labels at or under this many minutes (and above the success limit) warn.
pub const SLA_WARNING_MAX_MINUTES: u32 = 30;

static MINUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("valid minutes regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlaBand {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityBand {
    Available,
    Unavailable,
    Unknown,
}

/// Extract the first integer from an SLA label such as `"15 Mins"`.
#[must_use]
pub fn sla_minutes(label: &str) -> Option<u32> {
    MINUTES_RE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Band an SLA label. Absent or unparsable labels are `Error`.
#[must_use]
pub fn classify_sla(label: Option<&str>) -> SlaBand {
    match label.and_then(sla_minutes) {
        Some(minutes) if minutes <= SLA_SUCCESS_MAX_MINUTES => SlaBand::Success,
        Some(minutes) if minutes <= SLA_WARNING_MAX_MINUTES => SlaBand::Warning,
        _ => SlaBand::Error,
    }
}

#[must_use]
pub fn classify_availability(available: Availability) -> AvailabilityBand {
    match available {
        Availability::Available => AvailabilityBand::Available,
        Availability::Unavailable => AvailabilityBand::Unavailable,
        Availability::Unknown => AvailabilityBand::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sla_bands_follow_minute_thresholds() {
        assert_eq!(classify_sla(Some("15 Mins")), SlaBand::Success);
        assert_eq!(classify_sla(Some("25 Mins")), SlaBand::Warning);
        assert_eq!(classify_sla(Some("45 Mins")), SlaBand::Error);
        assert_eq!(classify_sla(None), SlaBand::Error);
    }

    #[test]
    fn sla_boundaries_are_inclusive() {
        assert_eq!(classify_sla(Some("20 MINS")), SlaBand::Success);
        assert_eq!(classify_sla(Some("21 MINS")), SlaBand::Warning);
        assert_eq!(classify_sla(Some("30")), SlaBand::Warning);
        assert_eq!(classify_sla(Some("31 mins")), SlaBand::Error);
    }

    #[test]
    fn unparsable_sla_label_is_error() {
        assert_eq!(classify_sla(Some("UNKNOWN")), SlaBand::Error);
        assert_eq!(classify_sla(Some("")), SlaBand::Error);
    }

    #[test]
    fn sla_minutes_takes_first_number() {
        assert_eq!(sla_minutes("10-15 mins"), Some(10));
        assert_eq!(sla_minutes("soon"), None);
    }

    #[test]
    fn availability_bands_cover_tri_state() {
        assert_eq!(
            classify_availability(Some(true).into()),
            AvailabilityBand::Available
        );
        assert_eq!(
            classify_availability(Some(false).into()),
            AvailabilityBand::Unavailable
        );
        assert_eq!(
            classify_availability(Availability::from(None)),
            AvailabilityBand::Unknown
        );
    }

    #[test]
    fn bands_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&SlaBand::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(
            serde_json::to_string(&AvailabilityBand::Unknown).unwrap(),
            "\"unknown\""
        );
    }
}
