pub mod app_config;
pub mod classify;
pub mod config;
pub mod records;
pub mod sink;
pub mod units;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use classify::{
    classify_availability, classify_sla, sla_minutes, AvailabilityBand, SlaBand,
    SLA_SUCCESS_MAX_MINUTES, SLA_WARNING_MAX_MINUTES,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    Availability, AvailabilityRecord, Coordinates, PayloadShape, ServiceabilityRecord,
    ServiceabilityStatus, Spot, UNKNOWN,
};
pub use sink::RecordSink;
pub use units::{
    load_items, load_locations, load_stores, CheckKind, Item, Location, Store, StoreItemPair,
    UnitLoadError,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
