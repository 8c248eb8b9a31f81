pub mod batch;
pub mod client;
pub mod error;
pub mod fallback;
pub mod normalize;
pub mod pipeline;
pub mod prober;
pub mod reconcile;
pub mod record;

pub use batch::{
    expand_store_items, run_batch, select_locations, BatchOptions, BatchResult, BatchSummary,
    FailedProbe,
};
pub use client::{ProbeClient, ProbeResponse, DEFAULT_LOCATION_HEADER};
pub use error::{PipelineError, ProbeError};
pub use fallback::{FallbackGenerator, FixedFallback, RandomFallback};
pub use normalize::{normalize_availability, normalize_serviceability};
pub use pipeline::{CheckGuard, CheckReport, CheckRequest, Checker, CheckerConfig, UnitSources};
pub use prober::{HttpAvailabilityProber, HttpServiceabilityProber, ProbeOutcome, Prober};
pub use reconcile::{
    reconcile, DiscardSink, FinalReport, PersistenceStatus, ReconcileOptions, ReportDetail,
    SimplifiedFailure,
};
pub use record::{CheckRecord, SimplifiedAvailability, SimplifiedServiceability};
