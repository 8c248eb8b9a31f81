use std::future::Future;

/// Destination for a run's successful records.
///
/// Implementations write the whole slice in a single round trip and return
/// the number of rows written. Errors are reported, never panicked on; the
/// caller decides whether a failed write is fatal.
pub trait RecordSink<R>: Send + Sync {
    type Error: std::fmt::Display + Send;

    fn bulk_insert(&self, records: &[R]) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}
