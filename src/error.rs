use std::collections::TryReserveError;

/// Errors from the fallible growth paths (`try_reserve`,
/// `try_with_capacity_and_policy`). Everything else either succeeds or
/// aborts on allocation failure.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to allocate a bucket array of {buckets} buckets")]
    BucketAlloc {
        buckets: usize,
        #[source]
        source: TryReserveError,
    },
}
