use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::{Error, Result, ViewerConfig};

const MIN_RETRY_DELAY: Duration = Duration::from_millis(200);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::Timeout(timeout))?
}

/// Bounded timeout per attempt plus jittered exponential backoff on
/// transient failures.
pub(crate) async fn with_retry<T, F, Fut>(
    config: &ViewerConfig,
    operation: &'static str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let timeout = config.fetch_timeout();
    let backoff = ExponentialBuilder::default()
        .with_jitter()
        .with_min_delay(MIN_RETRY_DELAY)
        .with_max_delay(MAX_RETRY_DELAY)
        .with_max_times(config.fetch_retries);

    (|| with_timeout(timeout, attempt()))
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .when(Error::is_transient)
        .notify(|err, dur| {
            tracing::warn!(
                operation,
                error = %err,
                retry_delay_ms = dur.as_millis() as u64,
                "retrying_fetch"
            );
        })
        .await
}
