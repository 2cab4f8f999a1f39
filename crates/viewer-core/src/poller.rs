use std::sync::Arc;

use subterm_subtitle_api::{JobState, JobStatus};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::ViewerConfig;
use crate::backend::ViewerBackend;
use crate::fetch::with_retry;

pub trait StatusSink: Send + Sync + 'static {
    fn on_status(&self, status: JobStatus);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Terminal(JobState),
    Cancelled,
}

/// Single owner of a running poll loop.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn join(self) -> PollOutcome {
        self.task.await.unwrap_or(PollOutcome::Cancelled)
    }
}

/// Polls `task_id` every `poll_interval` until the job reaches a terminal
/// state or the handle is stopped. Failed polls are logged and skipped.
pub fn spawn_poller<B, S>(
    backend: Arc<B>,
    task_id: String,
    config: ViewerConfig,
    sink: S,
) -> PollerHandle
where
    B: ViewerBackend,
    S: StatusSink,
{
    let cancel = CancellationToken::new();
    let span = tracing::info_span!("job_poller", task_id = %task_id);
    let task = tokio::spawn(
        poll_loop(backend, task_id, config, sink, cancel.clone()).instrument(span),
    );
    PollerHandle { cancel, task }
}

async fn poll_loop<B: ViewerBackend, S: StatusSink>(
    backend: Arc<B>,
    task_id: String,
    config: ViewerConfig,
    sink: S,
    cancel: CancellationToken,
) -> PollOutcome {
    let mut interval = tokio::time::interval(config.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = interval.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            result = with_retry(&config, "job_status", || backend.job_status(&task_id)) => result,
        };

        match result {
            Ok(status) => {
                let state = status.state;
                tracing::debug!(%state, progress = status.progress, "job_status");
                sink.on_status(status);
                if state.is_terminal() {
                    tracing::info!(%state, "poll_finished");
                    return PollOutcome::Terminal(state);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "poll_failed");
            }
        }
    }
}
