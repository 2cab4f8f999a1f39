use std::sync::Arc;
use std::time::Duration;

use subterm_subtitle_api::JobState;
use subterm_viewer_core::{PollOutcome, SessionEvent, ViewerConfig, ViewerContext};
use tokio::task::JoinHandle;

use crate::runtime::CliRuntime;
use crate::{Api, WatchArgs};

async fn settle(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "viewer_task_failed");
        }
    }
}

/// Polls `task_id` to completion, then attaches the tracks and replays the
/// requested playback positions.
pub async fn run(
    api: Arc<Api>,
    task_id: String,
    args: WatchArgs,
    timeout: Duration,
    json: bool,
) -> anyhow::Result<()> {
    let config = ViewerConfig::default()
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms))
        .with_fetch_timeout(timeout)
        .with_glossary_mode(args.mode.into())
        .with_source_language(Some(args.source_lang));

    let ctx = ViewerContext::new(api, Arc::new(CliRuntime::new(json)), config);
    let session = ctx.session(task_id.clone());
    session.start_polling();

    let outcome = tokio::select! {
        outcome = session.join_poller() => outcome,
        _ = tokio::signal::ctrl_c() => None,
    };
    match outcome {
        Some(PollOutcome::Terminal(JobState::Success)) => {}
        Some(PollOutcome::Terminal(state)) => {
            session.close();
            anyhow::bail!("job {task_id} ended in state {state}");
        }
        Some(PollOutcome::Cancelled) | None => {
            session.close();
            return Ok(());
        }
    }

    settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
    if let Some(language) = args.lang {
        settle(session.dispatch(SessionEvent::SelectLanguage(language))).await;
    }
    for position in args.at {
        settle(session.dispatch(SessionEvent::TimeUpdate(position))).await;
    }

    session.close();
    Ok(())
}
