use std::sync::{Arc, Mutex, Weak};

use subterm_subtitle_api::{JobState, JobStatus, TrackResources, canonical_language};
use subterm_timed_text::Cue;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::backend::ViewerBackend;
use crate::events::{JobEvent, PanelEvent, SubtitleTextEvent, TrackEvent};
use crate::fetch::{with_retry, with_timeout};
use crate::glossary::{CacheKey, GlossaryCache, GlossaryPanel, Resolution};
use crate::poller::{PollOutcome, PollerHandle, StatusSink, spawn_poller};
use crate::runtime::ViewerRuntime;
use crate::selection::ActiveSelection;
use crate::sync::{CueChange, CueSynchronizer};
use crate::tracks::{BindingState, TrackManager, TrackMode};
use crate::{GlossaryMode, ViewerConfig, lock};

/// Shared by every session of one viewer: backend, event sink and the
/// process-wide glossary cache.
pub struct ViewerContext<B, R> {
    backend: Arc<B>,
    runtime: Arc<R>,
    cache: Arc<GlossaryCache<B>>,
    config: ViewerConfig,
}

impl<B: ViewerBackend, R: ViewerRuntime> ViewerContext<B, R> {
    pub fn new(backend: Arc<B>, runtime: Arc<R>, config: ViewerConfig) -> Arc<Self> {
        let cache = Arc::new(GlossaryCache::new(backend.clone(), config.clone()));
        Arc::new(Self {
            backend,
            runtime,
            cache,
            config,
        })
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn cache(&self) -> &Arc<GlossaryCache<B>> {
        &self.cache
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn session(self: &Arc<Self>, task_id: impl Into<String>) -> Arc<Session<B, R>> {
        Session::new(self.clone(), task_id.into())
    }
}

/// Inputs to a session. Playback and selector events come from the host;
/// track and status events also arrive from the session's own tasks.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Status(JobStatus),
    TracksAvailable(TrackResources),
    TrackLoaded { language: String, cues: Vec<Cue> },
    TrackLoadFailed { language: String, error: String },
    MetadataLoaded,
    SelectLanguage(String),
    TimeUpdate(f64),
}

struct SessionState {
    tracks: TrackManager,
    selection: ActiveSelection,
    sync: CueSynchronizer,
    job_state: Option<JobState>,
    media_ready: bool,
    closed: bool,
}

#[derive(Default)]
struct Polling {
    cancel: Option<CancellationToken>,
    handle: Option<PollerHandle>,
}

type Handles = Vec<JoinHandle<()>>;

/// One viewed job. All state transitions happen synchronously in
/// [`Session::dispatch`]; network work runs on spawned tasks whose handles
/// are returned to the caller.
pub struct Session<B, R> {
    task_id: String,
    ctx: Arc<ViewerContext<B, R>>,
    state: Mutex<SessionState>,
    polling: Mutex<Polling>,
    span: tracing::Span,
}

impl<B: ViewerBackend, R: ViewerRuntime> Session<B, R> {
    fn new(ctx: Arc<ViewerContext<B, R>>, task_id: String) -> Arc<Self> {
        let selection = ActiveSelection::new(
            ctx.config.source_language.as_deref(),
            ctx.config.fallback_language.as_deref(),
        );
        let span = tracing::info_span!("viewer_session", task_id = %task_id);
        Arc::new(Self {
            task_id,
            ctx,
            state: Mutex::new(SessionState {
                tracks: TrackManager::new(),
                selection,
                sync: CueSynchronizer::new(),
                job_state: None,
                media_ready: false,
                closed: false,
            }),
            polling: Mutex::new(Polling::default()),
            span,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn languages(&self) -> Vec<String> {
        lock(&self.state).tracks.languages()
    }

    pub fn selected_language(&self) -> Option<String> {
        lock(&self.state).selection.current().map(str::to_string)
    }

    pub fn showing_language(&self) -> Option<String> {
        lock(&self.state).tracks.showing().map(|t| t.language.clone())
    }

    pub fn track_mode(&self, language: &str) -> Option<TrackMode> {
        lock(&self.state).tracks.track(language).map(|t| t.mode)
    }

    pub fn binding_state(&self, language: &str) -> BindingState {
        lock(&self.state).tracks.binding_state(language)
    }

    pub fn job_state(&self) -> Option<JobState> {
        lock(&self.state).job_state
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub fn dispatch(self: &Arc<Self>, event: SessionEvent) -> Vec<JoinHandle<()>> {
        let _entered = self.span.enter();
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        if state.closed {
            tracing::debug!(?event, "event_after_close");
            return Vec::new();
        }

        match event {
            SessionEvent::Status(status) => self.on_status(state, status),
            SessionEvent::TracksAvailable(resources) => self.on_tracks(state, &resources),
            SessionEvent::TrackLoaded { language, cues } => {
                tracing::debug!(%language, cue_count = cues.len(), "track_loaded");
                state.tracks.mark_loaded(&language, cues);
                if state.sync.bound_language() != Some(language.as_str()) {
                    return Vec::new();
                }
                state
                    .sync
                    .refresh(&state.tracks)
                    .map(|change| vec![self.spawn_render(change)])
                    .unwrap_or_default()
            }
            SessionEvent::TrackLoadFailed { language, error } => {
                tracing::warn!(%language, %error, "track_load_failed");
                state.tracks.mark_failed(&language);
                Vec::new()
            }
            SessionEvent::MetadataLoaded => {
                if state.media_ready {
                    return Vec::new();
                }
                state.media_ready = true;
                match state.selection.current().map(str::to_string) {
                    Some(language) => self.activate(state, &language),
                    None => Vec::new(),
                }
            }
            SessionEvent::SelectLanguage(language) => {
                let language = canonical_language(&language);
                if state.tracks.track(&language).is_none() {
                    tracing::warn!(%language, "unknown_language");
                    return Vec::new();
                }
                let changed = state.selection.set(&language);
                let showing = state
                    .tracks
                    .showing()
                    .is_some_and(|t| t.language == language);
                if !state.media_ready || (!changed && showing) {
                    return Vec::new();
                }
                self.activate(state, &language)
            }
            SessionEvent::TimeUpdate(position) => state
                .sync
                .on_time_update(position, &state.tracks)
                .map(|change| vec![self.spawn_render(change)])
                .unwrap_or_default(),
        }
    }

    fn on_status(self: &Arc<Self>, state: &mut SessionState, status: JobStatus) -> Handles {
        let runtime = &self.ctx.runtime;
        state.job_state = Some(status.state);
        runtime.emit_job(JobEvent::Progress {
            task_id: self.task_id.clone(),
            state: status.state,
            progress: status.progress,
            message: status.message.clone(),
        });
        match status.state {
            JobState::Success => runtime.emit_job(JobEvent::Completed {
                task_id: self.task_id.clone(),
            }),
            JobState::Failure => {
                tracing::error!(message = %status.message, "job_failed");
                runtime.emit_job(JobEvent::Failed {
                    task_id: self.task_id.clone(),
                    message: status.message.clone(),
                });
            }
            JobState::Queued | JobState::Running => {}
        }
        self.on_tracks(state, status.tracks())
    }

    fn on_tracks(self: &Arc<Self>, state: &mut SessionState, resources: &TrackResources) -> Handles {
        let added = state.tracks.apply_tracks(resources);
        if added.is_empty() {
            return Vec::new();
        }

        let mut handles = Vec::new();
        for language in added {
            if let Some(locator) = state.tracks.begin_load(&language) {
                handles.push(self.spawn_load(language, locator));
            }
        }

        let languages = state.tracks.languages();
        let changed = state.selection.reconcile(&languages);
        self.ctx.runtime.emit_tracks(TrackEvent::Available {
            task_id: self.task_id.clone(),
            languages,
            selected: state.selection.current().map(str::to_string),
        });

        if let Some(language) = changed {
            if state.media_ready {
                handles.extend(self.activate(state, &language));
            }
        }
        handles
    }

    /// Shows `language`, rebinds the synchronizer to it and starts the
    /// side fetches for that language.
    fn activate(self: &Arc<Self>, state: &mut SessionState, language: &str) -> Handles {
        if !state.tracks.set_showing(language) {
            return Vec::new();
        }
        state.sync.bind(language);
        tracing::info!(%language, "track_activated");
        self.ctx.runtime.emit_tracks(TrackEvent::Activated {
            task_id: self.task_id.clone(),
            language: language.to_string(),
        });

        let mut handles = vec![
            self.spawn_bind(state.sync.binding()),
            self.spawn_subtitle_text(language.to_string()),
        ];
        if self.ctx.config.glossary_mode == GlossaryMode::Bulk {
            handles.push(self.spawn_prefetch(language.to_string()));
        }
        handles
    }

    fn spawn_load(self: &Arc<Self>, language: String, locator: String) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(
            async move {
                let backend = session.ctx.backend.clone();
                let result =
                    with_retry(&session.ctx.config, "track_cues", || backend.track_cues(&locator))
                        .await;
                let event = match result {
                    Ok(cues) => SessionEvent::TrackLoaded { language, cues },
                    Err(e) => SessionEvent::TrackLoadFailed {
                        language,
                        error: e.to_string(),
                    },
                };
                for handle in session.dispatch(event) {
                    let _ = handle.await;
                }
            }
            .instrument(self.span.clone()),
        )
    }

    /// Waits for the bound track's cues with a bounded number of checks,
    /// restarting a failed load, then renders the cue at the current position.
    fn spawn_bind(self: &Arc<Self>, binding: u64) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(
            async move {
                let config = &session.ctx.config;
                for attempt in 0..=config.bind_retry_limit {
                    let mut restart = None;
                    let step = {
                        let mut guard = lock(&session.state);
                        let state = &mut *guard;
                        if state.closed || state.sync.binding() != binding {
                            return;
                        }
                        let Some(language) = state.sync.bound_language().map(str::to_string)
                        else {
                            return;
                        };
                        if state.tracks.binding_state(&language) == BindingState::Active {
                            Some(state.sync.refresh(&state.tracks))
                        } else {
                            restart = state
                                .tracks
                                .begin_load(&language)
                                .map(|locator| (language, locator));
                            None
                        }
                    };

                    match step {
                        Some(Some(change)) => return session.resolve_and_render(change).await,
                        Some(None) => return,
                        None => {
                            if let Some((language, locator)) = restart {
                                tracing::debug!(%language, attempt, "track_load_restarted");
                                drop(session.spawn_load(language, locator));
                            }
                            tokio::time::sleep(config.bind_retry_interval()).await;
                        }
                    }
                }
                tracing::warn!(binding, "bind_gave_up");
            }
            .instrument(self.span.clone()),
        )
    }

    fn spawn_render(self: &Arc<Self>, change: CueChange) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(
            async move { session.resolve_and_render(change).await }.instrument(self.span.clone()),
        )
    }

    fn spawn_subtitle_text(self: &Arc<Self>, language: String) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(
            async move {
                let ctx = &session.ctx;
                let text = with_timeout(
                    ctx.config.fetch_timeout(),
                    ctx.backend.subtitle_text(&session.task_id, &language),
                )
                .await
                .inspect_err(|e| tracing::warn!(%language, error = %e, "subtitle_text_failed"))
                .ok();

                let state = lock(&session.state);
                if state.closed || state.selection.current() != Some(language.as_str()) {
                    return;
                }
                ctx.runtime.emit_subtitle_text(SubtitleTextEvent {
                    task_id: session.task_id.clone(),
                    language,
                    text,
                });
            }
            .instrument(self.span.clone()),
        )
    }

    fn spawn_prefetch(self: &Arc<Self>, language: String) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(
            async move {
                let key = CacheKey::new(&session.task_id, language);
                session.ctx.cache.ensure(&key).await;
            }
            .instrument(self.span.clone()),
        )
    }

    async fn resolve_and_render(&self, change: CueChange) {
        let ctx = &self.ctx;
        let key = CacheKey::new(&self.task_id, &change.language);
        let cue_key = change.cue.key();

        // Cue text is matched in the track's own language.
        let resolution = ctx
            .cache
            .resolve(&key, &change.cue, &change.language, ctx.config.glossary_mode)
            .await;
        let panel = match resolution {
            Resolution::Items(items) => GlossaryPanel::for_cue(&cue_key, items),
            Resolution::Unavailable => GlossaryPanel::no_terms(&cue_key),
            Resolution::Suppressed => return,
        };

        let state = lock(&self.state);
        if state.closed || !state.sync.is_current(change.generation) {
            tracing::debug!(%cue_key, generation = change.generation, "stale_glossary_discarded");
            return;
        }
        ctx.runtime.emit_panel(PanelEvent {
            task_id: self.task_id.clone(),
            language: change.language,
            panel,
        });
    }

    /// Starts the job poller. Later calls are no-ops.
    pub fn start_polling(self: &Arc<Self>) {
        let mut polling = lock(&self.polling);
        if polling.cancel.is_some() || self.is_closed() {
            return;
        }
        let handle = spawn_poller(
            self.ctx.backend.clone(),
            self.task_id.clone(),
            self.ctx.config.clone(),
            SessionSink(Arc::downgrade(self)),
        );
        polling.cancel = Some(handle.cancel_token());
        polling.handle = Some(handle);
    }

    /// Waits for the poller to finish. `None` when polling never started or
    /// another caller is already waiting.
    pub async fn join_poller(&self) -> Option<PollOutcome> {
        let handle = lock(&self.polling).handle.take()?;
        Some(handle.join().await)
    }

    /// Navigate-away: stops polling and drops every in-flight render.
    pub fn close(&self) {
        {
            let mut state = lock(&self.state);
            if state.closed {
                return;
            }
            state.closed = true;
            state.sync.invalidate();
        }
        if let Some(cancel) = &lock(&self.polling).cancel {
            cancel.cancel();
        }
        tracing::info!(parent: &self.span, "session_closed");
    }
}

struct SessionSink<B, R>(Weak<Session<B, R>>);

impl<B: ViewerBackend, R: ViewerRuntime> StatusSink for SessionSink<B, R> {
    fn on_status(&self, status: JobStatus) {
        if let Some(session) = self.0.upgrade() {
            session.dispatch(SessionEvent::Status(status));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::glossary::NO_TERMS;
    use crate::test_utils::{MockBackend, RecordingRuntime, item, status, terms};

    type TestContext = Arc<ViewerContext<MockBackend, RecordingRuntime>>;

    fn setup(config: ViewerConfig) -> (Arc<MockBackend>, Arc<RecordingRuntime>, TestContext) {
        let backend = Arc::new(MockBackend::new());
        let runtime = Arc::new(RecordingRuntime::default());
        let ctx = ViewerContext::new(
            backend.clone(),
            runtime.clone(),
            config.with_fetch_retries(0),
        );
        (backend, runtime, ctx)
    }

    async fn settle(handles: Vec<JoinHandle<()>>) {
        for handle in handles {
            handle.await.unwrap();
        }
    }

    fn ko_en_tracks(backend: &MockBackend) {
        backend.set_track(
            "/v/ko.vtt",
            vec![
                Cue::new(0.0, 4.0, "유역 관리").with_id("1"),
                Cue::new(4.0, 8.0, "하천 유량").with_id("2"),
            ],
        );
        backend.set_track(
            "/v/en.vtt",
            vec![
                Cue::new(0.0, 4.0, "watershed management").with_id("1"),
                Cue::new(4.0, 8.0, "river discharge").with_id("2"),
            ],
        );
    }

    const KO_EN: &[(&str, &str)] = &[("ko", "/v/ko.vtt"), ("en", "/v/en.vtt")];

    #[tokio::test(start_paused = true)]
    async fn upload_to_glossary_panel() {
        let (backend, runtime, ctx) = setup(ViewerConfig::default());
        ko_en_tracks(&backend);
        backend.set_table("t1", "en", [("1", vec![item("watershed")])]);
        let session = ctx.session("t1");

        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        settle(session.dispatch(SessionEvent::TimeUpdate(1.0))).await;
        settle(session.dispatch(SessionEvent::Status(status(JobState::Running, &[])))).await;
        settle(session.dispatch(SessionEvent::Status(status(JobState::Success, KO_EN)))).await;

        assert_eq!(session.languages(), vec!["ko", "en"]);
        assert_eq!(session.job_state(), Some(JobState::Success));
        assert!(runtime.tracks().contains(&TrackEvent::Available {
            task_id: "t1".into(),
            languages: vec!["ko".into(), "en".into()],
            selected: Some("en".into()),
        }));

        assert_eq!(session.track_mode("en"), Some(TrackMode::Showing));
        assert_eq!(session.track_mode("ko"), Some(TrackMode::Hidden));
        let panel = runtime.last_panel().unwrap();
        assert_eq!(panel.language, "en");
        assert_eq!(panel.panel.cue_key(), "1");
        assert_eq!(terms(&panel.panel), vec!["watershed"]);

        settle(session.dispatch(SessionEvent::SelectLanguage("KO".into()))).await;
        assert_eq!(session.showing_language().as_deref(), Some("ko"));
        assert_eq!(session.track_mode("en"), Some(TrackMode::Hidden));
        assert_eq!(session.binding_state("en"), BindingState::Inactive);
        assert_eq!(session.binding_state("ko"), BindingState::Active);

        let panel = runtime.last_panel().unwrap();
        assert_eq!(panel.language, "ko");
        assert_eq!(runtime.panel_lines(), vec![NO_TERMS.to_string()]);

        let texts: Vec<_> = runtime.texts().into_iter().map(|t| t.language).collect();
        assert_eq!(texts, vec!["en", "ko"]);
        assert!(runtime.jobs().contains(&JobEvent::Completed {
            task_id: "t1".into()
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn selection_waits_for_media_metadata() {
        let (backend, runtime, ctx) = setup(ViewerConfig::default());
        ko_en_tracks(&backend);
        let session = ctx.session("t1");

        settle(session.dispatch(SessionEvent::Status(status(JobState::Success, KO_EN)))).await;
        assert_eq!(session.selected_language().as_deref(), Some("en"));
        assert_eq!(session.showing_language(), None);

        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        assert_eq!(session.showing_language().as_deref(), Some("en"));
        assert_eq!(
            runtime
                .tracks()
                .iter()
                .filter(|e| matches!(e, TrackEvent::Activated { .. }))
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn later_tracks_keep_current_selection() {
        let (backend, _runtime, ctx) = setup(ViewerConfig::default());
        ko_en_tracks(&backend);
        backend.set_track("/v/fr.vtt", vec![Cue::new(0.0, 4.0, "bassin")]);
        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;

        settle(session.dispatch(SessionEvent::TracksAvailable(
            [("en", "/v/en.vtt")].into_iter().collect(),
        )))
        .await;
        settle(session.dispatch(SessionEvent::TracksAvailable(
            [("en", "/v/other.vtt"), ("fr", "/v/fr.vtt")].into_iter().collect(),
        )))
        .await;
        settle(session.dispatch(SessionEvent::TracksAvailable(
            [("en", "/v/en.vtt")].into_iter().collect(),
        )))
        .await;

        assert_eq!(session.languages(), vec!["en", "fr"]);
        assert_eq!(session.showing_language().as_deref(), Some("en"));
        assert_eq!(backend.track_fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_language_is_ignored() {
        let (backend, runtime, ctx) = setup(ViewerConfig::default());
        ko_en_tracks(&backend);
        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        settle(session.dispatch(SessionEvent::Status(status(JobState::Success, KO_EN)))).await;
        let events = runtime.tracks().len();

        assert!(session.dispatch(SessionEvent::SelectLanguage("de".into())).is_empty());
        assert!(session.dispatch(SessionEvent::SelectLanguage("en".into())).is_empty());
        assert_eq!(session.showing_language().as_deref(), Some("en"));
        assert_eq!(runtime.tracks().len(), events);
    }

    #[tokio::test(start_paused = true)]
    async fn slower_earlier_lookup_never_overwrites_later_cue() {
        let config = ViewerConfig::default().with_glossary_mode(GlossaryMode::Streaming);
        let (backend, runtime, ctx) = setup(config);
        backend.set_track(
            "/v/en.vtt",
            vec![
                Cue::new(0.0, 1.0, "alpha").with_id("1"),
                Cue::new(1.0, 2.0, "beta").with_id("2"),
            ],
        );
        backend.set_text_items("alpha", vec![item("a")]);
        backend.set_text_items("beta", vec![item("b")]);
        backend.set_text_delay("alpha", Duration::from_millis(500));
        backend.set_text_delay("beta", Duration::from_millis(50));

        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::TimeUpdate(5.0))).await;
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        settle(session.dispatch(SessionEvent::TracksAvailable(
            [("en", "/v/en.vtt")].into_iter().collect(),
        )))
        .await;
        assert!(runtime.panels().is_empty());

        let mut handles = session.dispatch(SessionEvent::TimeUpdate(0.5));
        handles.extend(session.dispatch(SessionEvent::TimeUpdate(1.5)));
        settle(handles).await;

        assert_eq!(backend.requested_texts(), vec!["alpha", "beta"]);
        let panels = runtime.panels();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].panel.cue_key(), "2");
        assert_eq!(terms(&panels[0].panel), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn language_switch_drops_previous_language_lookup() {
        let config = ViewerConfig::default().with_glossary_mode(GlossaryMode::Streaming);
        let (backend, runtime, ctx) = setup(config);
        ko_en_tracks(&backend);
        backend.set_text_items("watershed management", vec![item("watershed")]);
        backend.set_text_items("유역 관리", vec![item("유역")]);
        backend.set_text_delay("watershed management", Duration::from_secs(2));

        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::TimeUpdate(1.0))).await;
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        let mut handles =
            session.dispatch(SessionEvent::Status(status(JobState::Success, KO_EN)));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(backend.requested_texts(), vec!["watershed management"]);
        handles.extend(session.dispatch(SessionEvent::SelectLanguage("ko".into())));
        settle(handles).await;

        let panels = runtime.panels();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].language, "ko");
        assert_eq!(terms(&panels[0].panel), vec!["유역"]);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_cues_render_the_later_one() {
        let config = ViewerConfig::default().with_glossary_mode(GlossaryMode::Streaming);
        let (backend, runtime, ctx) = setup(config);
        backend.set_track(
            "/v/en.vtt",
            vec![Cue::new(0.0, 3.0, "text1"), Cue::new(1.0, 2.0, "text2")],
        );
        backend.set_text_items("text2", vec![item("two")]);

        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::TimeUpdate(1.5))).await;
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        settle(session.dispatch(SessionEvent::TracksAvailable(
            [("en", "/v/en.vtt")].into_iter().collect(),
        )))
        .await;

        assert_eq!(backend.requested_texts(), vec!["text2"]);
        assert_eq!(runtime.panel_lines(), vec!["two: definition of two"]);
        assert_eq!(runtime.last_panel().unwrap().panel.cue_key(), "1.000-2.000");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_glossary_renders_placeholder() {
        let config = ViewerConfig::default().with_glossary_mode(GlossaryMode::Streaming);
        let (backend, runtime, ctx) = setup(config);
        backend.set_track("/v/en.vtt", vec![Cue::new(0.0, 3.0, "nothing here")]);
        backend.set_text_items("nothing here", Vec::new());

        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::TimeUpdate(1.0))).await;
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        settle(session.dispatch(SessionEvent::TracksAvailable(
            [("en", "/v/en.vtt")].into_iter().collect(),
        )))
        .await;

        assert_eq!(runtime.panel_lines(), vec![NO_TERMS.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_renders_placeholder_then_recovers() {
        let config = ViewerConfig::default().with_glossary_mode(GlossaryMode::Streaming);
        let (backend, runtime, ctx) = setup(config);
        backend.set_track("/v/en.vtt", vec![Cue::new(0.0, 3.0, "alpha").with_id("1")]);
        backend.set_text_items("alpha", vec![item("a")]);
        backend.fail_next_text_fetches(1);

        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::TimeUpdate(5.0))).await;
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        settle(session.dispatch(SessionEvent::TracksAvailable(
            [("en", "/v/en.vtt")].into_iter().collect(),
        )))
        .await;

        settle(session.dispatch(SessionEvent::TimeUpdate(0.5))).await;
        assert_eq!(runtime.panel_lines(), vec![NO_TERMS.to_string()]);

        settle(session.dispatch(SessionEvent::TimeUpdate(5.0))).await;
        assert_eq!(runtime.panels().len(), 1);

        tokio::time::advance(Duration::from_millis(300)).await;
        settle(session.dispatch(SessionEvent::TimeUpdate(0.6))).await;
        assert_eq!(terms(&runtime.last_panel().unwrap().panel), vec!["a"]);
        assert_eq!(backend.text_fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn track_load_failure_is_retried_by_binding() {
        let (backend, runtime, ctx) = setup(ViewerConfig::default());
        ko_en_tracks(&backend);
        backend.set_table("t1", "en", [("1", vec![item("watershed")])]);
        backend.fail_next_track_fetches(2);

        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::TimeUpdate(1.0))).await;
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        settle(session.dispatch(SessionEvent::Status(status(JobState::Success, KO_EN)))).await;

        assert_eq!(session.binding_state("en"), BindingState::Active);
        assert_eq!(terms(&runtime.last_panel().unwrap().panel), vec!["watershed"]);
        assert!(backend.track_fetches() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_track_renders_after_binding_gives_up() {
        let config = ViewerConfig::default().with_bind_retry(Duration::from_millis(100), 2);
        let (backend, runtime, ctx) = setup(config);
        ko_en_tracks(&backend);
        backend.set_track_delay(Duration::from_secs(3));
        backend.set_table("t1", "en", [("1", vec![item("watershed")])]);

        let session = ctx.session("t1");
        settle(session.dispatch(SessionEvent::TimeUpdate(1.0))).await;
        settle(session.dispatch(SessionEvent::MetadataLoaded)).await;
        settle(session.dispatch(SessionEvent::Status(status(JobState::Success, KO_EN)))).await;

        assert_eq!(session.binding_state("en"), BindingState::Active);
        assert_eq!(runtime.panels().len(), 1);
        assert_eq!(terms(&runtime.last_panel().unwrap().panel), vec!["watershed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_share_the_glossary_cache() {
        let (backend, _runtime, ctx) = setup(ViewerConfig::default());
        ko_en_tracks(&backend);
        backend.set_table("t1", "en", [("1", vec![item("watershed")])]);
        backend.set_table_delay(Duration::from_millis(200));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let session = ctx.session("t1");
            handles.extend(session.dispatch(SessionEvent::TimeUpdate(1.0)));
            handles.extend(session.dispatch(SessionEvent::MetadataLoaded));
            handles.extend(session.dispatch(SessionEvent::Status(status(JobState::Success, KO_EN))));
        }
        settle(handles).await;

        assert_eq!(backend.table_fetches(), 1);
        assert!(ctx.cache().is_ready(&CacheKey::new("t1", "en")));
    }

    #[tokio::test(start_paused = true)]
    async fn job_failure_is_reported() {
        let (_backend, runtime, ctx) = setup(ViewerConfig::default());
        let session = ctx.session("t1");

        let mut failed = status(JobState::Failure, &[]);
        failed.message = "asr crashed".into();
        settle(session.dispatch(SessionEvent::Status(failed))).await;

        assert_eq!(
            runtime.jobs().last(),
            Some(&JobEvent::Failed {
                task_id: "t1".into(),
                message: "asr crashed".into(),
            })
        );
        assert!(session.languages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_drives_tracks_until_terminal() {
        let (backend, runtime, ctx) = setup(ViewerConfig::default());
        ko_en_tracks(&backend);
        backend.push_status(status(JobState::Queued, &[]));
        backend.push_status_error();
        backend.push_status(status(JobState::Running, &[("ko", "/v/ko.vtt")]));
        backend.push_status(status(JobState::Success, KO_EN));

        let session = ctx.session("t1");
        session.start_polling();
        session.start_polling();

        assert_eq!(
            session.join_poller().await,
            Some(PollOutcome::Terminal(JobState::Success))
        );
        assert_eq!(backend.status_fetches(), 4);
        assert_eq!(session.languages(), vec!["ko", "en"]);
        assert_eq!(session.selected_language().as_deref(), Some("ko"));
        assert!(runtime.jobs().contains(&JobEvent::Completed {
            task_id: "t1".into()
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_polling_once() {
        let (backend, runtime, ctx) = setup(ViewerConfig::default());
        backend.push_status(status(JobState::Running, &[]));

        let session = ctx.session("t1");
        session.start_polling();
        tokio::time::sleep(Duration::from_millis(3100)).await;
        let fetches = backend.status_fetches();

        session.close();
        session.close();
        assert_eq!(session.join_poller().await, Some(PollOutcome::Cancelled));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.status_fetches(), fetches);
        let jobs = runtime.jobs().len();
        assert!(session.dispatch(SessionEvent::Status(status(JobState::Success, &[]))).is_empty());
        assert_eq!(runtime.jobs().len(), jobs);
        assert!(session.is_closed());
    }
}
