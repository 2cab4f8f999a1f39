use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use subterm_subtitle_api::{GlossaryItem, JobOutputs, JobState, JobStatus};
use subterm_timed_text::Cue;

use crate::backend::{GlossaryTable, ViewerBackend};
use crate::events::*;
use crate::glossary::GlossaryPanel;
use crate::runtime::ViewerRuntime;
use crate::{Error, Result, lock};

pub(crate) fn item(term: &str) -> GlossaryItem {
    GlossaryItem {
        term: term.to_string(),
        term_original: term.to_string(),
        definition: format!("definition of {term}"),
        base_lang: None,
    }
}

pub(crate) fn status(state: JobState, tracks: &[(&str, &str)]) -> JobStatus {
    JobStatus {
        state,
        progress: if state == JobState::Success { 1.0 } else { 0.5 },
        message: state.to_string(),
        outputs: JobOutputs {
            vtt: tracks.iter().copied().collect(),
        },
    }
}

fn mock_failure() -> Error {
    Error::Api(subterm_subtitle_api::Error::Http("mock failure".into()))
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn take_failure(remaining: &mut usize) -> bool {
    if *remaining > 0 {
        *remaining -= 1;
        true
    } else {
        false
    }
}

#[derive(Default)]
struct MockState {
    statuses: VecDeque<Option<JobStatus>>,
    last_status: Option<JobStatus>,
    tracks: HashMap<String, Vec<Cue>>,
    track_delay: Duration,
    track_failures: usize,
    tables: HashMap<(String, String), GlossaryTable>,
    table_delay: Duration,
    table_failures: usize,
    text_items: HashMap<String, Vec<GlossaryItem>>,
    text_delays: HashMap<String, Duration>,
    text_failures: usize,
    requested_texts: Vec<String>,
}

/// Scripted in-memory backend that counts every request.
#[derive(Default)]
pub(crate) struct MockBackend {
    state: Mutex<MockState>,
    status_fetches: AtomicUsize,
    track_fetches: AtomicUsize,
    table_fetches: AtomicUsize,
    text_fetches: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queued statuses are served in order; the last one repeats.
    pub fn push_status(&self, status: JobStatus) {
        lock(&self.state).statuses.push_back(Some(status));
    }

    pub fn push_status_error(&self) {
        lock(&self.state).statuses.push_back(None);
    }

    pub fn set_track(&self, locator: &str, cues: Vec<Cue>) {
        lock(&self.state).tracks.insert(locator.to_string(), cues);
    }

    pub fn set_track_delay(&self, delay: Duration) {
        lock(&self.state).track_delay = delay;
    }

    pub fn fail_next_track_fetches(&self, n: usize) {
        lock(&self.state).track_failures = n;
    }

    pub fn set_table<'a>(
        &self,
        task_id: &str,
        language: &str,
        entries: impl IntoIterator<Item = (&'a str, Vec<GlossaryItem>)>,
    ) {
        let table = entries
            .into_iter()
            .map(|(id, items)| (id.to_string(), items))
            .collect();
        lock(&self.state)
            .tables
            .insert((task_id.to_string(), language.to_string()), table);
    }

    pub fn set_table_delay(&self, delay: Duration) {
        lock(&self.state).table_delay = delay;
    }

    pub fn fail_next_table_fetches(&self, n: usize) {
        lock(&self.state).table_failures = n;
    }

    pub fn set_text_items(&self, text: &str, items: Vec<GlossaryItem>) {
        lock(&self.state).text_items.insert(text.to_string(), items);
    }

    pub fn set_text_delay(&self, text: &str, delay: Duration) {
        lock(&self.state).text_delays.insert(text.to_string(), delay);
    }

    pub fn fail_next_text_fetches(&self, n: usize) {
        lock(&self.state).text_failures = n;
    }

    pub fn requested_texts(&self) -> Vec<String> {
        lock(&self.state).requested_texts.clone()
    }

    pub fn status_fetches(&self) -> usize {
        self.status_fetches.load(Ordering::SeqCst)
    }

    pub fn track_fetches(&self) -> usize {
        self.track_fetches.load(Ordering::SeqCst)
    }

    pub fn table_fetches(&self) -> usize {
        self.table_fetches.load(Ordering::SeqCst)
    }

    pub fn text_fetches(&self) -> usize {
        self.text_fetches.load(Ordering::SeqCst)
    }
}

impl ViewerBackend for MockBackend {
    async fn job_status(&self, _task_id: &str) -> Result<JobStatus> {
        self.status_fetches.fetch_add(1, Ordering::SeqCst);
        let mut state = lock(&self.state);
        match state.statuses.pop_front() {
            Some(Some(status)) => {
                state.last_status = Some(status.clone());
                Ok(status)
            }
            Some(None) => Err(mock_failure()),
            None => state.last_status.clone().ok_or_else(mock_failure),
        }
    }

    async fn track_cues(&self, locator: &str) -> Result<Vec<Cue>> {
        self.track_fetches.fetch_add(1, Ordering::SeqCst);
        let (delay, failed, cues) = {
            let mut state = lock(&self.state);
            let failed = take_failure(&mut state.track_failures);
            (state.track_delay, failed, state.tracks.get(locator).cloned())
        };
        pause(delay).await;
        if failed {
            return Err(mock_failure());
        }
        cues.ok_or_else(mock_failure)
    }

    async fn subtitle_text(&self, task_id: &str, language: &str) -> Result<String> {
        Ok(format!("{task_id}:{language}"))
    }

    async fn glossary_table(&self, task_id: &str, language: &str) -> Result<GlossaryTable> {
        self.table_fetches.fetch_add(1, Ordering::SeqCst);
        let (delay, failed, table) = {
            let mut state = lock(&self.state);
            let failed = take_failure(&mut state.table_failures);
            let table = state
                .tables
                .get(&(task_id.to_string(), language.to_string()))
                .cloned()
                .unwrap_or_default();
            (state.table_delay, failed, table)
        };
        pause(delay).await;
        if failed {
            return Err(mock_failure());
        }
        Ok(table)
    }

    async fn glossary_for_text(
        &self,
        text: &str,
        _language: &str,
        _src_language: &str,
    ) -> Result<Vec<GlossaryItem>> {
        self.text_fetches.fetch_add(1, Ordering::SeqCst);
        let (delay, failed, items) = {
            let mut state = lock(&self.state);
            state.requested_texts.push(text.to_string());
            let failed = take_failure(&mut state.text_failures);
            let delay = state.text_delays.get(text).copied().unwrap_or_default();
            let items = state.text_items.get(text).cloned().unwrap_or_default();
            (delay, failed, items)
        };
        pause(delay).await;
        if failed {
            return Err(mock_failure());
        }
        Ok(items)
    }
}

#[derive(Default)]
pub(crate) struct RecordingRuntime {
    jobs: Mutex<Vec<JobEvent>>,
    tracks: Mutex<Vec<TrackEvent>>,
    panels: Mutex<Vec<PanelEvent>>,
    texts: Mutex<Vec<SubtitleTextEvent>>,
}

impl RecordingRuntime {
    pub fn jobs(&self) -> Vec<JobEvent> {
        lock(&self.jobs).clone()
    }

    pub fn tracks(&self) -> Vec<TrackEvent> {
        lock(&self.tracks).clone()
    }

    pub fn panels(&self) -> Vec<PanelEvent> {
        lock(&self.panels).clone()
    }

    pub fn last_panel(&self) -> Option<PanelEvent> {
        lock(&self.panels).last().cloned()
    }

    pub fn panel_lines(&self) -> Vec<String> {
        self.last_panel()
            .map(|event| event.panel.lines())
            .unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<SubtitleTextEvent> {
        lock(&self.texts).clone()
    }
}

impl ViewerRuntime for RecordingRuntime {
    fn emit_job(&self, event: JobEvent) {
        lock(&self.jobs).push(event);
    }

    fn emit_tracks(&self, event: TrackEvent) {
        lock(&self.tracks).push(event);
    }

    fn emit_panel(&self, event: PanelEvent) {
        lock(&self.panels).push(event);
    }

    fn emit_subtitle_text(&self, event: SubtitleTextEvent) {
        lock(&self.texts).push(event);
    }
}

pub(crate) fn terms(panel: &GlossaryPanel) -> Vec<String> {
    panel.items().iter().map(|i| i.term.clone()).collect()
}
