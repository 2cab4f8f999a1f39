use std::time::Duration;

use tokio::time::Instant;

const TEXT_PREFIX_CHARS: usize = 32;

/// (task, language, cue start in centiseconds, text prefix)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DebounceKey {
    task_id: String,
    language: String,
    start_centis: i64,
    prefix: String,
}

impl DebounceKey {
    pub fn new(task_id: &str, language: &str, cue_start: f64, text: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            language: language.to_string(),
            // `as` saturates and maps NaN to 0, so malformed timings still key.
            start_centis: (cue_start * 100.0).round() as i64,
            prefix: text.trim().chars().take(TEXT_PREFIX_CHARS).collect(),
        }
    }
}

/// Drops a streaming lookup when the previous request had the same key and
/// went out less than `window` ago.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Option<(DebounceKey, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn admit(&mut self, key: DebounceKey, now: Instant) -> bool {
        if let Some((last_key, at)) = &self.last {
            if *last_key == key && now.saturating_duration_since(*at) < self.window {
                return false;
            }
        }
        self.last = Some((key, now));
        true
    }
}
