use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_FETCH_RETRIES: usize = 3;
const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 250;
const DEFAULT_BIND_RETRY_INTERVAL_MS: u64 = 500;
const DEFAULT_BIND_RETRY_LIMIT: u32 = 10;

/// How cue glossary entries are resolved for a whole session. Picked once;
/// call sites never choose per lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlossaryMode {
    /// One `items_by_id` table per (task, language), looked up by cue key.
    #[default]
    Bulk,
    /// One debounced request per distinct cue text.
    Streaming,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub poll_interval_ms: u64,
    pub fetch_timeout_ms: u64,
    pub fetch_retries: usize,
    pub debounce_window_ms: u64,
    pub bind_retry_interval_ms: u64,
    pub bind_retry_limit: u32,
    pub glossary_mode: GlossaryMode,
    /// Language the media was recorded in; the default selection skips it.
    pub source_language: Option<String>,
    pub fallback_language: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            fetch_retries: DEFAULT_FETCH_RETRIES,
            debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW_MS,
            bind_retry_interval_ms: DEFAULT_BIND_RETRY_INTERVAL_MS,
            bind_retry_limit: DEFAULT_BIND_RETRY_LIMIT,
            glossary_mode: GlossaryMode::Bulk,
            source_language: Some("ko".to_string()),
            fallback_language: Some("en".to_string()),
        }
    }
}

impl ViewerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    pub fn bind_retry_interval(&self) -> Duration {
        Duration::from_millis(self.bind_retry_interval_ms)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_fetch_retries(mut self, retries: usize) -> Self {
        self.fetch_retries = retries;
        self
    }

    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window_ms = window.as_millis() as u64;
        self
    }

    pub fn with_bind_retry(mut self, interval: Duration, limit: u32) -> Self {
        self.bind_retry_interval_ms = interval.as_millis() as u64;
        self.bind_retry_limit = limit;
        self
    }

    pub fn with_glossary_mode(mut self, mode: GlossaryMode) -> Self {
        self.glossary_mode = mode;
        self
    }

    pub fn with_source_language(mut self, language: Option<String>) -> Self {
        self.source_language = language;
        self
    }

    pub fn with_fallback_language(mut self, language: Option<String>) -> Self {
        self.fallback_language = language;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"glossary_mode":"streaming","poll_interval_ms":1000}"#)
                .unwrap();
        assert_eq!(config.glossary_mode, GlossaryMode::Streaming);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.debounce_window(), Duration::from_millis(250));
        assert_eq!(config.source_language.as_deref(), Some("ko"));
    }
}
