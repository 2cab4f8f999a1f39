use std::sync::{Arc, Mutex};

use subterm_subtitle_api::GlossaryItem;
use subterm_timed_text::{Cue, CueKey};
use tokio::time::Instant;

use super::debounce::{DebounceKey, Debouncer};
use super::slots::{Claim, Slots};
use crate::backend::{GlossaryTable, ViewerBackend};
use crate::fetch::{with_retry, with_timeout};
use crate::{GlossaryMode, ViewerConfig, lock};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub task_id: String,
    pub language: String,
}

impl CacheKey {
    pub fn new(task_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            language: language.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    cache: CacheKey,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Items(Vec<GlossaryItem>),
    /// The fetch failed; callers render the empty state.
    Unavailable,
    /// A debounced duplicate; callers keep whatever they rendered last.
    Suppressed,
}

/// Process-wide glossary store keyed by (task, language). Shared by every
/// session, lives as long as the viewer.
pub struct GlossaryCache<B> {
    backend: Arc<B>,
    config: ViewerConfig,
    tables: Slots<CacheKey, GlossaryTable>,
    texts: Slots<TextKey, Vec<GlossaryItem>>,
    debouncer: Mutex<Debouncer>,
}

impl<B: ViewerBackend> GlossaryCache<B> {
    pub fn new(backend: Arc<B>, config: ViewerConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce_window());
        Self {
            backend,
            config,
            tables: Slots::new(),
            texts: Slots::new(),
            debouncer: Mutex::new(debouncer),
        }
    }

    /// Makes sure the bulk table for `key` is loaded, issuing at most one
    /// request no matter how many callers are waiting on it.
    pub async fn ensure(&self, key: &CacheKey) -> Option<Arc<GlossaryTable>> {
        let claim = self.tables.claim(key, || {
            let backend = self.backend.clone();
            let config = self.config.clone();
            let key = key.clone();
            Some(async move {
                tracing::debug!(task_id = %key.task_id, language = %key.language, "glossary_table_fetch");
                with_retry(&config, "glossary_table", || {
                    backend.glossary_table(&key.task_id, &key.language)
                })
                .await
            })
        });

        let (generation, fetch, leader) = match claim {
            Claim::Ready(table) => return Some(table),
            Claim::Wait {
                generation,
                fetch,
                leader,
            } => (generation, fetch, leader),
            Claim::Declined => return None,
        };

        let result = fetch.await;
        self.tables.settle(key, generation, &result);
        match result {
            Ok(table) => Some(table),
            Err(err) => {
                if leader {
                    tracing::warn!(
                        task_id = %key.task_id,
                        language = %key.language,
                        error = %err,
                        "glossary_table_unavailable"
                    );
                }
                None
            }
        }
    }

    pub fn is_ready(&self, key: &CacheKey) -> bool {
        self.tables.ready(key).is_some()
    }

    /// Pure in-memory lookup; empty until `ensure` has completed for `key`.
    pub fn lookup_by_id(&self, key: &CacheKey, id: &CueKey) -> Vec<GlossaryItem> {
        self.tables
            .ready(key)
            .and_then(|table| table.get(id.as_str()).cloned())
            .unwrap_or_default()
    }

    /// Streaming lookup: one request per distinct cue text per key, with a
    /// debounce on repeated requests for the same cue.
    pub async fn lookup_by_text(
        &self,
        key: &CacheKey,
        text: &str,
        src_language: &str,
        cue_start: f64,
    ) -> Resolution {
        let text_key = TextKey {
            cache: key.clone(),
            text: text.to_string(),
        };

        let claim = self.texts.claim(&text_key, || {
            let debounce_key = DebounceKey::new(&key.task_id, &key.language, cue_start, text);
            if !lock(&self.debouncer).admit(debounce_key, Instant::now()) {
                return None;
            }

            let backend = self.backend.clone();
            let timeout = self.config.fetch_timeout();
            let text = text.to_string();
            let language = key.language.clone();
            let src_language = src_language.to_string();
            Some(async move {
                with_timeout(
                    timeout,
                    backend.glossary_for_text(&text, &language, &src_language),
                )
                .await
            })
        });

        let (generation, fetch, leader) = match claim {
            Claim::Ready(items) => return Resolution::Items(items.as_ref().clone()),
            Claim::Wait {
                generation,
                fetch,
                leader,
            } => (generation, fetch, leader),
            Claim::Declined => {
                tracing::debug!(language = %key.language, "glossary_lookup_debounced");
                return Resolution::Suppressed;
            }
        };

        let result = fetch.await;
        self.texts.settle(&text_key, generation, &result);
        match result {
            Ok(items) => Resolution::Items(items.as_ref().clone()),
            Err(err) => {
                if leader {
                    tracing::warn!(language = %key.language, error = %err, "glossary_lookup_failed");
                }
                Resolution::Unavailable
            }
        }
    }

    /// Single entry point used by the synchronizer. `mode` is fixed per session.
    pub async fn resolve(
        &self,
        key: &CacheKey,
        cue: &Cue,
        src_language: &str,
        mode: GlossaryMode,
    ) -> Resolution {
        match mode {
            GlossaryMode::Bulk => {
                let Some(table) = self.ensure(key).await else {
                    return Resolution::Unavailable;
                };
                let items = cue
                    .lookup_keys()
                    .iter()
                    .find_map(|k| table.get(k.as_str()))
                    .cloned()
                    .unwrap_or_default();
                Resolution::Items(items)
            }
            GlossaryMode::Streaming => {
                if cue.text.trim().is_empty() {
                    return Resolution::Items(Vec::new());
                }
                self.lookup_by_text(key, &cue.text, src_language, cue.start)
                    .await
            }
        }
    }
}
