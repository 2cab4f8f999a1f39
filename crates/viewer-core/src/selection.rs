use subterm_subtitle_api::canonical_language;

/// The one language driving both track display and the glossary panel.
/// Only user choice and track arrival write it.
#[derive(Debug, Clone, Default)]
pub struct ActiveSelection {
    current: Option<String>,
    source_language: Option<String>,
    fallback_language: Option<String>,
}

impl ActiveSelection {
    pub fn new(source_language: Option<&str>, fallback_language: Option<&str>) -> Self {
        Self {
            current: None,
            source_language: source_language.map(canonical_language),
            fallback_language: fallback_language.map(canonical_language),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The fallback when offered, else the first language other than the
    /// source language, else whatever came first.
    pub fn default_for(&self, available: &[String]) -> Option<String> {
        self.fallback_language
            .as_deref()
            .and_then(|fallback| available.iter().find(|l| l.as_str() == fallback))
            .or_else(|| {
                available
                    .iter()
                    .find(|l| Some(l.as_str()) != self.source_language.as_deref())
            })
            .or_else(|| available.first())
            .cloned()
    }

    /// Keeps the current language when still offered, otherwise applies the
    /// default rule. Returns the new language when the selection changed.
    pub fn reconcile(&mut self, available: &[String]) -> Option<String> {
        if let Some(current) = &self.current {
            if available.contains(current) {
                return None;
            }
        }
        let next = self.default_for(available)?;
        self.current = Some(next.clone());
        Some(next)
    }

    /// Returns false when `language` was already selected.
    pub fn set(&mut self, language: &str) -> bool {
        let language = canonical_language(language);
        if self.current.as_deref() == Some(language.as_str()) {
            return false;
        }
        self.current = Some(language);
        true
    }
}
