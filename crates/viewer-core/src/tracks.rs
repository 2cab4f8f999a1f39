use std::sync::Arc;

use subterm_subtitle_api::{TrackResources, canonical_language};
use subterm_timed_text::{Cue, active_cues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    Showing,
    Hidden,
}

#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loading,
    Loaded(Arc<Vec<Cue>>),
    Failed,
}

/// Whether a track's cues may drive the glossary panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Cues not loaded yet.
    Unbound,
    Active,
    Inactive,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub language: String,
    pub locator: String,
    pub mode: TrackMode,
    pub load: LoadState,
}

impl Track {
    pub fn cues(&self) -> Option<&Arc<Vec<Cue>>> {
        match &self.load {
            LoadState::Loaded(cues) => Some(cues),
            _ => None,
        }
    }

    pub fn active_cues(&self, position: f64) -> Vec<&Cue> {
        self.cues()
            .map(|cues| active_cues(cues, position))
            .unwrap_or_default()
    }

    pub fn binding_state(&self) -> BindingState {
        match (&self.load, self.mode) {
            (LoadState::Loaded(_), TrackMode::Showing) => BindingState::Active,
            (LoadState::Loaded(_), TrackMode::Hidden) => BindingState::Inactive,
            _ => BindingState::Unbound,
        }
    }
}

/// Append-only set of subtitle tracks for one job, in arrival order.
#[derive(Debug, Default)]
pub struct TrackManager {
    tracks: Vec<Track>,
}

impl TrackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches every language not seen before and returns the new ones.
    /// Known languages keep their original locator.
    pub fn apply_tracks(&mut self, resources: &TrackResources) -> Vec<String> {
        let mut added = Vec::new();
        for (language, locator) in resources.iter() {
            let language = canonical_language(language);
            if language.is_empty() || self.track(&language).is_some() {
                continue;
            }
            tracing::debug!(%language, locator, "track_attached");
            self.tracks.push(Track {
                language: language.clone(),
                locator: locator.to_string(),
                mode: TrackMode::Hidden,
                load: LoadState::Pending,
            });
            added.push(language);
        }
        added
    }

    pub fn languages(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.language.clone()).collect()
    }

    pub fn track(&self, language: &str) -> Option<&Track> {
        let language = canonical_language(language);
        self.tracks.iter().find(|t| t.language == language)
    }

    fn track_mut(&mut self, language: &str) -> Option<&mut Track> {
        let language = canonical_language(language);
        self.tracks.iter_mut().find(|t| t.language == language)
    }

    pub fn showing(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.mode == TrackMode::Showing)
    }

    /// Shows the track for `language` and hides every other one. Leaves all
    /// modes untouched when no such track exists.
    pub fn set_showing(&mut self, language: &str) -> bool {
        let language = canonical_language(language);
        if self.track(&language).is_none() {
            return false;
        }
        for track in &mut self.tracks {
            track.mode = if track.language == language {
                TrackMode::Showing
            } else {
                TrackMode::Hidden
            };
        }
        true
    }

    /// Marks the track as loading and hands back its locator, unless it is
    /// already loading or loaded.
    pub fn begin_load(&mut self, language: &str) -> Option<String> {
        let track = self.track_mut(language)?;
        match track.load {
            LoadState::Pending | LoadState::Failed => {
                track.load = LoadState::Loading;
                Some(track.locator.clone())
            }
            LoadState::Loading | LoadState::Loaded(_) => None,
        }
    }

    pub fn mark_loaded(&mut self, language: &str, cues: Vec<Cue>) -> bool {
        match self.track_mut(language) {
            Some(track) => {
                track.load = LoadState::Loaded(Arc::new(cues));
                true
            }
            None => false,
        }
    }

    pub fn mark_failed(&mut self, language: &str) {
        if let Some(track) = self.track_mut(language) {
            if !matches!(track.load, LoadState::Loaded(_)) {
                track.load = LoadState::Failed;
            }
        }
    }

    pub fn binding_state(&self, language: &str) -> BindingState {
        self.track(language)
            .map(Track::binding_state)
            .unwrap_or(BindingState::Unbound)
    }
}
