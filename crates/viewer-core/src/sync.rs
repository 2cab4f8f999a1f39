use subterm_timed_text::{Cue, CueKey};

use crate::tracks::{BindingState, TrackManager};

/// A cue that became the representative active cue. `generation` orders
/// resolutions: only the latest one may render.
#[derive(Debug, Clone, PartialEq)]
pub struct CueChange {
    pub generation: u64,
    pub language: String,
    pub cue: Cue,
}

/// Follows the showing track's active cues and hands out a fresh generation
/// for every change worth rendering.
#[derive(Debug, Default)]
pub struct CueSynchronizer {
    generation: u64,
    binding: u64,
    bound: Option<String>,
    last_active: Vec<CueKey>,
    position: f64,
}

impl CueSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound_language(&self) -> Option<&str> {
        self.bound.as_deref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Identifies the current binding; changes on every `bind`.
    pub fn binding(&self) -> u64 {
        self.binding
    }

    /// Rebinds to `language`. Invalidates every resolution still in flight
    /// for the previous binding.
    pub fn bind(&mut self, language: &str) {
        self.bound = Some(language.to_string());
        self.last_active.clear();
        self.binding += 1;
        self.generation += 1;
    }

    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn on_time_update(&mut self, position: f64, tracks: &TrackManager) -> Option<CueChange> {
        self.position = position;
        let language = self.bound.as_deref()?;
        if tracks.binding_state(language) != BindingState::Active {
            return None;
        }
        let track = tracks.track(language)?;

        let active = track.active_cues(position);
        let keys: Vec<CueKey> = active.iter().map(|c| c.key()).collect();
        if keys == self.last_active {
            return None;
        }
        self.last_active = keys;

        // Gaps between cues keep whatever was rendered last.
        let representative = active.last()?;
        self.generation += 1;
        Some(CueChange {
            generation: self.generation,
            language: language.to_string(),
            cue: (*representative).clone(),
        })
    }

    /// Re-evaluates the last known position, e.g. once the bound track loads.
    /// Yields nothing when that cue was already handed out for this binding.
    pub fn refresh(&mut self, tracks: &TrackManager) -> Option<CueChange> {
        self.on_time_update(self.position, tracks)
    }
}
