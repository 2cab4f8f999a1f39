use std::fmt;

use crate::timestamp::format_srt_timestamp;

/// One timed span of a track, `[start, end)` in seconds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cue {
    pub id: Option<String>,
    /// 1-based ordinal of the cue within the document it was parsed from.
    #[serde(default)]
    pub position: Option<usize>,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Identity of a cue for glossary lookups: the source-assigned id when there
/// is one, otherwise the timing rendered to millisecond precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct CueKey(String);

impl CueKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CueKey {
    fn from(value: &str) -> Self {
        CueKey(value.to_string())
    }
}

impl Cue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id: None,
            position: None,
            start,
            end,
            text: text.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn key(&self) -> CueKey {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => CueKey(id.to_string()),
            _ => self.timing_key(),
        }
    }

    /// `"{start}-{end}"` with three decimals. Non-finite bounds render as
    /// `NaN`/`inf`, which is still stable for a given cue.
    pub fn timing_key(&self) -> CueKey {
        CueKey(format!("{:.3}-{:.3}", self.start, self.end))
    }

    /// Keys to try, in order, against an id-indexed glossary table. The
    /// backend keys blocks by SRT index and falls back to the raw timing
    /// line when a block has none. Served WebVTT drops the index, so the
    /// cue's ordinal stands in for it.
    pub fn lookup_keys(&self) -> Vec<CueKey> {
        let mut keys = vec![self.key()];
        if let Some(position) = self.position {
            let ordinal = CueKey(position.to_string());
            if !keys.contains(&ordinal) {
                keys.push(ordinal);
            }
        }
        let timing = self.timing_key();
        if !keys.contains(&timing) {
            keys.push(timing);
        }
        if let (Some(start), Some(end)) = (
            format_srt_timestamp(self.start),
            format_srt_timestamp(self.end),
        ) {
            keys.push(CueKey(format!("{start} --> {end}")));
        }
        keys
    }

    pub fn contains(&self, position: f64) -> bool {
        self.start <= position && position < self.end
    }
}

/// Cues active at `position`, in source order.
pub fn active_cues(cues: &[Cue], position: f64) -> Vec<&Cue> {
    cues.iter().filter(|cue| cue.contains(position)).collect()
}
