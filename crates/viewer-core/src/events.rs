use subterm_subtitle_api::JobState;

use crate::glossary::GlossaryPanel;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    #[serde(rename = "jobProgress")]
    Progress {
        task_id: String,
        state: JobState,
        progress: f64,
        message: String,
    },
    #[serde(rename = "jobCompleted")]
    Completed { task_id: String },
    #[serde(rename = "jobFailed")]
    Failed { task_id: String, message: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type")]
pub enum TrackEvent {
    /// The selector's language list changed.
    #[serde(rename = "tracksAvailable")]
    Available {
        task_id: String,
        languages: Vec<String>,
        selected: Option<String>,
    },
    #[serde(rename = "trackActivated")]
    Activated { task_id: String, language: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PanelEvent {
    pub task_id: String,
    pub language: String,
    pub panel: GlossaryPanel,
}

/// Plain-text subtitle document for the side view. `None` when the fetch failed.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SubtitleTextEvent {
    pub task_id: String,
    pub language: String,
    pub text: Option<String>,
}
