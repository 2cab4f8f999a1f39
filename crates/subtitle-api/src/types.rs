use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum JobState {
    Queued,
    Running,
    Success,
    Failure,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Success | JobState::Failure)
    }
}

impl From<String> for JobState {
    fn from(value: String) -> Self {
        match value.trim().to_uppercase().as_str() {
            "QUEUED" | "PENDING" => JobState::Queued,
            "SUCCESS" => JobState::Success,
            "FAILURE" | "FAILED" | "REVOKED" => JobState::Failure,
            // STARTED, PROGRESS, RETRY and anything unknown keep the job alive.
            _ => JobState::Running,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Queued => "QUEUED",
            JobState::Running => "RUNNING",
            JobState::Success => "SUCCESS",
            JobState::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

/// Language → subtitle locator, in the order the backend listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackResources(Vec<(String, String)>);

impl TrackResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: impl Into<String>, locator: impl Into<String>) {
        let language = language.into();
        let locator = locator.into();
        match self.0.iter_mut().find(|(lang, _)| *lang == language) {
            Some(entry) => entry.1 = locator,
            None => self.0.push((language, locator)),
        }
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, locator)| locator.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, u)| (l.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<L: Into<String>, U: Into<String>> FromIterator<(L, U)> for TrackResources {
    fn from_iter<I: IntoIterator<Item = (L, U)>>(iter: I) -> Self {
        let mut resources = TrackResources::new();
        for (lang, locator) in iter {
            resources.insert(lang, locator);
        }
        resources
    }
}

impl Serialize for TrackResources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (lang, locator) in &self.0 {
            map.serialize_entry(lang, locator)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TrackResources {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = TrackResources;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of language code to subtitle locator")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(TrackResources::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut resources = TrackResources::new();
                while let Some((lang, locator)) = access.next_entry::<String, String>()? {
                    resources.insert(lang, locator);
                }
                Ok(resources)
            }
        }

        deserializer.deserialize_any(OrderedVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOutputs {
    #[serde(default)]
    pub vtt: TrackResources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    #[serde(default, deserialize_with = "clamped_progress")]
    pub progress: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outputs: JobOutputs,
}

impl JobStatus {
    pub fn tracks(&self) -> &TrackResources {
        &self.outputs.vtt
    }
}

fn clamped_progress<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if value.is_nan() {
        return Ok(0.0);
    }
    Ok(value.clamp(0.0, 1.0))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<JobOutputs, D::Error> {
    Ok(Option::<JobOutputs>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryItem {
    pub term: String,
    pub term_original: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_lang: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlossaryTableResponse {
    #[serde(default)]
    pub items_by_id: HashMap<String, Vec<GlossaryItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlossaryResponse {
    #[serde(default)]
    pub items: Vec<GlossaryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub task_id: String,
    #[serde(default)]
    pub queued: bool,
    #[serde(default)]
    pub langs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: MediaFile,
    pub target_langs: Vec<String>,
    pub asr_model: String,
    pub src_lang: String,
}

#[derive(Debug, Clone)]
pub struct UploadWithSrtRequest {
    pub video: MediaFile,
    pub srt: MediaFile,
    pub srt_lang: String,
    pub target_langs: Vec<String>,
}
