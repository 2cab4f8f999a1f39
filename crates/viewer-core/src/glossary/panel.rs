use serde::{Deserialize, Serialize};
use subterm_subtitle_api::GlossaryItem;
use subterm_timed_text::CueKey;

pub const NO_TERMS: &str = "No terms detected.";

/// What the glossary panel shows for the current cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GlossaryPanel {
    Terms {
        cue_key: String,
        items: Vec<GlossaryItem>,
    },
    NoTerms {
        cue_key: String,
    },
}

impl GlossaryPanel {
    pub fn for_cue(cue_key: &CueKey, items: Vec<GlossaryItem>) -> Self {
        let cue_key = cue_key.to_string();
        if items.is_empty() {
            Self::NoTerms { cue_key }
        } else {
            Self::Terms { cue_key, items }
        }
    }

    pub fn no_terms(cue_key: &CueKey) -> Self {
        Self::NoTerms {
            cue_key: cue_key.to_string(),
        }
    }

    pub fn cue_key(&self) -> &str {
        match self {
            Self::Terms { cue_key, .. } | Self::NoTerms { cue_key } => cue_key,
        }
    }

    pub fn items(&self) -> &[GlossaryItem] {
        match self {
            Self::Terms { items, .. } => items,
            Self::NoTerms { .. } => &[],
        }
    }

    /// One display line per entry, in backend order.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::NoTerms { .. } => vec![NO_TERMS.to_string()],
            Self::Terms { items, .. } => items.iter().map(render_item).collect(),
        }
    }
}

fn render_item(item: &GlossaryItem) -> String {
    let mut line = item.term.clone();
    if !item.term_original.is_empty() && item.term_original != item.term {
        line.push_str(&format!(" ({})", item.term_original));
    }
    if !item.definition.is_empty() {
        line.push_str(": ");
        line.push_str(&item.definition);
    }
    line
}
