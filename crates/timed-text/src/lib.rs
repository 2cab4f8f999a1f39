mod cue;
mod error;
mod srt;
mod timestamp;
mod vtt;

pub use cue::{Cue, CueKey, active_cues};
pub use error::Error;
pub use srt::parse_srt;
pub use timestamp::{format_srt_timestamp, parse_timestamp};
pub use vtt::parse_vtt;

/// Parses either format, picking WebVTT when the document carries its header.
pub fn parse(document: &str) -> Vec<Cue> {
    match parse_vtt(document) {
        Ok(cues) => cues,
        Err(Error::MissingHeader) => parse_srt(document),
    }
}

pub(crate) fn normalize_newlines(document: &str) -> String {
    document
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Splits a document into blank-line separated blocks of non-empty lines.
pub(crate) fn blocks(document: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in document.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
