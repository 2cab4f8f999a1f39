use crate::cue::Cue;
use crate::error::Error;
use crate::timestamp::parse_timestamp;
use crate::{blocks, normalize_newlines};

pub fn parse_vtt(document: &str) -> Result<Vec<Cue>, Error> {
    let document = normalize_newlines(document);
    let header = document.lines().next().unwrap_or_default();
    if !header.starts_with("WEBVTT") {
        return Err(Error::MissingHeader);
    }

    let mut cues = Vec::new();
    for block in blocks(&document).into_iter().skip(1) {
        let first = block[0].trim_start();
        if first.starts_with("NOTE") || first.starts_with("STYLE") || first.starts_with("REGION") {
            continue;
        }

        let (id, timing_idx) = if block[0].contains("-->") {
            (None, 0)
        } else {
            (Some(block[0].trim().to_string()), 1)
        };

        let Some(timing) = block.get(timing_idx) else {
            tracing::debug!(block = ?block, "vtt_block_without_timing");
            continue;
        };
        let Some((start, end)) = parse_timing_line(timing) else {
            tracing::debug!(timing = %timing, "vtt_block_with_malformed_timing");
            continue;
        };

        cues.push(Cue {
            id,
            position: Some(cues.len() + 1),
            start,
            end,
            text: block[timing_idx + 1..].join("\n"),
        });
    }
    Ok(cues)
}

/// `start --> end [settings...]`
pub(crate) fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start)?, parse_timestamp(end)?))
}
