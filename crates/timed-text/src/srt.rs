use crate::cue::Cue;
use crate::vtt::parse_timing_line;
use crate::{blocks, normalize_newlines};

/// SRT blocks keep their numeric index as the cue id. Blocks without a
/// timing line are dropped.
pub fn parse_srt(document: &str) -> Vec<Cue> {
    let document = normalize_newlines(document);
    let mut cues = Vec::new();

    for block in blocks(&document) {
        let (id, timing_idx) = if block[0].trim().chars().all(|c| c.is_ascii_digit()) {
            (Some(block[0].trim().to_string()), 1)
        } else {
            (None, 0)
        };

        let Some((start, end)) = block
            .get(timing_idx)
            .filter(|line| line.contains("-->"))
            .and_then(|line| parse_timing_line(line))
        else {
            tracing::debug!(block = ?block, "srt_block_skipped");
            continue;
        };

        cues.push(Cue {
            id,
            position: Some(cues.len() + 1),
            start,
            end,
            text: block[timing_idx + 1..].join("\n").trim().to_string(),
        });
    }
    cues
}
