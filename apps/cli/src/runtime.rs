use subterm_viewer_core::{
    JobEvent, PanelEvent, SubtitleTextEvent, TrackEvent, ViewerRuntime,
};

/// Prints viewer events to stdout, as text or one JSON object per line.
pub struct CliRuntime {
    json: bool,
}

impl CliRuntime {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

fn print_json(line: serde_json::Result<String>) {
    match line {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "event_serialize_failed"),
    }
}

impl ViewerRuntime for CliRuntime {
    fn emit_job(&self, event: JobEvent) {
        if self.json {
            return print_json(serde_json::to_string(&event));
        }
        match event {
            JobEvent::Progress {
                state,
                progress,
                message,
                ..
            } => println!("[job] {state} {:>3.0}% {message}", progress * 100.0),
            JobEvent::Completed { task_id } => println!("[job] {task_id} completed"),
            JobEvent::Failed { task_id, message } => eprintln!("[job] {task_id} failed: {message}"),
        }
    }

    fn emit_tracks(&self, event: TrackEvent) {
        if self.json {
            return print_json(serde_json::to_string(&event));
        }
        match event {
            TrackEvent::Available {
                languages,
                selected,
                ..
            } => println!(
                "[tracks] {} (selected: {})",
                languages.join(", "),
                selected.as_deref().unwrap_or("-")
            ),
            TrackEvent::Activated { language, .. } => println!("[tracks] showing {language}"),
        }
    }

    fn emit_panel(&self, event: PanelEvent) {
        if self.json {
            return print_json(serde_json::to_string(&event));
        }
        println!("[glossary:{}] cue {}", event.language, event.panel.cue_key());
        for line in event.panel.lines() {
            println!("  - {line}");
        }
    }

    fn emit_subtitle_text(&self, event: SubtitleTextEvent) {
        if self.json {
            return print_json(serde_json::to_string(&event));
        }
        match event.text {
            Some(text) => println!(
                "[srt:{}] {} cues",
                event.language,
                subterm_timed_text::parse(&text).len()
            ),
            None => println!("[srt:{}] unavailable", event.language),
        }
    }
}
