use crate::events::*;

pub trait ViewerRuntime: Send + Sync + 'static {
    fn emit_job(&self, event: JobEvent);
    fn emit_tracks(&self, event: TrackEvent);
    fn emit_panel(&self, event: PanelEvent);
    fn emit_subtitle_text(&self, event: SubtitleTextEvent);
}
