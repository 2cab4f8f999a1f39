use std::collections::HashMap;
use std::future::Future;

use subterm_http::HttpClient;
use subterm_subtitle_api::{GlossaryItem, JobStatus, SubtitleApiClient};
use subterm_timed_text::Cue;

use crate::Result;

pub type GlossaryTable = HashMap<String, Vec<GlossaryItem>>;

/// Everything the viewer needs from the job backend. Implemented for the
/// HTTP client; tests plug in an in-memory double.
pub trait ViewerBackend: Send + Sync + 'static {
    fn job_status(&self, task_id: &str) -> impl Future<Output = Result<JobStatus>> + Send;

    fn track_cues(&self, locator: &str) -> impl Future<Output = Result<Vec<Cue>>> + Send;

    fn subtitle_text(
        &self,
        task_id: &str,
        language: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn glossary_table(
        &self,
        task_id: &str,
        language: &str,
    ) -> impl Future<Output = Result<GlossaryTable>> + Send;

    fn glossary_for_text(
        &self,
        text: &str,
        language: &str,
        src_language: &str,
    ) -> impl Future<Output = Result<Vec<GlossaryItem>>> + Send;
}

impl<C: HttpClient + 'static> ViewerBackend for SubtitleApiClient<C> {
    async fn job_status(&self, task_id: &str) -> Result<JobStatus> {
        Ok(self.status(task_id).await?)
    }

    async fn track_cues(&self, locator: &str) -> Result<Vec<Cue>> {
        let document = self.track(locator).await?;
        Ok(subterm_timed_text::parse(&document))
    }

    async fn subtitle_text(&self, task_id: &str, language: &str) -> Result<String> {
        Ok(SubtitleApiClient::subtitle_text(self, task_id, language).await?)
    }

    async fn glossary_table(&self, task_id: &str, language: &str) -> Result<GlossaryTable> {
        Ok(SubtitleApiClient::glossary_table(self, task_id, language).await?)
    }

    async fn glossary_for_text(
        &self,
        text: &str,
        language: &str,
        src_language: &str,
    ) -> Result<Vec<GlossaryItem>> {
        Ok(SubtitleApiClient::glossary_for_text(self, text, language, Some(src_language)).await?)
    }
}
