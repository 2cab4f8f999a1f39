use std::collections::HashMap;

use subterm_http::{HttpClient, MultipartForm};

use crate::error::Error;
use crate::types::{
    GlossaryItem, GlossaryResponse, GlossaryTableResponse, JobStatus, UploadRequest,
    UploadResponse, UploadWithSrtRequest,
};

pub struct SubtitleApiClient<C> {
    http: C,
}

impl<C: HttpClient> SubtitleApiClient<C> {
    pub fn new(http: C) -> Self {
        Self { http }
    }

    pub async fn upload(&self, req: UploadRequest) -> Result<UploadResponse, Error> {
        let (content_type, body) = MultipartForm::new()
            .file(
                "file",
                &req.file.file_name,
                &req.file.mime_type,
                &req.file.data,
            )
            .text("target_langs", &req.target_langs.join(","))
            .text("asr_model", &req.asr_model)
            .text("src_lang", &req.src_lang)
            .finish();

        let bytes = self
            .http
            .post("/upload", body, &content_type)
            .await
            .map_err(Error::Http)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn upload_with_srt(&self, req: UploadWithSrtRequest) -> Result<UploadResponse, Error> {
        let (content_type, body) = MultipartForm::new()
            .file(
                "video",
                &req.video.file_name,
                &req.video.mime_type,
                &req.video.data,
            )
            .file("srt", &req.srt.file_name, &req.srt.mime_type, &req.srt.data)
            .text("srt_lang", &req.srt_lang)
            .text("target_langs", &req.target_langs.join(","))
            .finish();

        let bytes = self
            .http
            .post("/upload_with_srt", body, &content_type)
            .await
            .map_err(Error::Http)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn status(&self, task_id: &str) -> Result<JobStatus, Error> {
        let path = format!("/status/{}", urlencoding::encode(task_id));
        let bytes = self.http.get(&path).await.map_err(Error::Http)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn video_path(&self, task_id: &str) -> String {
        format!("/video/{}", urlencoding::encode(task_id))
    }

    /// Plain-text SRT rendering of one language, for the reference side panel.
    pub async fn subtitle_text(&self, task_id: &str, lang: &str) -> Result<String, Error> {
        let path = format!(
            "/srt/{}/{}",
            urlencoding::encode(task_id),
            urlencoding::encode(lang)
        );
        let bytes = self.http.get(&path).await.map_err(Error::Http)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Fetches a timed-text resource by the locator the status endpoint handed out.
    pub async fn track(&self, locator: &str) -> Result<String, Error> {
        let bytes = self.http.get(locator).await.map_err(Error::Http)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn glossary_table(
        &self,
        task_id: &str,
        lang: &str,
    ) -> Result<HashMap<String, Vec<GlossaryItem>>, Error> {
        let path = format!(
            "/glossary_srt/{}/{}",
            urlencoding::encode(task_id),
            urlencoding::encode(lang)
        );
        let bytes = self.http.get(&path).await.map_err(Error::Http)?;
        let response: GlossaryTableResponse = serde_json::from_slice(&bytes)?;
        Ok(response.items_by_id)
    }

    pub async fn glossary_for_text(
        &self,
        text: &str,
        lang: &str,
        src_lang: Option<&str>,
    ) -> Result<Vec<GlossaryItem>, Error> {
        let mut path = format!(
            "/glossary?text={}&lang={}",
            urlencoding::encode(text),
            urlencoding::encode(lang)
        );
        if let Some(src_lang) = src_lang {
            path.push_str(&format!("&src_lang={}", urlencoding::encode(src_lang)));
        }
        let bytes = self.http.get(&path).await.map_err(Error::Http)?;
        let response: GlossaryResponse = serde_json::from_slice(&bytes)?;
        Ok(response.items)
    }
}
