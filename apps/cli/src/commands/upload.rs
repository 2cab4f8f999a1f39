use std::path::Path;

use anyhow::Context;
use subterm_subtitle_api::{MediaFile, UploadRequest, UploadWithSrtRequest, parse_target_languages};

use crate::Api;

pub async fn run(
    api: &Api,
    file: &Path,
    target_langs: &str,
    asr_model: &str,
    src_lang: &str,
) -> anyhow::Result<String> {
    let request = UploadRequest {
        file: read_media(file).await?,
        target_langs: parse_target_languages(target_langs),
        asr_model: asr_model.to_string(),
        src_lang: src_lang.to_string(),
    };
    tracing::info!(file = %file.display(), langs = ?request.target_langs, "uploading");

    let response = api.upload(request).await?;
    println!("task_id: {}", response.task_id);
    Ok(response.task_id)
}

pub async fn run_with_srt(
    api: &Api,
    video: &Path,
    srt: &Path,
    srt_lang: &str,
    target_langs: &str,
) -> anyhow::Result<String> {
    let request = UploadWithSrtRequest {
        video: read_media(video).await?,
        srt: read_media(srt).await?,
        srt_lang: srt_lang.to_string(),
        target_langs: parse_target_languages(target_langs),
    };
    tracing::info!(video = %video.display(), srt = %srt.display(), "uploading_with_srt");

    let response = api.upload_with_srt(request).await?;
    println!("task_id: {}", response.task_id);
    Ok(response.task_id)
}

async fn read_media(path: &Path) -> anyhow::Result<MediaFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(MediaFile {
        mime_type: mime_type(path).to_string(),
        file_name,
        data,
    })
}

fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        _ => "application/octet-stream",
    }
}
