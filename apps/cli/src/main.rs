mod commands;
mod runtime;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use subterm_http::ReqwestHttpClient;
use subterm_subtitle_api::SubtitleApiClient;
use subterm_viewer_core::GlossaryMode;

pub(crate) type Api = SubtitleApiClient<ReqwestHttpClient>;

#[derive(Parser)]
#[command(name = "subterm", about = "Subtitle jobs with a cue-synced glossary")]
struct Cli {
    #[arg(long, env = "SUBTERM_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "SUBTERM_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Print events as JSON lines instead of text.
    #[arg(long, env = "SUBTERM_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ModeArg {
    Bulk,
    Streaming,
}

impl From<ModeArg> for GlossaryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Bulk => GlossaryMode::Bulk,
            ModeArg::Streaming => GlossaryMode::Streaming,
        }
    }
}

#[derive(clap::Args)]
pub(crate) struct WatchArgs {
    /// Language to show once tracks are available; defaults to the first
    /// track that is not in the source language.
    #[arg(long)]
    lang: Option<String>,

    /// Playback positions in seconds to replay against the showing track.
    #[arg(long, value_delimiter = ',')]
    at: Vec<f64>,

    #[arg(long, value_enum, env = "SUBTERM_GLOSSARY_MODE", default_value = "bulk")]
    mode: ModeArg,

    #[arg(long, env = "SUBTERM_POLL_INTERVAL_MS", default_value_t = 1500)]
    poll_interval_ms: u64,

    #[arg(long, env = "SUBTERM_SOURCE_LANG", default_value = "ko")]
    source_lang: String,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a media file for transcription and translation.
    Upload {
        file: PathBuf,
        #[arg(long, env = "SUBTERM_TARGET_LANGS", default_value = "en")]
        target_langs: String,
        #[arg(long, env = "SUBTERM_ASR_MODEL", default_value = "base")]
        asr_model: String,
        #[arg(long, default_value = "ko")]
        src_lang: String,
        /// Keep following the job after upload.
        #[arg(long)]
        watch: bool,
        #[command(flatten)]
        watch_args: WatchArgs,
    },
    /// Upload a video together with an existing SRT to translate.
    UploadWithSrt {
        video: PathBuf,
        srt: PathBuf,
        #[arg(long, default_value = "ko")]
        srt_lang: String,
        #[arg(long, env = "SUBTERM_TARGET_LANGS", default_value = "en")]
        target_langs: String,
        #[arg(long)]
        watch: bool,
        #[command(flatten)]
        watch_args: WatchArgs,
    },
    /// Follow an existing job, then replay playback positions.
    Watch {
        task_id: String,
        #[command(flatten)]
        watch_args: WatchArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let http = ReqwestHttpClient::with_timeout(&cli.base_url, Duration::from_secs(cli.timeout_secs))
        .map_err(|e| anyhow::anyhow!("invalid base url {}: {e}", cli.base_url))?;
    let api = Arc::new(SubtitleApiClient::new(http));
    let timeout = Duration::from_secs(cli.timeout_secs);

    match cli.command {
        Command::Upload {
            file,
            target_langs,
            asr_model,
            src_lang,
            watch,
            watch_args,
        } => {
            let task_id =
                commands::upload::run(&api, &file, &target_langs, &asr_model, &src_lang).await?;
            if watch {
                commands::watch::run(api, task_id, watch_args, timeout, cli.json).await?;
            }
        }
        Command::UploadWithSrt {
            video,
            srt,
            srt_lang,
            target_langs,
            watch,
            watch_args,
        } => {
            let task_id =
                commands::upload::run_with_srt(&api, &video, &srt, &srt_lang, &target_langs)
                    .await?;
            if watch {
                commands::watch::run(api, task_id, watch_args, timeout, cli.json).await?;
            }
        }
        Command::Watch {
            task_id,
            watch_args,
        } => commands::watch::run(api, task_id, watch_args, timeout, cli.json).await?,
    }

    Ok(())
}
