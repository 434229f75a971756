use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};

use crate::error::AppError;
use crate::model::{DownloadRequest, VideoInfo};
use crate::options::ResolverOptions;
use crate::progress::parse_progress_from_line;
use crate::task::ProgressSender;

/// Extracts metadata and performs downloads for a video URL.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, AppError>;

    /// Downloads `request`, reporting intermediate progress on `progress`.
    async fn download(
        &self,
        request: &DownloadRequest,
        progress: ProgressSender,
    ) -> Result<(), AppError>;
}

/// Resolver backed by the yt-dlp executable
pub struct YtDlp {
    bin: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(bin: PathBuf, ffmpeg_location: Option<PathBuf>) -> Self {
        Self {
            bin,
            ffmpeg_location,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl MediaResolver for YtDlp {
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, AppError> {
        let output = self
            .command()
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--skip-download",
                "--quiet",
                "--no-warnings",
                "--",
                url,
            ])
            .output()
            .await
            .map_err(|e| AppError::Resolution(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Resolution(
                last_error_line(stderr.lines()).unwrap_or_else(|| output.status.to_string()),
            ));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::Resolution(format!("unexpected yt-dlp output: {e}")))
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        progress: ProgressSender,
    ) -> Result<(), AppError> {
        let args = ResolverOptions::for_request(request)
            .with_ffmpeg_location(self.ffmpeg_location.clone())
            .to_args(&request.url);
        log::debug!("yt-dlp {}", args.join(" "));

        let mut child = self
            .command()
            .args(&args)
            .spawn()
            .map_err(|e| AppError::Download(format!("failed to run yt-dlp: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Download("yt-dlp stdout unavailable".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Download("yt-dlp stderr unavailable".into()))?;

        // stderr is drained concurrently so a chatty child cannot stall on a full pipe
        let errors = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).split(b'\n');
            let mut collected = Vec::new();
            loop {
                match lines.next_segment().await {
                    Ok(Some(raw)) => {
                        let line = decode_line(&raw);
                        log::debug!("yt-dlp stderr: {}", line);
                        collected.push(line);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::debug!("yt-dlp stderr read failed: {}", e);
                        break;
                    }
                }
            }
            collected
        });

        // output may not be UTF-8 (console code pages)
        let mut lines = BufReader::new(stdout).split(b'\n');
        while let Some(raw) = lines.next_segment().await? {
            let line = decode_line(&raw);
            if let Some(event) = parse_progress_from_line(&line) {
                if progress.send(event).is_err() {
                    // nobody is listening any more (soft-cancelled); stop the child too
                    log::debug!("progress receiver gone, stopping yt-dlp");
                    let _ = child.kill().await;
                    return Ok(());
                }
            } else if !line.trim().is_empty() {
                log::debug!("yt-dlp: {}", line);
            }
        }

        let status = child.wait().await?;
        let stderr_lines = errors.await.unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(AppError::Download(
                last_error_line(stderr_lines.iter().map(String::as_str))
                    .unwrap_or_else(|| format!("yt-dlp exited with {status}")),
            ))
        }
    }
}

/// One line of child output without its `\r\n` terminator
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Last `ERROR:` line without its prefix, falling back to the last non-empty line
fn last_error_line<'a>(lines: impl DoubleEndedIterator<Item = &'a str> + Clone) -> Option<String> {
    lines
        .clone()
        .rev()
        .find_map(|l| l.trim().strip_prefix("ERROR:").map(|m| m.trim().to_string()))
        .or_else(|| {
            lines
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
        })
}
