//! One-shot check for the external tools, run in the background at startup.

use std::{path::Path, process::Stdio, time::Duration};

use tokio::process::Command;

use crate::error::AppError;

/// Runs `<bin> <version_arg>` and returns the first line it prints.
pub async fn probe_version(bin: &Path, version_arg: &str) -> Result<String, AppError> {
    let tool = bin.display().to_string();
    let output = Command::new(bin)
        .arg(version_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| AppError::Probe {
            tool: tool.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(AppError::Probe {
            tool,
            reason: output.status.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

/// Waits `delay`, then logs whether ffmpeg and yt-dlp are usable.
pub async fn startup_check(ytdlp: &Path, ffmpeg: &Path, delay: Duration) {
    tokio::time::sleep(delay).await;

    match probe_version(ffmpeg, "-version").await {
        Ok(version) => {
            log::info!("FFmpeg detected. Full functionality available.");
            log::debug!("{}", version);
        }
        Err(e) => {
            log::debug!("{}", e);
            log::warn!("FFmpeg not found! MP3 conversion and some video formats will not work.");
            log::warn!("Please install FFmpeg: https://ffmpeg.org/download.html");
        }
    }

    match probe_version(ytdlp, "--version").await {
        Ok(version) => log::info!("yt-dlp {} ready", version),
        Err(e) => log::error!("yt-dlp not available, downloads will fail ({})", e),
    }
}
