use std::{path::PathBuf, time::Duration};

use log::LevelFilter;

const APP_DIR: &str = "youtube-downloader";

/// Process-wide configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// yt-dlp executable (`YTGRAB_YTDLP`)
    pub ytdlp_bin: PathBuf,
    /// ffmpeg executable (`YTGRAB_FFMPEG`)
    pub ffmpeg_bin: PathBuf,
    /// Set when ffmpeg was configured explicitly; yt-dlp is then told where it is
    pub ffmpeg_location: Option<PathBuf>,
    /// Settings file (`YTGRAB_SETTINGS`)
    pub settings_path: PathBuf,
    /// `YTGRAB_LOG`
    pub log_level: LevelFilter,
    /// Delay before the startup tool probe
    pub probe_delay: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let ytdlp_bin = var("YTGRAB_YTDLP")
            .map(PathBuf::from)
            .unwrap_or_else(default_ytdlp);
        let ffmpeg_location = var("YTGRAB_FFMPEG").map(PathBuf::from);
        let ffmpeg_bin = ffmpeg_location
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        let settings_path = var("YTGRAB_SETTINGS")
            .map(PathBuf::from)
            .unwrap_or_else(default_settings_path);
        let log_level = var("YTGRAB_LOG")
            .and_then(|v| v.parse().ok())
            .unwrap_or(LevelFilter::Info);

        Self {
            ytdlp_bin,
            ffmpeg_bin,
            ffmpeg_location,
            settings_path,
            log_level,
            probe_delay: Duration::from_secs(1),
        }
    }
}

fn default_ytdlp() -> PathBuf {
    let bin = if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" };
    PathBuf::from(bin)
}

fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join("settings.json"))
        .unwrap_or_else(|| PathBuf::from("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]);
        assert!(cfg.ytdlp_bin.to_string_lossy().starts_with("yt-dlp"));
        assert_eq!(cfg.ffmpeg_bin, PathBuf::from("ffmpeg"));
        assert_eq!(cfg.ffmpeg_location, None);
        assert!(cfg.settings_path.ends_with("settings.json"));
        assert_eq!(cfg.log_level, LevelFilter::Info);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("YTGRAB_YTDLP", "/opt/yt-dlp"),
            ("YTGRAB_FFMPEG", "/opt/ffmpeg"),
            ("YTGRAB_SETTINGS", "/tmp/s.json"),
            ("YTGRAB_LOG", "debug"),
        ]);
        assert_eq!(cfg.ytdlp_bin, PathBuf::from("/opt/yt-dlp"));
        assert_eq!(cfg.ffmpeg_bin, PathBuf::from("/opt/ffmpeg"));
        assert_eq!(cfg.ffmpeg_location, Some(PathBuf::from("/opt/ffmpeg")));
        assert_eq!(cfg.settings_path, PathBuf::from("/tmp/s.json"));
        assert_eq!(cfg.log_level, LevelFilter::Debug);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = config(&[("YTGRAB_LOG", "chatty"), ("YTGRAB_YTDLP", "   ")]);
        assert_eq!(cfg.log_level, LevelFilter::Info);
        assert!(cfg.ytdlp_bin.to_string_lossy().starts_with("yt-dlp"));
    }
}
