use std::{fmt, path::PathBuf, str::FromStr};

use eframe::egui::ColorImage;
use serde::Deserialize;

use crate::error::ValidationError;
use crate::validate::{is_valid_url, sanitize};

/// Output kind chosen with the format radio buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    /// Best audio stream, converted to MP3
    Audio,
    /// Video + audio merged into MP4
    Video,
}

impl MediaFormat {
    pub fn label(self) -> &'static str {
        match self {
            MediaFormat::Audio => "Audio (MP3)",
            MediaFormat::Video => "Video (MP4)",
        }
    }

    /// Selectable qualities, lowest first
    pub fn qualities(self) -> &'static [&'static str] {
        match self {
            MediaFormat::Audio => &["128kbps", "192kbps", "256kbps", "320kbps"],
            MediaFormat::Video => &["360p", "480p", "720p", "1080p", "Best"],
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Audio => "mp3",
            MediaFormat::Video => "mp4",
        }
    }

    /// Highest quality on offer; selected whenever the format changes
    pub fn default_quality(self) -> &'static str {
        self.qualities().last().copied().unwrap_or("Best")
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFormat::Audio => f.write_str("MP3"),
            MediaFormat::Video => f.write_str("MP4"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Best,
    /// Maximum video height in pixels
    MaxHeight(u32),
    /// Target audio bitrate in kbps
    Bitrate(u32),
}

impl Quality {
    fn fits(self, format: MediaFormat) -> bool {
        matches!(
            (format, self),
            (MediaFormat::Audio, Quality::Bitrate(_))
                | (MediaFormat::Video, Quality::Best | Quality::MaxHeight(_))
        )
    }
}

impl FromStr for Quality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("best") {
            return Ok(Quality::Best);
        }
        if let Some(kbps) = s.strip_suffix("kbps") {
            return kbps.trim().parse().map(Quality::Bitrate).map_err(|_| ());
        }
        if let Some(px) = s.strip_suffix('p') {
            return px.trim().parse().map(Quality::MaxHeight).map_err(|_| ());
        }
        Err(())
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Best => f.write_str("Best"),
            Quality::MaxHeight(h) => write!(f, "{h}p"),
            Quality::Bitrate(b) => write!(f, "{b}kbps"),
        }
    }
}

/// Snapshot of the user's choices, taken when Download is pressed.
/// The worker only ever sees this copy, so later edits in the UI do not
/// affect a running download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format: MediaFormat,
    pub quality: Quality,
    pub destination: PathBuf,
}

impl DownloadRequest {
    pub fn new(
        url: &str,
        format: MediaFormat,
        quality: &str,
        destination: &str,
    ) -> Result<Self, ValidationError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(ValidationError::MissingDestination);
        }
        let destination = PathBuf::from(destination);
        if !destination.is_dir() {
            return Err(ValidationError::DestinationNotFound(destination));
        }
        if !is_valid_url(url) {
            return Err(ValidationError::InvalidUrl(url.to_string()));
        }
        let quality = quality
            .parse::<Quality>()
            .ok()
            .filter(|q| q.fits(format))
            .ok_or_else(|| ValidationError::InvalidQuality {
                quality: quality.to_string(),
                format: format.to_string(),
            })?;

        Ok(Self {
            url: url.to_string(),
            format,
            quality,
            destination,
        })
    }
}

/// Events flowing from a download worker to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Sent by the task runner before the operation starts
    Started,
    Progressing {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        total_bytes_estimate: Option<u64>,
        speed_bytes_per_sec: Option<f64>,
    },
    /// A stream finished downloading; post-processing follows
    Processing,
    Finished,
    Failed { message: String },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Finished | ProgressEvent::Failed { .. })
    }
}

/// Metadata returned by `yt-dlp --dump-single-json`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoInfo {
    #[serde(default = "unknown_title")]
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Length in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

fn unknown_title() -> String {
    "Unknown Title".to_string()
}

impl VideoInfo {
    /// "h:mm:ss" or "m:ss"
    pub fn duration_text(&self) -> Option<String> {
        let secs = self.duration.filter(|d| d.is_finite() && *d >= 0.0)? as u64;
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        Some(if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m}:{s:02}")
        })
    }

    /// Preview of the saved file name. yt-dlp applies its own character
    /// substitutions to `%(title)s`, so the real name may differ.
    pub fn approximate_file_name(&self, format: MediaFormat) -> String {
        format!("{}.{}", sanitize(&self.title), format.extension())
    }
}

/// Results of a metadata fetch, delivered to the UI loop. `fetch` numbers
/// the Fetch click that produced the message.
pub enum MetadataMessage {
    Info { fetch: u64, info: VideoInfo },
    Thumbnail { fetch: u64, image: ColorImage },
}

impl MetadataMessage {
    /// False for leftovers of an earlier fetch that was superseded by `latest`
    pub fn belongs_to(&self, latest: u64) -> bool {
        match self {
            MetadataMessage::Info { fetch, .. } | MetadataMessage::Thumbnail { fetch, .. } => {
                *fetch == latest
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_strings_parse() {
        assert_eq!("192kbps".parse::<Quality>(), Ok(Quality::Bitrate(192)));
        assert_eq!("720p".parse::<Quality>(), Ok(Quality::MaxHeight(720)));
        assert_eq!("Best".parse::<Quality>(), Ok(Quality::Best));
        assert!("loud".parse::<Quality>().is_err());
        for format in [MediaFormat::Audio, MediaFormat::Video] {
            for q in format.qualities() {
                let parsed: Quality = q.parse().unwrap();
                assert_eq!(parsed.to_string(), *q);
                assert!(parsed.fits(format));
            }
        }
    }

    #[test]
    fn default_quality_is_highest() {
        assert_eq!(MediaFormat::Audio.default_quality(), "320kbps");
        assert_eq!(MediaFormat::Video.default_quality(), "Best");
    }

    #[test]
    fn request_validation_order() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();

        assert_eq!(
            DownloadRequest::new("  ", MediaFormat::Audio, "192kbps", dir_str),
            Err(ValidationError::EmptyUrl)
        );
        assert_eq!(
            DownloadRequest::new("youtu.be/abc", MediaFormat::Audio, "192kbps", ""),
            Err(ValidationError::MissingDestination)
        );
        let missing = dir.path().join("nope");
        assert_eq!(
            DownloadRequest::new(
                "youtu.be/abc",
                MediaFormat::Audio,
                "192kbps",
                missing.to_str().unwrap()
            ),
            Err(ValidationError::DestinationNotFound(missing))
        );
        assert!(matches!(
            DownloadRequest::new("https://vimeo.com/1", MediaFormat::Audio, "192kbps", dir_str),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(matches!(
            DownloadRequest::new("youtu.be/abc", MediaFormat::Audio, "720p", dir_str),
            Err(ValidationError::InvalidQuality { .. })
        ));

        let req =
            DownloadRequest::new(" youtu.be/abc ", MediaFormat::Video, "720p", dir_str).unwrap();
        assert_eq!(req.url, "youtu.be/abc");
        assert_eq!(req.quality, Quality::MaxHeight(720));
        assert_eq!(req.destination, dir.path());
    }

    #[test]
    fn video_info_defaults() {
        let info: VideoInfo = serde_json::from_str(r#"{"id":"x","duration":3725}"#).unwrap();
        assert_eq!(info.title, "Unknown Title");
        assert_eq!(info.thumbnail, None);
        assert_eq!(info.duration_text().as_deref(), Some("1:02:05"));
    }

    #[test]
    fn file_name_preview_uses_format_extension() {
        let info = VideoInfo {
            title: "Live: Q&A?".into(),
            uploader: None,
            duration: None,
            thumbnail: None,
        };
        assert_eq!(info.approximate_file_name(MediaFormat::Audio), "Live_ Q&A_.mp3");
        assert_eq!(info.approximate_file_name(MediaFormat::Video), "Live_ Q&A_.mp4");
    }

    #[test]
    fn stale_metadata_is_recognised() {
        use eframe::egui::Color32;

        let thumb = MetadataMessage::Thumbnail {
            fetch: 1,
            image: ColorImage::new([1, 1], Color32::BLACK),
        };
        assert!(thumb.belongs_to(1));
        assert!(!thumb.belongs_to(2));

        let info = MetadataMessage::Info {
            fetch: 3,
            info: serde_json::from_str("{}").unwrap(),
        };
        assert!(info.belongs_to(3));
        assert!(!info.belongs_to(4));
    }
}
