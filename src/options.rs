//! Translation of a [`DownloadRequest`] into yt-dlp options.

use std::path::PathBuf;

use crate::model::{DownloadRequest, MediaFormat, Quality};
use crate::progress::PROGRESS_TEMPLATE;

/// Audio extraction run by yt-dlp through ffmpeg after the download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: &'static str,
    pub target_bitrate_kbps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// `<dir>/%(title)s.%(ext)s`; yt-dlp fills in the title and extension
    pub output_template: String,
    pub format_selector: String,
    pub post_processing: Option<AudioExtraction>,
    pub merge_output_format: Option<&'static str>,
    pub ffmpeg_location: Option<PathBuf>,
}

impl ResolverOptions {
    pub fn for_request(request: &DownloadRequest) -> Self {
        let output_template = request
            .destination
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned();

        match request.format {
            MediaFormat::Audio => {
                let bitrate = match request.quality {
                    Quality::Bitrate(kbps) => kbps,
                    // validated upstream; treat anything else as the top bitrate
                    _ => 320,
                };
                Self {
                    output_template,
                    format_selector: "bestaudio/best".to_string(),
                    post_processing: Some(AudioExtraction {
                        codec: "mp3",
                        target_bitrate_kbps: bitrate,
                    }),
                    merge_output_format: None,
                    ffmpeg_location: None,
                }
            }
            MediaFormat::Video => Self {
                output_template,
                format_selector: video_selector(request.quality),
                post_processing: None,
                merge_output_format: Some("mp4"),
                ffmpeg_location: None,
            },
        }
    }

    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }

    /// Command line for a download of `url`
    pub fn to_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "-f".to_owned(),
            self.format_selector.clone(),
            "-o".to_owned(),
            self.output_template.clone(),
            "--quiet".to_owned(),
            "--no-warnings".to_owned(),
            "--no-playlist".to_owned(),
            "--progress".to_owned(),
            "--newline".to_owned(),
            "--progress-template".to_owned(),
            PROGRESS_TEMPLATE.to_owned(),
        ];

        if let Some(pp) = &self.post_processing {
            args.push("-x".to_owned());
            args.push("--audio-format".to_owned());
            args.push(pp.codec.to_owned());
            args.push("--audio-quality".to_owned());
            args.push(format!("{}K", pp.target_bitrate_kbps));
        }
        if let Some(container) = self.merge_output_format {
            args.push("--merge-output-format".to_owned());
            args.push(container.to_owned());
        }
        if let Some(location) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_owned());
            args.push(location.to_string_lossy().into_owned());
        }

        args.push("--".to_owned());
        args.push(url.to_owned());
        args
    }
}

fn video_selector(quality: Quality) -> String {
    match quality {
        Quality::MaxHeight(h) => format!(
            "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/best[height<={h}][ext=mp4]/best"
        ),
        _ => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
    }
}
