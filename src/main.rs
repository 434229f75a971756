//! Main application for the YouTube Downloader GUI

// Error taxonomy
mod error;
// Environment configuration
mod config;
// `log` backend feeding the log panel
mod logging;
// Data models for requests, progress and metadata
mod model;
// URL checks and filename helpers
mod validate;
// yt-dlp option building
mod options;
// Progress parsing and UI-side progress state
mod progress;
// Single-download task runner
mod task;
// Media resolver (yt-dlp)
mod downloader;
// Thumbnail fetching module
mod thumbnail;
// Persisted settings
mod settings;
// Startup tool probe
mod capability;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
// eframe/egui for GUI application framework
use eframe::{App, Frame, egui};
use egui::{TextureHandle, TextureOptions, Visuals};
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use tokio::{
    runtime::Runtime,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};

use config::AppConfig;
use downloader::{MediaResolver, YtDlp};
use error::{AppError, ValidationError};
use logging::{LogReceiver, UiLogger};
use model::{DownloadRequest, MediaFormat, MetadataMessage, ProgressEvent, VideoInfo};
use progress::ProgressView;
use settings::{Settings, SettingsStore};
use task::TaskRunner;

/// Lines kept in the log panel
const LOG_CAPACITY: usize = 500;

/// Program entry point: initializes logging and runtime, then launches GUI
fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let logs = UiLogger::init(config.log_level).context("installing logger")?;

    let runtime = Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("downloader-worker")
            .build()
            .context("building tokio runtime")?,
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("YouTube Downloader")
            .with_inner_size([600.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "YouTube Downloader",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(DownloaderApp::new(&cc.egui_ctx, config, runtime, logs))
        }),
    )
    .map_err(|e| anyhow!("{e}"))
}

/// Application state for the GUI. Only the UI thread touches it; workers
/// report back through channels that `update` drains every frame.
struct DownloaderApp {
    runtime: Arc<Runtime>,
    resolver: Arc<dyn MediaResolver>,
    settings_store: SettingsStore,
    runner: TaskRunner,

    /// Input field for YouTube URL
    url_input: String,
    /// Destination folder for downloads
    download_path: String,
    format: MediaFormat,
    quality: String,

    video: Option<VideoInfo>,
    /// Displayed thumbnail; kept here for as long as it is shown
    thumbnail: Option<TextureHandle>,
    progress: ProgressView,
    log_lines: Vec<String>,

    logs: LogReceiver,
    /// Number of the latest Fetch; older metadata is discarded
    fetch_seq: u64,
    metadata_tx: UnboundedSender<MetadataMessage>,
    metadata_rx: UnboundedReceiver<MetadataMessage>,
}

impl DownloaderApp {
    fn new(ctx: &egui::Context, config: AppConfig, runtime: Arc<Runtime>, logs: LogReceiver) -> Self {
        let settings_store = SettingsStore::new(config.settings_path.clone());
        let settings = settings_store.load();
        let resolver: Arc<dyn MediaResolver> = Arc::new(YtDlp::new(
            config.ytdlp_bin.clone(),
            config.ffmpeg_location.clone(),
        ));
        let (metadata_tx, metadata_rx) = unbounded_channel();

        // probe tools without holding up the first paint
        let probe_ctx = ctx.clone();
        runtime.spawn(async move {
            capability::startup_check(&config.ytdlp_bin, &config.ffmpeg_bin, config.probe_delay)
                .await;
            probe_ctx.request_repaint();
        });

        let format = MediaFormat::Audio;
        Self {
            runner: TaskRunner::new(runtime.handle().clone()),
            runtime,
            resolver,
            settings_store,
            url_input: String::new(),
            download_path: settings.download_path,
            format,
            quality: format.default_quality().to_string(),
            video: None,
            thumbnail: None,
            progress: ProgressView::default(),
            log_lines: Vec::new(),
            logs,
            fetch_seq: 0,
            metadata_tx,
            metadata_rx,
        }
    }

    fn save_settings(&self) {
        self.settings_store.save(&Settings {
            download_path: self.download_path.clone(),
        });
    }

    fn fetch_video_info(&mut self, ctx: &egui::Context) {
        let url = self.url_input.trim().to_string();
        if url.is_empty() {
            log::error!("{}", AppError::from(ValidationError::EmptyUrl));
            return;
        }
        if !validate::is_valid_url(&url) {
            log::error!("{}", AppError::from(ValidationError::InvalidUrl(url)));
            return;
        }
        log::info!("Fetching video information for: {}", url);
        self.fetch_seq += 1;
        let fetch = self.fetch_seq;

        let resolver = Arc::clone(&self.resolver);
        let tx = self.metadata_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            match resolver.fetch_info(&url).await {
                Ok(info) => {
                    let thumb_url = info
                        .thumbnail
                        .clone()
                        .or_else(|| validate::fallback_thumbnail_url(&url));
                    let _ = tx.send(MetadataMessage::Info { fetch, info });
                    ctx.request_repaint();

                    if let Some(thumb_url) = thumb_url {
                        let fetched = tokio::task::spawn_blocking(move || {
                            thumbnail::fetch_thumbnail(&thumb_url)
                        })
                        .await;
                        match fetched {
                            Ok(Ok(image)) => {
                                let _ = tx.send(MetadataMessage::Thumbnail { fetch, image });
                            }
                            Ok(Err(e)) => log::error!("{}", e),
                            Err(e) => log::error!("{}", AppError::Thumbnail(e.to_string())),
                        }
                    }
                }
                Err(e) => log::error!("{}", e),
            }
            ctx.request_repaint();
        });
    }

    fn start_download(&mut self, ctx: &egui::Context) {
        let request = match DownloadRequest::new(
            &self.url_input,
            self.format,
            &self.quality,
            &self.download_path,
        ) {
            Ok(request) => request,
            Err(e) => {
                log::error!("{}", AppError::from(e));
                return;
            }
        };
        self.save_settings();

        let resolver = Arc::clone(&self.resolver);
        let snapshot = request.clone();
        let ctx = ctx.clone();
        let submitted = self.runner.submit(move |progress| async move {
            let result = resolver.download(&snapshot, progress).await;
            ctx.request_repaint();
            result
        });

        match submitted {
            Ok(id) => {
                self.progress = ProgressView::default();
                log::debug!("download task {} submitted", id);
                log::info!("Starting download: {}", request.url);
                log::info!("Format: {}, Quality: {}", request.format, request.quality);
            }
            Err(e) => log::error!("{}", e),
        }
    }

    fn cancel_download(&mut self) {
        if self.runner.request_cancel() {
            log::info!("Cancelling download...");
            self.progress.label = "Cancelled".to_string();
        }
    }

    /// Applies everything the workers sent since the last frame.
    fn drain_channels(&mut self, ctx: &egui::Context) {
        for event in self.runner.poll() {
            if let Some(line) = self.progress.apply(&event) {
                log::info!("{}", line);
            }
            match event {
                ProgressEvent::Finished => log::info!("Download completed successfully"),
                ProgressEvent::Failed { message } => log::error!("{}", message),
                _ => {}
            }
        }

        while let Ok(message) = self.metadata_rx.try_recv() {
            if !message.belongs_to(self.fetch_seq) {
                log::debug!("dropping metadata from a superseded fetch");
                continue;
            }
            match message {
                MetadataMessage::Info { info, .. } => {
                    log::info!("Video title: {}", info.title);
                    self.thumbnail = None;
                    self.video = Some(info);
                }
                MetadataMessage::Thumbnail { image, .. } => {
                    self.thumbnail =
                        Some(ctx.load_texture("thumbnail", image, TextureOptions::default()));
                }
            }
        }

        while let Ok(line) = self.logs.try_recv() {
            self.log_lines.push(line);
        }
        if self.log_lines.len() > LOG_CAPACITY {
            let excess = self.log_lines.len() - LOG_CAPACITY;
            self.log_lines.drain(..excess);
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.drain_channels(ctx);
        let busy = self.runner.is_busy();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("YouTube Downloader");

            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.label("URL:");
                    ui.text_edit_singleline(&mut self.url_input);
                    if ui.button("Fetch").clicked() {
                        self.fetch_video_info(ctx);
                    }
                });
                if let Some(video) = &self.video {
                    ui.label(format!("Title: {}", video.title));
                    let mut details = Vec::new();
                    if let Some(uploader) = &video.uploader {
                        details.push(uploader.clone());
                    }
                    if let Some(duration) = video.duration_text() {
                        details.push(duration);
                    }
                    if !details.is_empty() {
                        ui.weak(details.join(" · "));
                    }
                    ui.weak(format!(
                        "Saves as (approx.): {}",
                        video.approximate_file_name(self.format)
                    ));
                }
                if let Some(tex) = &self.thumbnail {
                    ui.image(tex);
                }
            });

            // Folder selection
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.label("Save to:");
                    ui.text_edit_singleline(&mut self.download_path);
                    if ui.button("Browse…").clicked() {
                        if let Some(folder) = FileDialog::new()
                            .set_directory(&self.download_path)
                            .pick_folder()
                        {
                            self.download_path = folder.display().to_string();
                            self.save_settings();
                        }
                    }
                    if ui.button("Open Folder").clicked() {
                        open_folder(PathBuf::from(&self.download_path));
                    }
                });
            });

            ui.group(|ui| {
                ui.horizontal(|ui| {
                    for format in [MediaFormat::Audio, MediaFormat::Video] {
                        if ui.radio_value(&mut self.format, format, format.label()).changed() {
                            self.quality = format.default_quality().to_string();
                        }
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Quality:");
                    egui::ComboBox::from_id_source("quality")
                        .selected_text(&self.quality)
                        .show_ui(ui, |ui| {
                            for q in self.format.qualities() {
                                ui.selectable_value(&mut self.quality, q.to_string(), *q);
                            }
                        });
                });
            });

            ui.group(|ui| {
                let bar = match self.progress.fraction {
                    Some(fraction) => egui::ProgressBar::new(fraction),
                    None => egui::ProgressBar::new(0.0).animate(true),
                };
                ui.add(bar.text(self.progress.label.as_str()));
            });

            ui.horizontal(|ui| {
                if ui.add_enabled(!busy, egui::Button::new("Download")).clicked() {
                    self.start_download(ctx);
                }
                if ui.add_enabled(busy, egui::Button::new("Cancel")).clicked() {
                    self.cancel_download();
                }
            });

            ui.separator();
            ui.label("Log");
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for line in &self.log_lines {
                        ui.monospace(line);
                    }
                });
        });

        // Request periodic repaint for progress and log updates
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

fn open_folder(folder: PathBuf) {
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let opener = "explorer";
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";

        if let Err(e) = std::process::Command::new(opener).arg(&folder).spawn() {
            log::error!("Could not open {}: {}", folder.display(), e);
        }
    });
}
