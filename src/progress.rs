//! Progress reporting: yt-dlp output parsing and the UI-side progress state.

use crate::model::ProgressEvent;

/// Passed to `--progress-template`. Every hook call prints one line of
/// `ytgrab|status|downloaded|total|estimate|speed`, with `NA` for unknown fields.
pub const PROGRESS_TEMPLATE: &str = "download:ytgrab|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s";

const LINE_PREFIX: &str = "ytgrab|";

pub fn parse_progress_from_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(LINE_PREFIX)?;
    let mut fields = rest.split('|');
    match fields.next()? {
        "downloading" => {
            let downloaded_bytes = number(fields.next()).map(|v| v as u64).unwrap_or(0);
            let total_bytes = number(fields.next()).map(|v| v as u64);
            let total_bytes_estimate = number(fields.next()).map(|v| v as u64);
            let speed_bytes_per_sec = number(fields.next());
            Some(ProgressEvent::Progressing {
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
                speed_bytes_per_sec,
            })
        }
        "finished" => Some(ProgressEvent::Processing),
        _ => None,
    }
}

fn number(field: Option<&str>) -> Option<f64> {
    field?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Percent complete, or `None` when no positive total is known
pub fn percentage(downloaded: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => Some(downloaded as f64 / total as f64 * 100.0),
        _ => None,
    }
}

/// Exact size when known, otherwise yt-dlp's estimate
fn known_total(total: Option<u64>, estimate: Option<u64>) -> Option<u64> {
    total.filter(|t| *t > 0).or(estimate.filter(|e| *e > 0))
}

/// Lets one log line through per ten percent crossed.
#[derive(Debug, Default)]
pub struct DecileThrottle {
    last_logged: i64,
}

impl DecileThrottle {
    pub fn should_log(&mut self, percent: f64) -> bool {
        let whole = percent.floor() as i64;
        if whole % 10 == 0 && whole != self.last_logged {
            self.last_logged = whole;
            true
        } else {
            false
        }
    }
}

/// What the progress bar and label show for the current download.
/// Owned and mutated by the UI thread only.
#[derive(Debug)]
pub struct ProgressView {
    /// 0.0..=1.0, `None` while the size is unknown
    pub fraction: Option<f32>,
    pub label: String,
    throttle: DecileThrottle,
}

impl Default for ProgressView {
    fn default() -> Self {
        Self {
            fraction: Some(0.0),
            label: "0%".to_string(),
            throttle: DecileThrottle::default(),
        }
    }
}

impl ProgressView {
    /// Updates the view and returns a line for the log, if one is due.
    pub fn apply(&mut self, event: &ProgressEvent) -> Option<String> {
        match event {
            ProgressEvent::Started => {
                *self = Self::default();
                None
            }
            ProgressEvent::Progressing {
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
                speed_bytes_per_sec,
            } => {
                let speed = speed_text(*speed_bytes_per_sec);
                let total = known_total(*total_bytes, *total_bytes_estimate);
                match percentage(*downloaded_bytes, total) {
                    Some(pct) => {
                        self.fraction = Some((pct / 100.0).clamp(0.0, 1.0) as f32);
                        self.label = format!("{:.1}% ({})", pct, speed);
                        if self.throttle.should_log(pct) {
                            let total = total.unwrap_or_default();
                            return Some(format!(
                                "Downloaded {:.1}MB of {:.1}MB ({:.1}%)",
                                mebibytes(*downloaded_bytes),
                                mebibytes(total),
                                pct
                            ));
                        }
                        None
                    }
                    None => {
                        self.fraction = None;
                        self.label = format!("Downloading... ({})", speed);
                        None
                    }
                }
            }
            ProgressEvent::Processing => {
                self.label = "Processing...".to_string();
                Some("Download finished, now processing...".to_string())
            }
            ProgressEvent::Finished => {
                self.fraction = Some(1.0);
                self.label = "Done".to_string();
                None
            }
            ProgressEvent::Failed { .. } => {
                self.label = "Failed".to_string();
                None
            }
        }
    }
}

fn mebibytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

fn speed_text(speed: Option<f64>) -> String {
    match speed {
        Some(bps) => format!("{:.2} MB/s", bps / 1024.0 / 1024.0),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progressing(downloaded: u64, total: Option<u64>) -> ProgressEvent {
        ProgressEvent::Progressing {
            downloaded_bytes: downloaded,
            total_bytes: total,
            total_bytes_estimate: None,
            speed_bytes_per_sec: None,
        }
    }

    #[test]
    fn percentage_of_known_total() {
        let pct = percentage(512_000, Some(1_048_576)).unwrap();
        assert!((pct - 48.828125).abs() < 1e-9);
        assert_eq!(percentage(10, Some(0)), None);
        assert_eq!(percentage(10, None), None);
    }

    #[test]
    fn throttle_logs_once_per_decile() {
        let mut throttle = DecileThrottle::default();
        let logged = [9.9, 10.0, 10.1, 19.9, 20.0]
            .into_iter()
            .filter(|p| throttle.should_log(*p))
            .count();
        assert_eq!(logged, 2);
    }

    #[test]
    fn throttle_skips_zero_and_repeats() {
        let mut throttle = DecileThrottle::default();
        assert!(!throttle.should_log(0.0));
        assert!(!throttle.should_log(0.5));
        assert!(throttle.should_log(30.2));
        assert!(!throttle.should_log(30.9));
        assert!(throttle.should_log(100.0));
    }

    #[test]
    fn parses_template_lines() {
        assert_eq!(
            parse_progress_from_line("ytgrab|downloading|512000|1048576|NA|1048576.5"),
            Some(ProgressEvent::Progressing {
                downloaded_bytes: 512_000,
                total_bytes: Some(1_048_576),
                total_bytes_estimate: None,
                speed_bytes_per_sec: Some(1_048_576.5),
            })
        );
        assert_eq!(
            parse_progress_from_line("ytgrab|downloading|1024|NA|4096.7|NA"),
            Some(ProgressEvent::Progressing {
                downloaded_bytes: 1024,
                total_bytes: None,
                total_bytes_estimate: Some(4096),
                speed_bytes_per_sec: None,
            })
        );
        assert_eq!(
            parse_progress_from_line("ytgrab|finished|2048|2048|NA|NA"),
            Some(ProgressEvent::Processing)
        );
        assert_eq!(parse_progress_from_line("[download] Destination: x.webm"), None);
        assert_eq!(parse_progress_from_line("ytgrab|error|NA|NA|NA|NA"), None);
    }

    #[test]
    fn view_reports_percent_and_logs_deciles() {
        let mut view = ProgressView::default();
        assert_eq!(view.apply(&ProgressEvent::Started), None);

        assert_eq!(view.apply(&progressing(512_000, Some(1_048_576))), None);
        assert_eq!(view.label, "48.8% (N/A)");
        assert!((view.fraction.unwrap() - 0.488).abs() < 0.001);

        let line = view.apply(&progressing(524_288, Some(1_048_576)));
        assert_eq!(line.as_deref(), Some("Downloaded 0.5MB of 1.0MB (50.0%)"));
        assert_eq!(view.apply(&progressing(530_000, Some(1_048_576))), None);
    }

    #[test]
    fn view_goes_indeterminate_without_total() {
        let mut view = ProgressView::default();
        view.apply(&ProgressEvent::Progressing {
            downloaded_bytes: 100,
            total_bytes: None,
            total_bytes_estimate: None,
            speed_bytes_per_sec: Some(2.0 * 1024.0 * 1024.0),
        });
        assert_eq!(view.fraction, None);
        assert_eq!(view.label, "Downloading... (2.00 MB/s)");
    }

    #[test]
    fn view_uses_estimate_when_total_missing() {
        let mut view = ProgressView::default();
        view.apply(&ProgressEvent::Progressing {
            downloaded_bytes: 250,
            total_bytes: None,
            total_bytes_estimate: Some(1000),
            speed_bytes_per_sec: None,
        });
        assert_eq!(view.label, "25.0% (N/A)");
    }

    #[test]
    fn processing_and_terminal_labels() {
        let mut view = ProgressView::default();
        assert_eq!(
            view.apply(&ProgressEvent::Processing).as_deref(),
            Some("Download finished, now processing...")
        );
        assert_eq!(view.label, "Processing...");
        view.apply(&ProgressEvent::Finished);
        assert_eq!(view.fraction, Some(1.0));
    }
}
