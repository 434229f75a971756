//! `log` backend that writes to stderr and forwards this crate's records to
//! the Log panel. The UI loop drains the receiver each frame, so worker
//! threads never touch UI state directly.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use time::{OffsetDateTime, macros::format_description};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

pub type LogReceiver = UnboundedReceiver<String>;

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

pub struct UiLogger {
    level: LevelFilter,
    panel: UnboundedSender<String>,
}

impl UiLogger {
    pub fn new(level: LevelFilter) -> (Self, LogReceiver) {
        let (panel, rx) = unbounded_channel();
        (Self { level, panel }, rx)
    }

    /// Installs the logger globally.
    pub fn init(level: LevelFilter) -> Result<LogReceiver, SetLoggerError> {
        let (logger, rx) = Self::new(level);
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
        Ok(rx)
    }
}

fn is_own(target: &str) -> bool {
    target == OWN_TARGET || target.starts_with(&format!("{OWN_TARGET}::"))
}

impl Log for UiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && (is_own(metadata.target()) || metadata.level() <= log::Level::Warn)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record);
        let _ = writeln!(std::io::stderr(), "{}", line);
        if is_own(record.target()) && record.level() <= log::Level::Info {
            let _ = self.panel.send(line);
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// `YYYY-MM-DD HH:MM:SS - LEVEL - message`
fn format_line(record: &Record) -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let stamp = now
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_default();
    format!("{} - {} - {}", stamp, record.level(), record.args())
}
