//! Runs at most one download at a time on the tokio runtime and hands its
//! progress events to the UI thread.
//!
//! Cancellation is soft: [`TaskRunner::request_cancel`] stops the UI from
//! seeing further events and allows a new submission, but it does not abort
//! the worker. A cancelled download may keep running (and even finish) in the
//! background.

use std::{fmt, future::Future};

use tokio::{
    runtime::Handle,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel},
    task::JoinHandle,
};

use crate::error::AppError;
use crate::model::ProgressEvent;

/// Worker side of the progress channel. Sends never block; once the UI has
/// dropped the receiver they fail silently.
pub type ProgressSender = UnboundedSender<ProgressEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The live task: its event stream and its join handle
struct TaskHandle {
    id: TaskId,
    events: UnboundedReceiver<ProgressEvent>,
    _worker: JoinHandle<()>,
}

pub struct TaskRunner {
    runtime: Handle,
    active: Option<TaskHandle>,
    next_id: u64,
}

impl TaskRunner {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            active: None,
            next_id: 1,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Starts `operation` unless a task is already live. The operation gets a
    /// [`ProgressSender`] for intermediate events; `Started` and exactly one
    /// terminal event (`Finished` or `Failed`) are sent by the runner.
    pub fn submit<F, Fut>(&mut self, operation: F) -> Result<TaskId, AppError>
    where
        F: FnOnce(ProgressSender) -> Fut,
        Fut: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        if self.active.is_some() {
            return Err(AppError::AlreadyRunning);
        }

        let id = TaskId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = unbounded_channel();
        let _ = tx.send(ProgressEvent::Started);
        let work = operation(tx.clone());

        let worker = self.runtime.spawn(async move {
            let terminal = match work.await {
                Ok(()) => ProgressEvent::Finished,
                Err(e) => ProgressEvent::Failed {
                    message: e.to_string(),
                },
            };
            let _ = tx.send(terminal);
        });

        log::debug!("task {} started", id);
        self.active = Some(TaskHandle {
            id,
            events: rx,
            _worker: worker,
        });
        Ok(id)
    }

    /// Drains pending events of the live task in emission order. The task is
    /// cleared once its terminal event has been returned.
    pub fn poll(&mut self) -> Vec<ProgressEvent> {
        let mut out = Vec::new();
        let Some(task) = self.active.as_mut() else {
            return out;
        };

        let finished = loop {
            match task.events.try_recv() {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    out.push(event);
                    if terminal {
                        break true;
                    }
                }
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => {
                    // worker dropped every sender without reporting (panic)
                    out.push(ProgressEvent::Failed {
                        message: "download task ended unexpectedly".to_string(),
                    });
                    break true;
                }
            }
        };

        if finished {
            if let Some(task) = self.active.take() {
                log::debug!("task {} done", task.id);
            }
        }
        out
    }

    /// Soft-cancel. Returns false when nothing was running.
    pub fn request_cancel(&mut self) -> bool {
        match self.active.take() {
            Some(task) => {
                log::debug!("task {} detached", task.id);
                true
            }
            None => false,
        }
    }
}
