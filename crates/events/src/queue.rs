//! Fire-and-forget task dispatch.

use tokio::sync::mpsc;
use widgetry_core::notification::EmailMessage;
use widgetry_core::types::PublicId;

/// Owner of the spreadsheet a row is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetTarget {
    FormWidget(PublicId),
    AppointmentWidget(PublicId),
}

/// A side effect to perform outside the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    SendEmail(EmailMessage),
    /// Append `values` to the target's spreadsheet. `header` becomes the
    /// first row when the spreadsheet has to be created.
    AppendToSheet {
        target: SheetTarget,
        values: Vec<String>,
        header: Vec<String>,
    },
}

impl Task {
    fn kind(&self) -> &'static str {
        match self {
            Self::SendEmail(_) => "send_email",
            Self::AppendToSheet { .. } => "append_to_sheet",
        }
    }
}

/// Sending half of the task channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<Task>,
}

impl TaskQueue {
    /// Create a queue buffering at most `capacity` tasks, with the
    /// receiver the [`TaskRunner`](crate::TaskRunner) consumes.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Task>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue without waiting. A full or closed queue drops the task with
    /// an error log; the caller never sees the failure.
    pub fn dispatch(&self, task: Task) {
        let kind = task.kind();
        match self.sender.try_send(task) {
            Ok(()) => tracing::debug!(task = kind, "Task queued"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::error!(task = kind, "Task queue full, dropping task");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::error!(task = kind, "Task queue closed, dropping task");
            }
        }
    }
}
