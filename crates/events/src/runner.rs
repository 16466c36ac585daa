//! Background consumer of the task queue.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::delivery::email::EmailDelivery;
use crate::error::TaskError;
use crate::queue::Task;
use crate::sheets::SheetWriter;

/// Executes queued tasks one at a time, each exactly once.
pub struct TaskRunner {
    receiver: mpsc::Receiver<Task>,
    email: Option<EmailDelivery>,
    sheets: SheetWriter,
}

impl TaskRunner {
    /// `email` is `None` when SMTP is not configured; messages are then
    /// logged and dropped.
    pub fn new(receiver: mpsc::Receiver<Task>, email: Option<EmailDelivery>, sheets: SheetWriter) -> Self {
        Self {
            receiver,
            email,
            sheets,
        }
    }

    /// Run until `cancel` fires or every [`TaskQueue`](crate::TaskQueue)
    /// handle is dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Task runner started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Task runner stopping");
                    break;
                }
                task = self.receiver.recv() => {
                    let Some(task) = task else {
                        tracing::info!("Task queue closed, task runner shutting down");
                        break;
                    };
                    if let Err(e) = self.execute(task).await {
                        tracing::error!(error = %e, "Background task failed");
                    }
                }
            }
        }
    }

    async fn execute(&self, task: Task) -> Result<(), TaskError> {
        match task {
            Task::SendEmail(message) => match &self.email {
                Some(email) => email.deliver(&message).await?,
                None => tracing::info!(
                    subject = %message.subject,
                    recipients = ?message.to,
                    "SMTP not configured, email dropped"
                ),
            },
            Task::AppendToSheet {
                target,
                values,
                header,
            } => self.sheets.append(target, values, header).await?,
        }
        Ok(())
    }
}
