//! Deferred completion notifications
//!
//! When the rest timer cannot run its own clock (the process is suspended or
//! backgrounded) it hands a single notification to a scheduler that fires at
//! the timer's target end. Delivery is fire-and-forget; a failure to schedule
//! only loses the alert, never the timer state.

use chrono::{DateTime, Utc};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::NotifyError;

/// Identifier used for the rest timer's pending notification
pub const REST_TIMER_NOTIFICATION: &str = "rest-timer";

/// A notification to deliver once, at `fire_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
    /// Whole seconds from scheduling until `fire_at`
    pub delay_secs: u64,
}

/// Host capability for delivering a notification later
///
/// Implementations keep at most one pending notification; scheduling a new
/// one replaces whatever was pending.
pub trait NotificationScheduler: Send {
    fn schedule(&mut self, request: &NotificationRequest) -> Result<(), NotifyError>;

    fn cancel_all(&mut self);
}

/// Scheduler that only records the request in the log
#[derive(Debug, Default)]
pub struct LogScheduler;

impl NotificationScheduler for LogScheduler {
    fn schedule(&mut self, request: &NotificationRequest) -> Result<(), NotifyError> {
        info!(
            id = %request.identifier,
            fire_at = %request.fire_at,
            "Notification '{}' would fire in {}s",
            request.title,
            request.delay_secs
        );
        Ok(())
    }

    fn cancel_all(&mut self) {
        debug!("No pending notifications to cancel");
    }
}

/// Scheduler that runs an external notifier command after the delay
///
/// The wait happens in a detached `sh` child, so the notification still fires
/// while this process is stopped. The title and body are appended as the last
/// two arguments, e.g. `notify-send <title> <body>`.
pub struct CommandScheduler {
    program: String,
    args: Vec<String>,
    pending: Option<Child>,
}

impl CommandScheduler {
    /// Build from a command line such as `"notify-send -u critical"`
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
            pending: None,
        })
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl NotificationScheduler for CommandScheduler {
    fn schedule(&mut self, request: &NotificationRequest) -> Result<(), NotifyError> {
        self.cancel_all();

        let child = Command::new("sh")
            .arg("-c")
            .arg(r#"sleep "$1"; shift; exec "$@""#)
            .arg("ironnotes-notify")
            .arg(request.delay_secs.to_string())
            .arg(&self.program)
            .args(&self.args)
            .arg(&request.title)
            .arg(&request.body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        debug!(pid = child.id(), delay = request.delay_secs, "Spawned notifier");
        self.pending = Some(child);
        Ok(())
    }

    fn cancel_all(&mut self) {
        if let Some(mut child) = self.pending.take() {
            // An already-finished child is fine; it fired or failed on its own.
            if let Err(e) = child.kill() {
                debug!("Notifier already exited: {}", e);
            }
            if let Err(e) = child.wait() {
                warn!("Failed to reap notifier process: {}", e);
            }
        }
    }
}

impl Drop for CommandScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// In-memory scheduler for tests
///
/// Clones share state, so a test can keep a handle while the timer owns the
/// scheduler.
#[derive(Debug, Clone, Default)]
pub struct MockScheduler {
    pub scheduled: Arc<Mutex<Vec<NotificationRequest>>>,
    pub pending: Arc<Mutex<Option<NotificationRequest>>>,
    pub cancel_count: Arc<Mutex<usize>>,
    pub fail: bool,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheduler whose every `schedule` call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn pending(&self) -> Option<NotificationRequest> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn cancel_count(&self) -> usize {
        *self.cancel_count.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl NotificationScheduler for MockScheduler {
    fn schedule(&mut self, request: &NotificationRequest) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Unavailable("mock failure".to_string()));
        }
        self.scheduled
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.clone());
        *self.pending.lock().unwrap_or_else(|p| p.into_inner()) = Some(request.clone());
        Ok(())
    }

    fn cancel_all(&mut self) {
        *self.cancel_count.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        *self.pending.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}
