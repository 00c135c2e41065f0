//! Rest timer
//!
//! A countdown between sets that stays correct across pause/resume and
//! process suspension. Remaining time is always derived as
//! `target_end - now`; the periodic refresh only updates what is displayed
//! and never accumulates ticks, so missed or late refreshes cannot skew it.
//!
//! While the timer runs in a context that cannot keep its own clock
//! (backgrounded, suspended), a single deferred notification is scheduled for
//! the target end. On return to the foreground the notification is cancelled
//! and the state is recomputed from the wall clock.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::notify::{NotificationRequest, NotificationScheduler, REST_TIMER_NOTIFICATION};
use crate::service::events::{Event, EventBus};

/// Lower bound for remaining time after an add/subtract adjustment
pub const MIN_ADJUSTED_SECS: i64 = 10;
/// Upper bound for remaining time after an add/subtract adjustment
pub const MAX_ADJUSTED_SECS: i64 = 600;
/// Step used by the +/- controls
pub const ADJUST_STEP_SECS: u32 = 10;

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Rest Timer Complete";
pub const DEFAULT_NOTIFICATION_BODY: &str = "Time to get back to your workout!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

/// Countdown controller for rest intervals
pub struct RestTimer<C: Clock = SystemClock> {
    clock: C,
    scheduler: Box<dyn NotificationScheduler>,
    events: Option<EventBus>,
    title: String,
    body: String,
    state: TimerState,
    /// Authoritative only while not running; a snapshot otherwise
    remaining: Duration,
    total: Duration,
    target_end: Option<DateTime<Utc>>,
    notification_pending: bool,
}

impl<C: Clock> RestTimer<C> {
    pub fn new(clock: C, scheduler: Box<dyn NotificationScheduler>) -> Self {
        Self {
            clock,
            scheduler,
            events: None,
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            body: DEFAULT_NOTIFICATION_BODY.to_string(),
            state: TimerState::Idle,
            remaining: Duration::zero(),
            total: Duration::zero(),
            target_end: None,
            notification_pending: false,
        }
    }

    /// Emit timer events on `events`
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Text of the deferred "rest complete" notification
    pub fn with_message(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.title = title.into();
        self.body = body.into();
        self
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Start (or restart) a countdown of `duration_secs`
    pub fn start(&mut self, duration_secs: u32) {
        self.cancel_notification();

        let now = self.clock.now();
        let duration = Duration::seconds(duration_secs as i64);
        self.remaining = duration;
        self.total = duration;
        self.target_end = Some(now + duration);
        self.state = TimerState::Running;

        info!(duration_secs, "Rest timer started");
        self.emit(Event::TimerStarted { duration_secs });
    }

    pub fn pause(&mut self) {
        if self.refresh() != TimerState::Running {
            return;
        }
        self.cancel_notification();

        self.target_end = None;
        self.state = TimerState::Paused;

        debug!(remaining_ms = self.remaining.num_milliseconds(), "Rest timer paused");
        self.emit(Event::TimerPaused {
            remaining_secs: self.remaining_secs(),
        });
    }

    /// Continue a paused countdown; no-op when nothing remains
    pub fn resume(&mut self) {
        if self.state == TimerState::Running || self.remaining <= Duration::zero() {
            return;
        }

        let now = self.clock.now();
        self.target_end = Some(now + self.remaining);
        self.state = TimerState::Running;

        debug!(remaining_ms = self.remaining.num_milliseconds(), "Rest timer resumed");
        self.emit(Event::TimerResumed {
            remaining_secs: self.remaining_secs(),
        });
    }

    /// Pause when running, otherwise resume
    pub fn toggle(&mut self) {
        if self.refresh() == TimerState::Running {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Hard reset to idle
    pub fn stop(&mut self) {
        self.cancel_notification();

        self.state = TimerState::Idle;
        self.remaining = Duration::zero();
        self.target_end = None;

        debug!("Rest timer stopped");
        self.emit(Event::TimerStopped);
    }

    pub fn add_time(&mut self, seconds: u32) {
        self.adjust(seconds as i64);
    }

    pub fn subtract_time(&mut self, seconds: u32) {
        self.adjust(-(seconds as i64));
    }

    /// Shift remaining time, clamped to the adjustment range
    ///
    /// A running timer gets a fresh target end from the new remaining value.
    /// An idle or expired timer becomes paused so it can be resumed.
    fn adjust(&mut self, delta_secs: i64) {
        let state = self.refresh();

        let min = Duration::seconds(MIN_ADJUSTED_SECS);
        let max = Duration::seconds(MAX_ADJUSTED_SECS);
        let adjusted = (self.remaining + Duration::seconds(delta_secs)).clamp(min, max);

        self.remaining = adjusted;
        if adjusted > self.total {
            self.total = adjusted;
        }

        match state {
            TimerState::Running => {
                let now = self.clock.now();
                self.target_end = Some(now + adjusted);
                if self.notification_pending {
                    self.schedule_notification(now);
                }
            }
            TimerState::Idle | TimerState::Expired => {
                self.state = TimerState::Paused;
            }
            TimerState::Paused => {}
        }

        debug!(delta_secs, remaining_ms = adjusted.num_milliseconds(), "Rest timer adjusted");
        self.emit(Event::TimerAdjusted {
            remaining_secs: self.remaining_secs(),
            total_secs: self.total_secs(),
        });
    }

    /// The execution context is about to lose its clock
    ///
    /// Schedules the single deferred completion notification when running.
    pub fn enter_background(&mut self) {
        if self.refresh() != TimerState::Running {
            return;
        }
        let now = self.clock.now();
        self.schedule_notification(now);
    }

    /// The execution context has its clock back
    ///
    /// Cancels the deferred notification and re-derives the remaining time
    /// from the stored target end, expiring immediately if it has passed.
    pub fn enter_foreground(&mut self) -> TimerState {
        self.cancel_notification();
        self.refresh()
    }

    /// Recompute remaining time from the wall clock
    ///
    /// Called by the periodic display refresh and by every operation. The
    /// transition to `Expired` and its completion event happen here, once.
    pub fn refresh(&mut self) -> TimerState {
        if self.state != TimerState::Running {
            return self.state;
        }
        let Some(target_end) = self.target_end else {
            return self.state;
        };

        let left = target_end - self.clock.now();
        if left > Duration::zero() {
            self.remaining = left;
            return self.state;
        }

        self.remaining = Duration::zero();
        self.target_end = None;
        self.state = TimerState::Expired;
        self.cancel_notification();

        info!(total_secs = self.total_secs(), "Rest timer complete");
        self.emit(Event::TimerExpired {
            total_secs: self.total_secs(),
        });
        self.state
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Current state, derived from the target end without mutating
    pub fn state(&self) -> TimerState {
        match (self.state, self.target_end) {
            (TimerState::Running, Some(end)) if end <= self.clock.now() => TimerState::Expired,
            (state, _) => state,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == TimerState::Running
    }

    pub fn remaining(&self) -> Duration {
        match (self.state, self.target_end) {
            (TimerState::Running, Some(end)) => (end - self.clock.now()).max(Duration::zero()),
            _ => self.remaining,
        }
    }

    /// Remaining whole seconds, rounded up so "00:00" only shows at expiry
    pub fn remaining_secs(&self) -> u32 {
        let millis = self.remaining().num_milliseconds().max(0);
        ((millis + 999) / 1000) as u32
    }

    pub fn total_secs(&self) -> u32 {
        self.total.num_seconds().max(0) as u32
    }

    pub fn target_end(&self) -> Option<DateTime<Utc>> {
        match self.state() {
            TimerState::Running => self.target_end,
            _ => None,
        }
    }

    pub fn has_pending_notification(&self) -> bool {
        self.notification_pending
    }

    /// Fraction of the total still remaining, for a progress ring
    pub fn progress(&self) -> f64 {
        let total = self.total.num_milliseconds();
        if total <= 0 {
            return 0.0;
        }
        self.remaining().num_milliseconds() as f64 / total as f64
    }

    /// Remaining time as `MM:SS`
    pub fn time_string(&self) -> String {
        format_clock(self.remaining_secs())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn schedule_notification(&mut self, now: DateTime<Utc>) {
        let Some(fire_at) = self.target_end else {
            return;
        };
        self.cancel_notification();

        let millis = (fire_at - now).num_milliseconds().max(0);
        let request = NotificationRequest {
            identifier: REST_TIMER_NOTIFICATION.to_string(),
            title: self.title.clone(),
            body: self.body.clone(),
            fire_at,
            delay_secs: ((millis + 999) / 1000) as u64,
        };

        match self.scheduler.schedule(&request) {
            Ok(()) => {
                self.notification_pending = true;
                debug!(fire_at = %fire_at, "Scheduled rest timer notification");
            }
            Err(e) => {
                warn!("Failed to schedule rest timer notification: {}", e);
            }
        }
    }

    fn cancel_notification(&mut self) {
        if !self.notification_pending {
            return;
        }
        self.scheduler.cancel_all();
        self.notification_pending = false;
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

/// Format seconds as `MM:SS`
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
