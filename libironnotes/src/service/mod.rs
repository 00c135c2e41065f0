//! Service layer for IronNotes
//!
//! This module provides the workout-logging API the command-line tools are
//! built on, so parsing, PR bookkeeping and persistence live in one place.
//!
//! # Architecture
//!
//! `IronNotesService` is the facade. It owns the shared resources and hands
//! out the specialized sub-services:
//!
//! - `WorkoutService`: sessions, exercises and set capture with PR marking
//! - `HistoryService`: summaries and analytics over recorded sessions
//! - `EventBus`: activity events for whoever is listening
//!
//! # Example
//!
//! ```no_run
//! use libironnotes::service::IronNotesService;
//! use libironnotes::MuscleGroup;
//!
//! # async fn example() -> libironnotes::Result<()> {
//! let service = IronNotesService::new().await?;
//!
//! let session = service.workouts().start_session(false, String::new()).await?;
//! let bench = service
//!     .workouts()
//!     .add_exercise(&session.session.id, "Bench Press", MuscleGroup::Chest)
//!     .await?;
//! let logged = service.workouts().log_set(&bench.id, "100kg x 5").await?;
//! println!("PR: {}", logged.set.is_pr);
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod history;
pub mod workout;

use self::events::{EventBus, EventReceiver};
use self::history::HistoryService;
use self::workout::WorkoutService;
use crate::clock::SystemClock;
use crate::error::{ConfigError, IronError};
use crate::notify::{CommandScheduler, LogScheduler, NotificationScheduler};
use crate::timer::RestTimer;
use crate::{Config, Database, Result};
use std::sync::Arc;

/// Main service facade that coordinates all sub-services
///
/// All sub-services share the same `Arc<Database>` and `Arc<Config>`.
pub struct IronNotesService {
    db: Arc<Database>,
    config: Arc<Config>,
    workouts: WorkoutService,
    history: HistoryService,
    event_bus: EventBus,
}

impl IronNotesService {
    /// Create a service from the configuration at the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the
    /// database cannot be opened and migrated.
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Create a service with an explicit configuration
    pub async fn from_config(config: Config) -> Result<Self> {
        let db_path = config.database_path();
        let db_path_str = db_path.to_str().ok_or_else(|| {
            IronError::Config(ConfigError::InvalidValue {
                field: "database.path".to_string(),
                reason: "path is not valid UTF-8".to_string(),
            })
        })?;
        let db = Database::new(db_path_str).await?;

        let db = Arc::new(db);
        let config = Arc::new(config);
        let event_bus = EventBus::new(100);

        let workouts = WorkoutService::new(Arc::clone(&db), event_bus.clone());
        let history = HistoryService::new(Arc::clone(&db));

        Ok(Self {
            db,
            config,
            workouts,
            history,
            event_bus,
        })
    }

    /// Access the database directly
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Session, exercise and set capture
    pub fn workouts(&self) -> &WorkoutService {
        &self.workouts
    }

    /// Summaries and analytics
    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    /// Subscribe to service events
    ///
    /// Multiple subscribers are supported; each sees events emitted after
    /// it subscribed.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    /// Rest timer on the system clock, wired to this service's event bus
    /// and configured notification text
    pub fn rest_timer(&self, scheduler: Box<dyn NotificationScheduler>) -> RestTimer<SystemClock> {
        RestTimer::new(SystemClock, scheduler)
            .with_events(self.event_bus.clone())
            .with_message(
                self.config.timer.notification_title.clone(),
                self.config.timer.notification_body.clone(),
            )
    }
}

/// Notification scheduler for the configured `timer.notify_command`
///
/// Falls back to logging when no command is configured.
pub fn scheduler_from_config(config: &Config) -> Box<dyn NotificationScheduler> {
    match config
        .timer
        .notify_command
        .as_deref()
        .and_then(CommandScheduler::from_command_line)
    {
        Some(scheduler) => Box::new(scheduler),
        None => Box::new(LogScheduler),
    }
}
