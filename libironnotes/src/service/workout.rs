//! Workout capture: sessions, exercises and sets
//!
//! Logging a set runs the whole pipeline: parse the notation, number the set
//! within its exercise, evaluate it against every recorded set, then persist
//! the set and any PR flag it took over in one transaction.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::events::{Event, EventBus};
use crate::error::{IronError, Result};
use crate::parser::{parse, ParsedSet};
use crate::pr::{evaluate_and_mark, PrOutcome};
use crate::types::{Exercise, MuscleGroup, Session, SetEntry};
use crate::Database;

/// Workout service
#[derive(Clone)]
pub struct WorkoutService {
    db: Arc<Database>,
    events: EventBus,
}

/// A freshly started session and the exercises copied into it
#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub session: Session,
    pub exercises: Vec<Exercise>,
}

/// Result of logging one set
#[derive(Debug, Clone, Serialize)]
pub struct LoggedSet {
    pub set: SetEntry,
    pub exercise_name: String,
    /// What the notation said, including the set count it carried
    pub parsed: ParsedSet,
    pub outcome: PrOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseWithSets {
    pub exercise: Exercise,
    pub sets: Vec<SetEntry>,
}

/// A session with all of its exercises and sets, in logging order
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub session: Session,
    pub exercises: Vec<ExerciseWithSets>,
}

/// The sets of an exercise from the last session it appeared in
#[derive(Debug, Clone, Serialize)]
pub struct PreviousSession {
    pub session: Session,
    pub sets: Vec<SetEntry>,
}

impl WorkoutService {
    pub fn new(db: Arc<Database>, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Start a new session
    ///
    /// With `clone_last`, the exercises (names and muscle groups, no sets)
    /// of the most recent session are copied into the new one.
    pub async fn start_session(&self, clone_last: bool, notes: String) -> Result<StartedSession> {
        let template = if clone_last {
            match self.db.latest_session().await? {
                Some(previous) => self.db.list_exercises(&previous.id).await?,
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        let session = Session::new(notes);
        self.db.create_session(&session).await?;

        let mut exercises = Vec::with_capacity(template.len());
        for (position, source) in template.into_iter().enumerate() {
            let exercise = Exercise::new(&session.id, source.name, source.muscle_group, position as i64);
            self.db.create_exercise(&exercise).await?;
            exercises.push(exercise);
        }

        info!(session_id = %session.id, cloned = exercises.len(), "Session started");
        self.events.emit(Event::SessionStarted {
            session_id: session.id.clone(),
            cloned_exercises: exercises.len(),
        });

        Ok(StartedSession { session, exercises })
    }

    /// The latest unfinished session
    pub async fn active_session(&self) -> Result<Session> {
        self.db
            .active_session()
            .await?
            .ok_or_else(|| IronError::NotFound("no active session; start one first".to_string()))
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.db
            .get_session(session_id)
            .await?
            .ok_or_else(|| IronError::NotFound(format!("session {}", session_id)))
    }

    pub async fn add_exercise(&self, session_id: &str, name: &str, muscle_group: MuscleGroup) -> Result<Exercise> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IronError::InvalidInput("exercise name cannot be empty".to_string()));
        }

        let session = self.get_session(session_id).await?;
        let position = self.db.next_exercise_position(&session.id).await?;
        let exercise = Exercise::new(&session.id, name.to_string(), muscle_group, position);
        self.db.create_exercise(&exercise).await?;

        debug!(exercise_id = %exercise.id, name, "Exercise added");
        Ok(exercise)
    }

    /// Exercise in a session by name (case-insensitive)
    pub async fn find_exercise(&self, session_id: &str, name: &str) -> Result<Exercise> {
        self.db
            .find_exercise(session_id, name.trim())
            .await?
            .ok_or_else(|| IronError::NotFound(format!("exercise '{}' in this session", name.trim())))
    }

    /// Parse `notation` and record it as the next set of `exercise_id`
    ///
    /// The stored `set_count` is the set's position within the exercise;
    /// the count written in the notation is reported back in `parsed`.
    pub async fn log_set(&self, exercise_id: &str, notation: &str) -> Result<LoggedSet> {
        let parsed = parse(notation)?;

        let exercise = self
            .db
            .get_exercise(exercise_id)
            .await?
            .ok_or_else(|| IronError::NotFound(format!("exercise {}", exercise_id)))?;

        let ordinal = self.db.count_sets(&exercise.id).await? + 1;
        let mut set = SetEntry::new(&exercise.id, parsed.weight, parsed.reps, ordinal, parsed.is_single_arm);

        let mut history = self.db.fetch_all_sets().await?;
        let outcome = evaluate_and_mark(&mut set, &exercise.name, &exercise.session_id, &mut history);

        self.db.record_set(&set, outcome.demoted.as_deref()).await?;

        info!(
            set_id = %set.id,
            exercise = %exercise.name,
            weight = set.weight,
            reps = set.reps,
            is_pr = set.is_pr,
            "Set logged"
        );

        self.events.emit(Event::SetLogged {
            set_id: set.id.clone(),
            exercise_name: exercise.name.clone(),
            weight: set.weight,
            reps: set.reps,
        });
        if set.is_pr {
            self.events.emit(Event::PersonalRecord {
                set_id: set.id.clone(),
                exercise_name: exercise.name.clone(),
                estimated_1rm: set.estimated_1rm(),
            });
        }
        if let Some(previous) = &outcome.demoted {
            self.events.emit(Event::PersonalRecordReplaced {
                previous_set_id: previous.clone(),
                set_id: set.id.clone(),
                exercise_name: exercise.name.clone(),
            });
        }

        Ok(LoggedSet {
            set,
            exercise_name: exercise.name,
            parsed,
            outcome,
        })
    }

    /// Mark a session finished, storing its duration in seconds
    pub async fn finish_session(&self, session_id: &str) -> Result<Session> {
        let mut session = self.get_session(session_id).await?;
        if session.is_completed {
            return Err(IronError::InvalidInput(format!("session {} is already finished", session_id)));
        }

        let duration = (chrono::Utc::now().timestamp() - session.date).max(0);
        self.db.complete_session(&session.id, duration).await?;
        session.duration = duration;
        session.is_completed = true;

        info!(session_id = %session.id, duration_secs = duration, "Session finished");
        self.events.emit(Event::SessionFinished {
            session_id: session.id.clone(),
            duration_secs: duration,
        });

        Ok(session)
    }

    /// Delete a session with its exercises and sets
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        if !self.db.delete_session(session_id).await? {
            return Err(IronError::NotFound(format!("session {}", session_id)));
        }
        info!(session_id, "Session deleted");
        Ok(())
    }

    pub async fn session_detail(&self, session_id: &str) -> Result<SessionDetail> {
        let session = self.get_session(session_id).await?;
        let mut exercises = Vec::new();
        for exercise in self.db.list_exercises(&session.id).await? {
            let sets = self.db.list_sets(&exercise.id).await?;
            exercises.push(ExerciseWithSets { exercise, sets });
        }
        Ok(SessionDetail { session, exercises })
    }

    /// Sets of `exercise_name` from the most recent session other than
    /// `current_session_id` that contains it
    pub async fn previous_session_sets(
        &self,
        exercise_name: &str,
        current_session_id: Option<&str>,
    ) -> Result<Option<PreviousSession>> {
        let records = self.db.fetch_sets_by_exercise_name(exercise_name).await?;

        let Some(session_id) = records
            .iter()
            .rev()
            .map(|record| record.session_id.as_str())
            .find(|id| Some(*id) != current_session_id)
            .map(str::to_string)
        else {
            return Ok(None);
        };

        let Some(session) = self.db.get_session(&session_id).await? else {
            return Ok(None);
        };
        let sets = records
            .into_iter()
            .filter(|record| record.session_id == session_id)
            .map(|record| record.set)
            .collect();

        Ok(Some(PreviousSession { session, sets }))
    }
}
