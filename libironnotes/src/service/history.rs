//! History service for querying past sessions
//!
//! Summaries and analytics are computed in memory from the recorded sets;
//! the arithmetic lives in plain functions so it can be tested without a
//! database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::workout::{ExerciseWithSets, SessionDetail};
use crate::error::{IronError, Result};
use crate::pr;
use crate::types::{Exercise, MuscleGroup, Session, SetEntry, SetRecord};
use crate::Database;

/// History service
pub struct HistoryService {
    db: Arc<Database>,
}

/// Query parameters for filtering sessions
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub completed_only: bool,
    pub limit: Option<usize>,
}

/// Totals for one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session: Session,
    pub exercise_count: usize,
    pub total_sets: usize,
    /// Sum of weight x reps over every set
    pub total_volume: f64,
    /// Distinct groups in the order their exercises were added
    pub muscle_groups: Vec<MuscleGroup>,
    pub pr_count: usize,
    /// Human-readable duration, e.g. "1h 5m"
    pub duration: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MuscleGroupVolume {
    pub muscle_group: MuscleGroup,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseBest {
    pub exercise_name: String,
    pub estimated_1rm: f64,
}

/// Statistics across all recorded training
#[derive(Debug, Clone, Serialize)]
pub struct TrainingStats {
    pub completed_workouts: usize,
    pub total_volume: f64,
    pub total_prs: usize,
    /// Mean duration of completed sessions, in seconds
    pub average_duration_secs: Option<i64>,
    /// Highest volume first
    pub volume_by_muscle_group: Vec<MuscleGroupVolume>,
    pub unique_exercises: Vec<String>,
    /// Direction-aware best per exercise, in name order; exercises without sets are left out
    pub best_lifts: Vec<ExerciseBest>,
}

/// One set on an exercise's estimated 1RM progression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub timestamp: i64,
    pub session_id: String,
    pub weight: f64,
    pub reps: u32,
    pub estimated_1rm: f64,
    /// Whether the set still holds a PR flag
    pub is_pr: bool,
}

impl HistoryService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Sessions newest first, filtered by `query`
    pub async fn list_sessions(&self, query: HistoryQuery) -> Result<Vec<Session>> {
        let sessions = self.db.list_sessions(None).await?;
        Ok(filter_sessions(sessions, &query))
    }

    pub async fn summary(&self, session_id: &str) -> Result<SessionSummary> {
        let session = self
            .db
            .get_session(session_id)
            .await?
            .ok_or_else(|| IronError::NotFound(format!("session {}", session_id)))?;

        let mut exercises = Vec::new();
        for exercise in self.db.list_exercises(&session.id).await? {
            let sets = self.db.list_sets(&exercise.id).await?;
            exercises.push(ExerciseWithSets { exercise, sets });
        }

        Ok(summarize(&SessionDetail { session, exercises }))
    }

    pub async fn stats(&self) -> Result<TrainingStats> {
        let sessions = self.db.list_sessions(None).await?;
        let exercises = self.db.list_all_exercises().await?;
        let records = self.db.fetch_all_sets().await?;
        Ok(compute_stats(&sessions, &exercises, &records))
    }

    /// Every set of `exercise_name`, oldest first
    pub async fn progress(&self, exercise_name: &str) -> Result<Vec<ProgressPoint>> {
        let records = self.db.fetch_sets_by_exercise_name(exercise_name).await?;
        Ok(progression(&records))
    }

    /// Best estimated 1RM ever recorded for an exercise, direction-aware
    pub async fn best_estimated_1rm(&self, exercise_name: &str) -> Result<Option<f64>> {
        let records = self.db.fetch_sets_by_exercise_name(exercise_name).await?;
        Ok(pr::best_estimated_1rm(exercise_name, records.iter()))
    }

    /// Every exercise name ever used, sorted
    pub async fn unique_exercises(&self) -> Result<Vec<String>> {
        let exercises = self.db.list_all_exercises().await?;
        Ok(unique_names(&exercises))
    }
}

fn filter_sessions(sessions: Vec<Session>, query: &HistoryQuery) -> Vec<Session> {
    let since = query.since.map(|t| t.timestamp());
    let until = query.until.map(|t| t.timestamp());

    let filtered = sessions
        .into_iter()
        .filter(|s| !query.completed_only || s.is_completed)
        .filter(|s| since.map_or(true, |since| s.date >= since))
        .filter(|s| until.map_or(true, |until| s.date <= until));

    match query.limit {
        Some(limit) => filtered.take(limit).collect(),
        None => filtered.collect(),
    }
}

/// Totals for a session and its sets
pub fn summarize(detail: &SessionDetail) -> SessionSummary {
    let sets: Vec<&SetEntry> = detail.exercises.iter().flat_map(|e| e.sets.iter()).collect();

    let mut muscle_groups = Vec::new();
    for entry in &detail.exercises {
        if !muscle_groups.contains(&entry.exercise.muscle_group) {
            muscle_groups.push(entry.exercise.muscle_group);
        }
    }

    SessionSummary {
        session: detail.session.clone(),
        exercise_count: detail.exercises.len(),
        total_sets: sets.len(),
        total_volume: sets.iter().map(|s| s.volume()).sum(),
        muscle_groups,
        pr_count: sets.iter().filter(|s| s.is_pr).count(),
        duration: format_session_duration(detail.session.duration),
    }
}

pub fn compute_stats(sessions: &[Session], exercises: &[Exercise], records: &[SetRecord]) -> TrainingStats {
    let completed: Vec<&Session> = sessions.iter().filter(|s| s.is_completed).collect();
    let average_duration_secs = if completed.is_empty() {
        None
    } else {
        Some(completed.iter().map(|s| s.duration).sum::<i64>() / completed.len() as i64)
    };

    let groups: HashMap<&str, MuscleGroup> =
        exercises.iter().map(|e| (e.id.as_str(), e.muscle_group)).collect();
    let mut by_group: HashMap<MuscleGroup, f64> = HashMap::new();
    for record in records {
        if let Some(group) = groups.get(record.set.exercise_id.as_str()) {
            *by_group.entry(*group).or_insert(0.0) += record.set.volume();
        }
    }

    let unique_exercises = unique_names(exercises);
    let best_lifts = unique_exercises
        .iter()
        .filter_map(|name| {
            pr::best_estimated_1rm(name, records).map(|estimated_1rm| ExerciseBest {
                exercise_name: name.clone(),
                estimated_1rm,
            })
        })
        .collect();

    TrainingStats {
        completed_workouts: completed.len(),
        total_volume: records.iter().map(|r| r.set.volume()).sum(),
        total_prs: records.iter().filter(|r| r.set.is_pr).count(),
        average_duration_secs,
        volume_by_muscle_group: sort_volumes(by_group),
        unique_exercises,
        best_lifts,
    }
}

fn sort_volumes(by_group: HashMap<MuscleGroup, f64>) -> Vec<MuscleGroupVolume> {
    let mut volumes: Vec<MuscleGroupVolume> = by_group
        .into_iter()
        .map(|(muscle_group, volume)| MuscleGroupVolume { muscle_group, volume })
        .collect();
    // Ties fall back to the enum order so output is stable
    volumes.sort_by(|a, b| {
        b.volume
            .total_cmp(&a.volume)
            .then_with(|| group_rank(a.muscle_group).cmp(&group_rank(b.muscle_group)))
    });
    volumes
}

fn group_rank(group: MuscleGroup) -> usize {
    MuscleGroup::ALL.iter().position(|g| *g == group).unwrap_or(usize::MAX)
}

fn unique_names(exercises: &[Exercise]) -> Vec<String> {
    let mut names: Vec<String> = exercises.iter().map(|e| e.name.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// One point per set, ordered by timestamp; equal timestamps keep logging order
pub fn progression(records: &[SetRecord]) -> Vec<ProgressPoint> {
    let mut points: Vec<ProgressPoint> = records
        .iter()
        .map(|r| ProgressPoint {
            timestamp: r.set.timestamp,
            session_id: r.session_id.clone(),
            weight: r.set.weight,
            reps: r.set.reps,
            estimated_1rm: r.set.estimated_1rm(),
            is_pr: r.set.is_pr,
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

/// Session length for display: "<1m", "45m", "1h", "1h 5m"
pub fn format_session_duration(secs: i64) -> String {
    if secs < 60 {
        return "<1m".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}
