//! Database operations for IronNotes

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DbError, Result};
use crate::types::{Exercise, MuscleGroup, Session, SetEntry, SetRecord};

const SESSION_COLUMNS: &str = "id, date, notes, duration, is_completed";
const EXERCISE_COLUMNS: &str = "id, session_id, name, muscle_group, position";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // Forward slashes keep the URL valid on Windows too
        let db_url = format!("sqlite://{}", expanded_path.replace('\\', "/"));
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(DbError::SqlxError)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub async fn create_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, date, notes, duration, is_completed)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(session.date)
        .bind(&session.notes)
        .bind(session.duration)
        .bind(session.is_completed)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(&format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS))
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(session_from_row))
    }

    /// Sessions newest first
    pub async fn list_sessions(&self, limit: Option<usize>) -> Result<Vec<Session>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM sessions ORDER BY date DESC, rowid DESC LIMIT ?",
            SESSION_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    /// Most recent session, finished or not
    pub async fn latest_session(&self) -> Result<Option<Session>> {
        Ok(self.list_sessions(Some(1)).await?.into_iter().next())
    }

    /// Most recent unfinished session
    pub async fn active_session(&self) -> Result<Option<Session>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM sessions WHERE is_completed = 0 ORDER BY date DESC, rowid DESC LIMIT 1",
            SESSION_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(session_from_row))
    }

    /// Mark a session finished; returns false if it does not exist
    pub async fn complete_session(&self, session_id: &str, duration: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE sessions SET is_completed = 1, duration = ? WHERE id = ?")
            .bind(duration)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a session with its exercises and sets
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Exercises
    // ------------------------------------------------------------------

    pub async fn create_exercise(&self, exercise: &Exercise) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exercises (id, session_id, name, muscle_group, position)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&exercise.id)
        .bind(&exercise.session_id)
        .bind(&exercise.name)
        .bind(exercise.muscle_group.as_str())
        .bind(exercise.position)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_exercise(&self, exercise_id: &str) -> Result<Option<Exercise>> {
        let row = sqlx::query(&format!("SELECT {} FROM exercises WHERE id = ?", EXERCISE_COLUMNS))
            .bind(exercise_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        row.as_ref().map(exercise_from_row).transpose()
    }

    /// Exercise in a session by name, ignoring case
    pub async fn find_exercise(&self, session_id: &str, name: &str) -> Result<Option<Exercise>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM exercises WHERE session_id = ? AND name = ? COLLATE NOCASE ORDER BY position LIMIT 1",
            EXERCISE_COLUMNS
        ))
        .bind(session_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.as_ref().map(exercise_from_row).transpose()
    }

    /// Exercises of a session in insertion order
    pub async fn list_exercises(&self, session_id: &str) -> Result<Vec<Exercise>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM exercises WHERE session_id = ? ORDER BY position",
            EXERCISE_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(exercise_from_row).collect()
    }

    /// Every exercise across all sessions
    pub async fn list_all_exercises(&self) -> Result<Vec<Exercise>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM exercises ORDER BY session_id, position",
            EXERCISE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(exercise_from_row).collect()
    }

    /// Position the next exercise added to a session should take
    pub async fn next_exercise_position(&self, session_id: &str) -> Result<i64> {
        let position: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM exercises WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await
                .map_err(DbError::SqlxError)?;

        Ok(position)
    }

    // ------------------------------------------------------------------
    // Sets
    // ------------------------------------------------------------------

    pub async fn count_sets(&self, exercise_id: &str) -> Result<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sets WHERE exercise_id = ?")
            .bind(exercise_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(count as u32)
    }

    /// Sets of one exercise in the order they were logged
    pub async fn list_sets(&self, exercise_id: &str) -> Result<Vec<SetEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, exercise_id, weight, reps, set_count, is_single_arm, timestamp, is_pr
            FROM sets WHERE exercise_id = ?
            ORDER BY timestamp, rowid
            "#,
        )
        .bind(exercise_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(set_from_row).collect()
    }

    /// Every set ever logged, oldest first, with exercise name and session
    pub async fn fetch_all_sets(&self) -> Result<Vec<SetRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.exercise_id, s.weight, s.reps, s.set_count, s.is_single_arm,
                   s.timestamp, s.is_pr, e.name AS exercise_name, e.session_id
            FROM sets s
            INNER JOIN exercises e ON e.id = s.exercise_id
            ORDER BY s.timestamp, s.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(record_from_row).collect()
    }

    /// All sets of one exercise name across sessions, oldest first
    pub async fn fetch_sets_by_exercise_name(&self, name: &str) -> Result<Vec<SetRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.exercise_id, s.weight, s.reps, s.set_count, s.is_single_arm,
                   s.timestamp, s.is_pr, e.name AS exercise_name, e.session_id
            FROM sets s
            INNER JOIN exercises e ON e.id = s.exercise_id
            WHERE e.name = ?
            ORDER BY s.timestamp, s.rowid
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(record_from_row).collect()
    }

    /// Insert a new set and clear the flag of the set it displaced, atomically
    pub async fn record_set(&self, set: &SetEntry, demoted: Option<&str>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        if let Some(previous) = demoted {
            sqlx::query("UPDATE sets SET is_pr = 0 WHERE id = ?")
                .bind(previous)
                .execute(&mut *tx)
                .await
                .map_err(DbError::SqlxError)?;
        }

        sqlx::query(
            r#"
            INSERT INTO sets (id, exercise_id, weight, reps, set_count, is_single_arm, timestamp, is_pr)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&set.id)
        .bind(&set.exercise_id)
        .bind(set.weight)
        .bind(set.reps as i64)
        .bind(set.set_count as i64)
        .bind(set.is_single_arm)
        .bind(set.timestamp)
        .bind(set.is_pr)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }
}

fn session_from_row(row: &SqliteRow) -> Session {
    Session {
        id: row.get("id"),
        date: row.get("date"),
        notes: row.get("notes"),
        duration: row.get("duration"),
        is_completed: row.get("is_completed"),
    }
}

fn exercise_from_row(row: &SqliteRow) -> Result<Exercise> {
    let group: String = row.get("muscle_group");
    let muscle_group = MuscleGroup::from_str(&group).map_err(|reason| DbError::CorruptRow {
        table: "exercises",
        reason,
    })?;

    Ok(Exercise {
        id: row.get("id"),
        session_id: row.get("session_id"),
        name: row.get("name"),
        muscle_group,
        position: row.get("position"),
    })
}

fn set_from_row(row: &SqliteRow) -> Result<SetEntry> {
    let count = |column: &str| -> Result<u32> {
        let value: i64 = row.get(column);
        u32::try_from(value).map_err(|_| {
            DbError::CorruptRow {
                table: "sets",
                reason: format!("{} out of range: {}", column, value),
            }
            .into()
        })
    };

    Ok(SetEntry {
        id: row.get("id"),
        exercise_id: row.get("exercise_id"),
        weight: row.get("weight"),
        reps: count("reps")?,
        set_count: count("set_count")?,
        is_single_arm: row.get("is_single_arm"),
        timestamp: row.get("timestamp"),
        is_pr: row.get("is_pr"),
    })
}

fn record_from_row(row: &SqliteRow) -> Result<SetRecord> {
    Ok(SetRecord {
        set: set_from_row(row)?,
        exercise_name: row.get("exercise_name"),
        session_id: row.get("session_id"),
    })
}
