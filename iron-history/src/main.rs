use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use libironnotes::service::history::{
    format_session_duration, HistoryQuery, ProgressPoint, SessionSummary, TrainingStats,
};
use libironnotes::service::IronNotesService;
use libironnotes::{Config, IronError, Session, SetEntry};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "iron-history")]
#[command(version, about = "Query workout history and training analytics")]
#[command(long_about = r#"Query workout history and training analytics.

EXAMPLES:
    # Recent sessions (default: last 20)
    iron-history sessions
    iron-history sessions --completed --since "2026-01-01"

    # Totals for one session
    iron-history summary <SESSION_ID>

    # Training-wide statistics
    iron-history stats

    # Estimated 1RM progression of an exercise
    iron-history progress "Bench Press"
    iron-history progress "Bench Press" --format csv > bench.csv

    # What you did last time
    iron-history previous "Squat"

    # JSON output for scripting
    iron-history sessions --format json | jq '.[] | select(.is_completed)'
    iron-history stats --format json | jq '.volume_by_muscle_group'

OUTPUT FORMATS:
    text  - Human-readable text (default)
    json  - JSON (complete data structure)
    jsonl - JSON lines, one object per line (streaming-friendly)
    csv   - CSV with headers (spreadsheet-compatible)

EXIT CODES:
    0 - Success (including empty results)
    1 - Error (database not found, query failed, etc.)
    3 - Invalid input (bad date)
    4 - Session not found
"#)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, global = true, default_value = "text", value_name = "FORMAT")]
    #[arg(help = "Output format: text (human-readable), json, jsonl (streaming), or csv (spreadsheet)")]
    #[arg(value_parser = ["text", "json", "jsonl", "csv"])]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List sessions, newest first
    Sessions {
        /// Show sessions since this date (Unix timestamp, YYYY-MM-DD, or ISO 8601)
        #[arg(long, value_name = "DATE")]
        since: Option<String>,

        /// Show sessions until this date (Unix timestamp, YYYY-MM-DD, or ISO 8601)
        #[arg(long, value_name = "DATE")]
        until: Option<String>,

        /// Only finished sessions
        #[arg(long)]
        completed: bool,

        /// Maximum number of sessions to return
        #[arg(short, long, default_value = "20", value_name = "N")]
        limit: usize,
    },

    /// Totals for one session
    Summary { session_id: String },

    /// Statistics across all sessions
    Stats,

    /// Estimated 1RM of every set of an exercise, oldest first
    Progress { exercise: String },

    /// Sets of an exercise from the last session it appeared in
    Previous { exercise: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
    Jsonl,
    Csv,
}

impl Format {
    fn from_arg(format: &str) -> Self {
        match format {
            "json" => Format::Json,
            "jsonl" => Format::Jsonl,
            "csv" => Format::Csv,
            _ => Format::Text,
        }
    }
}

/// Session row as printed by `sessions`
#[derive(Debug, Serialize)]
struct SessionEntry {
    id: String,
    date: i64,
    notes: String,
    duration_secs: i64,
    duration: String,
    is_completed: bool,
}

impl From<Session> for SessionEntry {
    fn from(session: Session) -> Self {
        Self {
            duration: format_session_duration(session.duration),
            id: session.id,
            date: session.date,
            notes: session.notes,
            duration_secs: session.duration,
            is_completed: session.is_completed,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    libironnotes::logging::init_default(args.verbose);
    tracing::debug!("iron-history started with args: {:?}", args);

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        let code = e.downcast_ref::<IronError>().map(IronError::exit_code).unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let db_path = config.database_path();
    if !db_path.exists() {
        eprintln!("Error: Database not found at {}", db_path.display());
        eprintln!("Have you logged anything yet? Try: iron-log start");
        std::process::exit(1);
    }

    let service = IronNotesService::from_config(config)
        .await
        .context("Failed to open database")?;
    let history = service.history();
    let format = Format::from_arg(&args.format);

    match args.command {
        Commands::Sessions {
            since,
            until,
            completed,
            limit,
        } => {
            let query = HistoryQuery {
                since: since.as_deref().map(parse_date).transpose()?,
                until: until.as_deref().map(parse_date).transpose()?,
                completed_only: completed,
                limit: Some(limit),
            };
            let entries: Vec<SessionEntry> = history
                .list_sessions(query)
                .await?
                .into_iter()
                .map(SessionEntry::from)
                .collect();
            print_list(
                &entries,
                format,
                "id,date,duration_secs,is_completed,notes",
                |e| {
                    format!(
                        "{},{},{},{},{}",
                        e.id,
                        e.date,
                        e.duration_secs,
                        e.is_completed,
                        csv_field(&e.notes)
                    )
                },
                session_text,
            )?;
        }
        Commands::Summary { session_id } => {
            let summary = history.summary(&session_id).await?;
            print_single(&summary, format, summary_rows(&summary), || summary_text(&summary))?;
        }
        Commands::Stats => {
            let stats = history.stats().await?;
            print_single(&stats, format, stats_rows(&stats), || stats_text(&stats))?;
        }
        Commands::Progress { exercise } => {
            let points = history.progress(&exercise).await?;
            print_list(
                &points,
                format,
                "timestamp,session_id,weight,reps,estimated_1rm,is_pr",
                |p| {
                    format!(
                        "{},{},{},{},{:.2},{}",
                        p.timestamp, p.session_id, p.weight, p.reps, p.estimated_1rm, p.is_pr
                    )
                },
                progress_text,
            )?;
        }
        Commands::Previous { exercise } => {
            let current = service.database().active_session().await?.map(|s| s.id);
            let previous = service
                .workouts()
                .previous_session_sets(&exercise, current.as_deref())
                .await?;
            let sets: Vec<SetEntry> = previous.map(|p| p.sets).unwrap_or_default();
            print_list(
                &sets,
                format,
                "set_count,weight,reps,is_single_arm,is_pr,timestamp",
                |s| {
                    format!(
                        "{},{},{},{},{},{}",
                        s.set_count, s.weight, s.reps, s.is_single_arm, s.is_pr, s.timestamp
                    )
                },
                set_text,
            )?;
        }
    }

    Ok(())
}

/// Parse date string to a UTC instant
fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = date_str.parse::<i64>() {
        return DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| IronError::InvalidInput(format!("Timestamp out of range: {}", date_str)).into());
    }

    DateTime::parse_from_rfc3339(date_str)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|_| {
            IronError::InvalidInput(format!(
                "Invalid date format: {}. Use Unix timestamp or ISO 8601 (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SSZ)",
                date_str
            ))
            .into()
        })
}

fn print_list<T: Serialize>(
    items: &[T],
    format: Format,
    csv_header: &str,
    csv_row: impl Fn(&T) -> String,
    text: impl Fn(&T) -> String,
) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(items)?),
        Format::Jsonl => {
            for item in items {
                println!("{}", serde_json::to_string(item)?);
            }
        }
        Format::Csv => {
            println!("{}", csv_header);
            for item in items {
                println!("{}", csv_row(item));
            }
        }
        // Empty results print nothing
        Format::Text => {
            for item in items {
                println!("{}", text(item));
            }
        }
    }
    Ok(())
}

fn print_single<T: Serialize>(
    value: &T,
    format: Format,
    rows: Vec<(&'static str, String)>,
    text: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Jsonl => println!("{}", serde_json::to_string(value)?),
        Format::Csv => {
            println!("field,value");
            for (field, value) in rows {
                println!("{},{}", field, csv_field(&value));
            }
        }
        Format::Text => println!("{}", text()),
    }
    Ok(())
}

/// Quote a CSV field when it needs it
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn session_text(entry: &SessionEntry) -> String {
    let status = if entry.is_completed {
        entry.duration.clone()
    } else {
        "in progress".to_string()
    };
    let mut line = format!("{} | {} | {}", format_date(entry.date), entry.id, status);
    if !entry.notes.is_empty() {
        line.push_str(" | ");
        line.push_str(&entry.notes);
    }
    line
}

fn progress_text(point: &ProgressPoint) -> String {
    format!(
        "{} | {} x {} | e1RM {:.1}{}",
        format_date(point.timestamp),
        point.weight,
        point.reps,
        point.estimated_1rm,
        if point.is_pr { "  PR" } else { "" }
    )
}

fn set_text(set: &SetEntry) -> String {
    format!(
        "{}. {} x {}{}{}",
        set.set_count,
        set.weight,
        set.reps,
        if set.is_single_arm { " SA" } else { "" },
        if set.is_pr { "  PR" } else { "" }
    )
}

fn summary_rows(summary: &SessionSummary) -> Vec<(&'static str, String)> {
    let groups: Vec<&str> = summary.muscle_groups.iter().map(|g| g.as_str()).collect();
    vec![
        ("session_id", summary.session.id.clone()),
        ("date", summary.session.date.to_string()),
        ("exercises", summary.exercise_count.to_string()),
        ("sets", summary.total_sets.to_string()),
        ("volume", summary.total_volume.to_string()),
        ("muscle_groups", groups.join(";")),
        ("prs", summary.pr_count.to_string()),
        ("duration", summary.duration.clone()),
    ]
}

fn summary_text(summary: &SessionSummary) -> String {
    let groups: Vec<&str> = summary.muscle_groups.iter().map(|g| g.as_str()).collect();
    format!(
        "{} | {}\n  Exercises: {}\n  Sets: {}\n  Volume: {}\n  Muscle groups: {}\n  PRs: {}\n  Duration: {}",
        format_date(summary.session.date),
        summary.session.id,
        summary.exercise_count,
        summary.total_sets,
        summary.total_volume,
        if groups.is_empty() { "-".to_string() } else { groups.join(", ") },
        summary.pr_count,
        summary.duration
    )
}

fn stats_rows(stats: &TrainingStats) -> Vec<(&'static str, String)> {
    vec![
        ("completed_workouts", stats.completed_workouts.to_string()),
        ("total_volume", stats.total_volume.to_string()),
        ("total_prs", stats.total_prs.to_string()),
        (
            "average_duration_secs",
            stats.average_duration_secs.map(|d| d.to_string()).unwrap_or_default(),
        ),
        ("unique_exercises", stats.unique_exercises.len().to_string()),
    ]
}

fn stats_text(stats: &TrainingStats) -> String {
    let mut out = format!(
        "Workouts completed: {}\nTotal volume: {}\nPersonal records: {}\nAverage duration: {}",
        stats.completed_workouts,
        stats.total_volume,
        stats.total_prs,
        stats
            .average_duration_secs
            .map(format_session_duration)
            .unwrap_or_else(|| "-".to_string())
    );

    if !stats.volume_by_muscle_group.is_empty() {
        out.push_str("\n\nVolume by muscle group:");
        for entry in &stats.volume_by_muscle_group {
            out.push_str(&format!("\n  {:<10} {}", entry.muscle_group.as_str(), entry.volume));
        }
    }
    if !stats.unique_exercises.is_empty() {
        out.push_str("\n\nExercises:");
        for name in &stats.unique_exercises {
            out.push_str(&format!("\n  {}", name));
        }
    }
    if !stats.best_lifts.is_empty() {
        out.push_str("\n\nBest estimated 1RM:");
        for best in &stats.best_lifts {
            out.push_str(&format!("\n  {:<20} {:.1}", best.exercise_name, best.estimated_1rm));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("0").unwrap().timestamp(), 0);
        assert_eq!(parse_date("2026-01-02").unwrap().timestamp(), 1_767_312_000);
        assert_eq!(
            parse_date("2026-01-02T03:00:00Z").unwrap().timestamp(),
            1_767_312_000 + 3 * 3600
        );
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
