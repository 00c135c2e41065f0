//! iron-log - Capture workouts from the command line
//!
//! Unix-style tool for starting sessions, adding exercises and logging sets
//! in shorthand notation.

use std::io::{BufRead, Write};

use clap::{Parser, Subcommand};
use libironnotes::service::history::format_session_duration;
use libironnotes::service::workout::{LoggedSet, SessionDetail, StartedSession};
use libironnotes::service::IronNotesService;
use libironnotes::{parse, Config, IronError, MuscleGroup, ParsedSet, Result, Session, WeightUnit};
use serde::Serialize;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "iron-log")]
#[command(version)]
#[command(about = "Log workout sessions, exercises and sets")]
#[command(long_about = "\
iron-log - Log workout sessions, exercises and sets

DESCRIPTION:
    iron-log records strength training into the local IronNotes database.
    Sets are typed in shorthand; each one is checked against every set you
    have ever logged for the exercise and flagged when it is a personal record.

COMMANDS:
    start     Start a new session
    exercise  Add an exercise to the active session
    set       Log a set against an exercise of the active session
    show      Show a session with its exercises and sets
    finish    Finish the active session
    delete    Delete a session and everything in it
    parse     Check how a set notation is understood

SET NOTATION:
    100x10          100 weight, 10 reps
    100kg x 10 x 3  multiplier form with a set count
    225lbs 8r 3s    tagged tokens, any order
    100 10 3        bare numbers: weight, reps, sets
    SA 20x12        single-arm prefix

USAGE EXAMPLES:
    # Start a session, copying the exercises of the last one
    iron-log start --clone-last

    # Add an exercise and log sets
    iron-log exercise \"Bench Press\" --group chest
    iron-log set 100kg x 5
    iron-log set 102.5 5 --exercise \"bench press\"

    # Finish the session
    iron-log finish

    # JSON output for scripting
    iron-log show --format json | jq '.exercises[].sets[] | select(.is_pr)'

CONFIGURATION:
    Configuration file: ~/.config/ironnotes/config.toml
    Database location: ~/.local/share/ironnotes/workouts.db

    Override with environment variables:
        IRONNOTES_CONFIG    - Path to config file
        IRONNOTES_DB_PATH   - Path to database file

EXIT CODES:
    0 - Success
    1 - Database error
    2 - Configuration error
    3 - Invalid input (unparseable set, empty name, etc.)
    4 - Not found (no active session, unknown exercise or session)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, global = true, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a new session
    Start {
        /// Copy the exercises of the most recent session (without sets)
        #[arg(long)]
        clone_last: bool,

        /// Free-form notes for the session
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Add an exercise to the active session
    Exercise {
        /// Exercise name, e.g. "Bench Press"
        name: String,

        /// Muscle group: chest, back, legs, shoulders, arms or core (default: Full Body)
        #[arg(short, long)]
        group: Option<MuscleGroup>,
    },

    /// Log a set in shorthand notation
    Set {
        /// Set notation, e.g. "100kg x 5"; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        notation: Vec<String>,

        /// Exercise in the active session (default: the last one added)
        #[arg(short, long)]
        exercise: Option<String>,
    },

    /// Show a session (default: the active one, else the most recent)
    Show {
        session_id: Option<String>,
    },

    /// Finish the active session
    Finish,

    /// Delete a session with its exercises and sets
    Delete {
        session_id: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Parse a set notation without recording it
    Parse {
        #[arg(required = true, num_args = 1..)]
        notation: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn from_arg(format: &str) -> Self {
        if format == "json" {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libironnotes::logging::init_default(cli.verbose);
    debug!("iron-log started with args: {:?}", cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = OutputFormat::from_arg(&cli.format);

    // Parsing needs no database
    let command = match cli.command {
        Commands::Parse { notation } => return cmd_parse(&notation.join(" "), format),
        command => command,
    };

    let service = IronNotesService::new().await?;
    let unit = service.config().training.unit;

    match command {
        Commands::Start { clone_last, notes } => {
            let started = service.workouts().start_session(clone_last, notes).await?;
            output_started(&started, format);
        }
        Commands::Exercise { name, group } => {
            let group = exercise_group(group)?;
            let session = service.workouts().active_session().await?;
            let exercise = service.workouts().add_exercise(&session.id, &name, group).await?;
            match format {
                OutputFormat::Json => print_json(&exercise),
                OutputFormat::Text => println!("Added {} ({}) {}", exercise.name, exercise.muscle_group, exercise.id),
            }
        }
        Commands::Set { notation, exercise } => {
            let logged = cmd_set(&service, &notation.join(" "), exercise.as_deref()).await?;
            output_logged(&logged, unit, format);
        }
        Commands::Show { session_id } => {
            let session_id = match session_id {
                Some(id) => id,
                None => default_session(&service).await?.id,
            };
            let detail = service.workouts().session_detail(&session_id).await?;
            output_detail(&detail, unit, format);
        }
        Commands::Finish => {
            let session = service.workouts().active_session().await?;
            let finished = service.workouts().finish_session(&session.id).await?;
            match format {
                OutputFormat::Json => print_json(&finished),
                OutputFormat::Text => println!(
                    "Finished session {} ({})",
                    finished.id,
                    format_session_duration(finished.duration)
                ),
            }
        }
        Commands::Delete { session_id, force } => {
            let session = service.workouts().get_session(&session_id).await?;
            if !force && !confirm(&format!("Delete session {} and all its sets?", session.id))? {
                return Err(IronError::InvalidInput("deletion cancelled".to_string()));
            }
            service.workouts().delete_session(&session.id).await?;
            if format == OutputFormat::Text {
                println!("Deleted session {}", session.id);
            }
        }
        Commands::Parse { notation } => cmd_parse(&notation.join(" "), format)?,
    }

    Ok(())
}

fn cmd_parse(notation: &str, format: OutputFormat) -> Result<()> {
    let parsed = parse(notation)?;
    match format {
        OutputFormat::Json => print_json(&parsed),
        OutputFormat::Text => print_parsed(&parsed, Config::load()?.training.unit),
    }
    Ok(())
}

async fn cmd_set(service: &IronNotesService, notation: &str, exercise: Option<&str>) -> Result<LoggedSet> {
    let session = service.workouts().active_session().await?;

    let exercise = match exercise {
        Some(name) => service.workouts().find_exercise(&session.id, name).await?,
        None => service
            .database()
            .list_exercises(&session.id)
            .await?
            .pop()
            .ok_or_else(|| {
                IronError::NotFound(
                    "no exercise in the active session; add one with `iron-log exercise NAME`".to_string(),
                )
            })?,
    };

    debug!("Logging '{}' against {} ({})", notation, exercise.name, exercise.id);
    service.workouts().log_set(&exercise.id, notation).await
}

/// Full Body is only the fallback; an explicit group must be a selectable one
fn exercise_group(group: Option<MuscleGroup>) -> Result<MuscleGroup> {
    match group {
        None => Ok(MuscleGroup::FullBody),
        Some(group) if MuscleGroup::selectable().any(|g| g == group) => Ok(group),
        Some(group) => {
            let choices: Vec<&str> = MuscleGroup::selectable().map(|g| g.as_str()).collect();
            Err(IronError::InvalidInput(format!(
                "'{}' cannot be chosen as a group; use one of: {}",
                group,
                choices.join(", ")
            )))
        }
    }
}

/// Active session, falling back to the most recent one
async fn default_session(service: &IronNotesService) -> Result<Session> {
    if let Some(session) = service.database().active_session().await? {
        return Ok(session);
    }
    service
        .database()
        .latest_session()
        .await?
        .ok_or_else(|| IronError::NotFound("no sessions recorded yet".to_string()))
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| IronError::InvalidInput(format!("failed to read confirmation: {}", e)))?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode JSON: {}", e),
    }
}

/// Notation carries no unit; the configured one is shown
fn print_parsed(parsed: &ParsedSet, unit: WeightUnit) {
    println!("weight: {}{}", parsed.weight, unit);
    println!("reps: {}", parsed.reps);
    println!("sets: {}", parsed.set_count);
    println!("single-arm: {}", if parsed.is_single_arm { "yes" } else { "no" });
}

fn output_started(started: &StartedSession, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(started),
        OutputFormat::Text => {
            println!("Started session {}", started.session.id);
            for exercise in &started.exercises {
                println!("  {} ({})", exercise.name, exercise.muscle_group);
            }
        }
    }
}

fn output_logged(logged: &LoggedSet, unit: WeightUnit, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(logged),
        OutputFormat::Text => {
            let set = &logged.set;
            let marker = if set.is_pr { "  PR" } else { "" };
            println!(
                "{} set {}: {}{} x {}{} (e1RM {:.1}){}",
                logged.exercise_name,
                set.set_count,
                set.weight,
                unit,
                set.reps,
                if set.is_single_arm { " single-arm" } else { "" },
                set.estimated_1rm(),
                marker
            );
            if let Some(previous) = &logged.outcome.demoted {
                println!("  replaces {} as the session best", previous);
            }
        }
    }
}

fn output_detail(detail: &SessionDetail, unit: WeightUnit, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(detail);
        return;
    }

    let session = &detail.session;
    let date = chrono::DateTime::from_timestamp(session.date, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| session.date.to_string());
    let status = if session.is_completed {
        format_session_duration(session.duration)
    } else {
        "in progress".to_string()
    };

    println!("{} | {} | {}", date, session.id, status);
    if !session.notes.is_empty() {
        println!("  {}", session.notes);
    }

    for entry in &detail.exercises {
        println!();
        println!("{} ({})", entry.exercise.name, entry.exercise.muscle_group);
        for set in &entry.sets {
            println!(
                "  {}. {}{} x {}{}{}",
                set.set_count,
                set.weight,
                unit,
                set.reps,
                if set.is_single_arm { " SA" } else { "" },
                if set.is_pr { "  PR" } else { "" }
            );
        }
    }
}
