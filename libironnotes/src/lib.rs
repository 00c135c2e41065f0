//! IronNotes - Unix tools for logging strength training
//!
//! This library provides the core of the IronNotes workout log: the shorthand
//! set notation parser, the personal-record engine, the wall-clock rest timer,
//! and the SQLite-backed session store the command-line tools share.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod notify;
pub mod parser;
pub mod pr;
pub mod service;
pub mod timer;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use db::Database;
pub use error::{IronError, ParseError, Result};
pub use parser::{parse, ParsedSet};
pub use pr::{estimated_1rm, evaluate_and_mark, is_assisted, PrOutcome};
pub use timer::{RestTimer, TimerState};
pub use types::{Exercise, MuscleGroup, Session, SetEntry, SetRecord, WeightUnit};
