//! Error types for IronNotes

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IronError>;

#[derive(Error, Debug)]
pub enum IronError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Could not parse set: {0}")]
    Parse(#[from] ParseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IronError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            IronError::InvalidInput(_) => 3,
            IronError::Parse(_) => 3,
            IronError::NotFound(_) => 4,
            IronError::Config(_) => 2,
            IronError::Database(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },
}

/// Failures of the shorthand set notation parser.
///
/// A failure never carries partial data; callers reject the input as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("input is empty")]
    Empty,

    #[error("no weight found")]
    MissingWeight,

    #[error("no rep count found")]
    MissingReps,

    #[error("expected weight x reps [x sets], got {0} parts")]
    BadPartCount(usize),

    #[error("'{0}' is not a valid weight")]
    InvalidWeight(String),

    #[error("'{0}' is not a valid rep count")]
    InvalidReps(String),
}

/// Failure to hand a deferred notification to the host scheduler.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification scheduler unavailable: {0}")]
    Unavailable(String),

    #[error("failed to spawn notifier: {0}")]
    Spawn(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = IronError::InvalidInput("Empty exercise name".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_parse_error() {
        let error = IronError::Parse(ParseError::MissingReps);
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_not_found() {
        let error = IronError::NotFound("session abc".to_string());
        assert_eq!(error.exit_code(), 4);
    }

    #[test]
    fn test_exit_code_config_error() {
        let config_error = ConfigError::MissingField("database.path".to_string());
        let error = IronError::Config(config_error);
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_database_error() {
        let db_error = DbError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ));
        let error = IronError::Database(db_error);
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_parse() {
        let error = IronError::Parse(ParseError::BadPartCount(4));
        assert_eq!(
            error.to_string(),
            "Could not parse set: expected weight x reps [x sets], got 4 parts"
        );
    }

    #[test]
    fn test_error_message_formatting_invalid_value() {
        let error = IronError::Config(ConfigError::InvalidValue {
            field: "training.unit".to_string(),
            reason: "expected kg or lb".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid value for training.unit: expected kg or lb"
        );
    }

    #[test]
    fn test_error_conversion_from_parse_error() {
        let iron_error: IronError = ParseError::Empty.into();

        match iron_error {
            IronError::Parse(ParseError::Empty) => {}
            _ => panic!("Expected IronError::Parse"),
        }
    }

    #[test]
    fn test_error_conversion_from_db_error() {
        let db_error = DbError::CorruptRow {
            table: "sets",
            reason: "negative reps".to_string(),
        };
        let iron_error: IronError = db_error.into();

        match iron_error {
            IronError::Database(_) => {}
            _ => panic!("Expected IronError::Database"),
        }
    }
}
