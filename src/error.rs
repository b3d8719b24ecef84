use thiserror::Error;

use crate::storage::csv::CsvError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no choices")]
    EmptyResponse,

    #[error("Empty statement: nothing to execute")]
    EmptyStatement,

    #[error("You can only execute one statement at a time.")]
    MultipleStatements,

    #[error("Statement not allowed on a read-only database")]
    ReadOnly,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV source not found: {0}")]
    MissingCsv(String),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
