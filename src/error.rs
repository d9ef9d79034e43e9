use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing path to csv")]
    MissingPath,

    #[error("Missing column in csv: {0}")]
    MissingColumn(String),

    #[error("Cannot parse amount: {value:?}")]
    Amount { value: String },

    #[error("Cannot parse date: {value:?}")]
    Date { value: String },

    #[error("Unknown account category: {0}")]
    UnknownCategory(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
