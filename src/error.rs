use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store setup failed: {0}")]
    Store(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Column {column} is not part of the {table} record layout")]
    UnknownColumn { table: String, column: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
