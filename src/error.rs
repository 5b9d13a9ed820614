use thiserror::Error;

#[derive(Error, Debug)]
pub enum RatioError {
    #[error("Invalid file format '{0}': only .csv files are accepted")]
    InvalidFileExtension(String),

    #[error("No data found in input")]
    EmptyInput,

    #[error("Missing header row")]
    MissingHeader,

    #[error("Unrecognized table shape: first column is '{0}', expected 'Indicador' or 'Ano'")]
    UnknownTableShape(String),

    #[error("Duplicate record for year {0}")]
    DuplicateYear(i32),

    #[error("Invalid threshold for {key}: {details}")]
    InvalidThreshold { key: String, details: String },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RatioError>;
