#[derive(thiserror::Error, Debug)]
pub enum StopTimeError {
    #[error("invalid time '{value}': {message}")]
    MalformedTime { value: String, message: String },
    #[error("'{filepath}' is missing required column '{column}'")]
    MissingColumn { filepath: String, column: String },
    #[error("cannot repair trip '{trip_id}' (line {line_number}): {source}")]
    InvalidTrip {
        trip_id: String,
        line_number: u64,
        source: Box<StopTimeError>,
    },
    #[error("failed reading '{filepath}': {source}")]
    ReadError {
        filepath: String,
        source: csv::Error,
    },
    #[error("failed writing '{filepath}': {source}")]
    WriteError {
        filepath: String,
        source: csv::Error,
    },
    #[error("output file '{0}' already exists, use --overwrite to replace it")]
    OutputExists(String),
    #[error("{msg}: {source}")]
    ConfigReadError {
        msg: String,
        source: config::ConfigError,
    },
    #[error("failed writing report: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl StopTimeError {
    pub fn malformed_time(value: &str, message: impl Into<String>) -> StopTimeError {
        StopTimeError::MalformedTime {
            value: value.to_string(),
            message: message.into(),
        }
    }
}
