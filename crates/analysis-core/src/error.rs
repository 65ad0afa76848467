use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Symbol source error: {0}")]
    SymbolSourceError(String),
}
