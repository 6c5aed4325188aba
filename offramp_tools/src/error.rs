use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OffRampApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Off-ramp provider could not be reached: {0}")]
    NetworkError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Off-ramp query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Off-ramp response was malformed: {0}")]
    InvalidResponse(String),
}
