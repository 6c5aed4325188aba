use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum WalletApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Wallet provider could not be reached: {0}")]
    NetworkError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Wallet query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Wallet response was malformed: {0}")]
    InvalidResponse(String),
}
