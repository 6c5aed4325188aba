use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;
use xanpay_engine::traits::{MerchantApiError, PaymentsDatabaseError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("The withdrawal cannot proceed. {0}")]
    PreconditionFailed(String),
    /// Upstream provider failures are reported with a generic message. The upstream status and
    /// body are logged server-side and never echoed to clients.
    #[error("An upstream provider is unavailable")]
    ProviderError,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::PreconditionFailed(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ProviderError => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("Invalid email or password.")]
    InvalidCredentials,
}

impl From<PaymentsDatabaseError> for ServerError {
    fn from(e: PaymentsDatabaseError) -> Self {
        match e {
            PaymentsDatabaseError::MerchantNotFound | PaymentsDatabaseError::ProductNotFound => {
                Self::NoRecordFound(e.to_string())
            },
            PaymentsDatabaseError::EmailAlreadyRegistered |
            PaymentsDatabaseError::DepositAddressAlreadyRegistered |
            PaymentsDatabaseError::InsufficientStockForInvoice { .. } |
            PaymentsDatabaseError::ProductUpdateNoOp => Self::ValidationError(e.to_string()),
            PaymentsDatabaseError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            PaymentsDatabaseError::InvoiceCodeExhausted(_) => Self::BackendError(e.to_string()),
            PaymentsDatabaseError::MerchantApiError(e) => e.into(),
        }
    }
}

impl From<MerchantApiError> for ServerError {
    fn from(e: MerchantApiError) -> Self {
        match e {
            MerchantApiError::MerchantNotFound => Self::NoRecordFound(e.to_string()),
            MerchantApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
