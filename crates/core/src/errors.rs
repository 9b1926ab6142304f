use thiserror::Error;

use crate::domain::product::ProductId;

pub const PRODUCT_NOT_FOUND: &str = "Product not found";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("product id `{0}` was supplied by the caller; ids are assigned by the catalog")]
    CallerSuppliedIdentifier(ProductId),
    #[error("invalid product field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("product `{0}` not found")]
    NotFound(ProductId),
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("unprocessable request: {message}")]
    Unprocessable { message: String, correlation_id: String },
    #[error("payload too large: {message}")]
    PayloadTooLarge { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Unprocessable { .. } => 422,
            Self::PayloadTooLarge { .. } => 413,
            Self::Internal { .. } => 500,
        }
    }

    /// Text returned to the caller in the `detail` field of the error body.
    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::Unprocessable { message, .. }
            | Self::PayloadTooLarge { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::NotFound { correlation_id, .. }
            | Self::Unprocessable { correlation_id, .. }
            | Self::PayloadTooLarge { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Unprocessable { correlation_id: id, .. }
            | InterfaceError::PayloadTooLarge { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::Unprocessable {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::NotFound(_) => Self::NotFound {
                message: PRODUCT_NOT_FOUND.to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Upstream(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
