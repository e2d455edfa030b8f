use crate::client::ClientError;

use super::validate::Rejection;

#[derive(Debug)]
pub enum EngineError {
    VenueNotFound(String),
    Rejected(Rejection),
    NotAuthenticated,
    LimitExceeded(&'static str),
    Api(ClientError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::VenueNotFound(id) => write!(f, "venue not found: {id}"),
            EngineError::Rejected(reason) => write!(f, "booking rejected: {reason}"),
            EngineError::NotAuthenticated => write!(f, "not logged in"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Api(e) => write!(f, "API error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClientError> for EngineError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::MissingToken => EngineError::NotAuthenticated,
            other => EngineError::Api(other),
        }
    }
}
