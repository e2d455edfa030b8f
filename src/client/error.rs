//! Client error types

use thiserror::Error;

use crate::draft::DraftProblem;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or undecodable body
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected by API: {0}")]
    Validation(String),

    /// Any other non-success status
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("not logged in")]
    MissingToken,

    #[error("only venue managers can do this")]
    NotVenueManager,

    #[error("invalid venue: {}", list_problems(.0))]
    InvalidDraft(Vec<DraftProblem>),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("bad client configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn list_problems(problems: &[DraftProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ClientResult<T> = Result<T, ClientError>;
