use std::fmt;

use reqwest::StatusCode;

/// The kinds of records the backend stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Company,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => write!(f, "user"),
            Entity::Company => write!(f, "company"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{entity} with id {id:?} not found")]
    NotFound { entity: Entity, id: String },
    #[error("backend responded with status {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
    #[error("the backend is read-only")]
    ReadOnly,
}

impl BackendError {
    /// A short, stable identifier for this kind of failure, suitable for
    /// machine consumption (e.g. GraphQL error extensions).
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::NotFound { .. } => "NOT_FOUND",
            BackendError::Status { .. } => "BACKEND_STATUS",
            BackendError::Transport(_) => "BACKEND_UNAVAILABLE",
            BackendError::Url(_) => "BACKEND_MISCONFIGURED",
            BackendError::ReadOnly => "READ_ONLY",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}
