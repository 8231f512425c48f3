use thiserror::Error;

/// Failures surfaced by a navigation attempt.
///
/// A discarded stale reply is not represented here: completing a query that
/// no longer matches the live session yields no effects instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("could not find app {0}")]
    UnknownApp(String),

    #[error("did not recognize route {0}")]
    UnknownRoute(String),

    #[error("could not select {token}: {reason}")]
    Navigation { token: String, reason: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid depth {depth} for a path of length {len}")]
    InvalidDepth { depth: usize, len: usize },

    #[error("malformed url fragment: {0}")]
    MalformedFragment(String),

    #[error("a query is already in flight for this session")]
    QueryInFlight,

    #[error("persistence: {0}")]
    Persistence(String),
}

impl NavError {
    pub fn navigation(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Navigation {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Errors that abort the in-flight navigation and must be shown to the user.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownApp(_)
                | Self::UnknownRoute(_)
                | Self::Navigation { .. }
                | Self::MalformedResponse(_)
        )
    }
}

impl From<std::io::Error> for NavError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
