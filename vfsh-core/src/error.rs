use thiserror::Error;

/// Unified error taxonomy shared by every layer of the core: the path
/// parser, the navigator, the dispatcher, and individual command handlers.
///
/// Handlers never let this type unwind across their own boundary; the
/// dispatcher converts it into a failed [`crate::dispatcher::CommandResult`]
/// instead (see [`crate::dispatcher::Dispatcher::execute`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    PathSyntax(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("{0}")]
    Ambiguous(String),

    #[error("{0}")]
    ReadOnly(String),

    #[error("{0}")]
    BadArgs(String),

    #[error("{0}")]
    Repository(String),

    #[error("{0}")]
    Other(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
