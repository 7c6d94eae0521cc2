//! Error taxonomy for the engine.
//!
//! Every variant of [`EngineError`] is fatal to a run. Recoverable HTTP
//! situations (404, compressed payload that is not compressed) are reported as
//! [`crate::fetch::FetchOutcome`] values instead.

use std::io;
use std::path::PathBuf;

/// Why a server-supplied relative path was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathRejection {
    #[error("empty path component in '{path}'")]
    EmptyComponent { path: String },

    #[error("whitespace around a path component in '{path}'")]
    PaddedComponent { path: String },

    #[error("directory traversal in '{path}'")]
    Traversal { path: String },

    #[error("invalid character {ch:?} in '{path}'")]
    InvalidCharacter { path: String, ch: char },

    #[error("directory not whitelisted: '{dir}' in '{path}'")]
    NotWhitelisted { path: String, dir: String },
}

/// The log stream disagrees with what the session context expects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("unable to determine server information (endpoint or base URL unknown)")]
    MissingServerInfo,

    #[error("'{rel_path}' not found in announced URL {full_url:?}")]
    PathNotInUrl {
        rel_path: String,
        full_url: Option<String>,
    },
}

/// Fatal failure while fetching one file.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid request URL {url}: {reason}")]
    BadUrl { url: String, reason: String },

    #[error("GET {url} failed: {source}")]
    Transport { url: String, source: curl::Error },

    #[error("GET {url} returned HTTP {code}")]
    Http { url: String, code: u32 },

    #[error("GET {url}: too many redirects")]
    TooManyRedirects { url: String },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to decompress {url}: {source}")]
    Decompress { url: String, source: io::Error },
}

/// Fatal failure of the log source.
#[derive(Debug, thiserror::Error)]
pub enum TailerError {
    #[error("parent directory of {0} does not exist")]
    MissingParent(PathBuf),

    #[error("failed to replace {path} with a named pipe: {source}")]
    CreatePipe { path: PathBuf, source: io::Error },

    #[error("failed to remove {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to read log: {0}")]
    Read(#[source] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("rejected path: {0}")]
    Validation(#[from] PathRejection),

    #[error("inconsistent log: {0}")]
    Context(#[from] ContextError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Tailer(#[from] TailerError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
