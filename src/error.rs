use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a generate-and-load run. None of these are
/// retried; the coordinator reports the error and exits with -1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("invalid scale factor {0}: must be greater than 0")]
    InvalidScaleFactor(f64),

    #[error(
        "invalid number of file splits {num_file_splits}: \
         must be positive and at least half the scale factor ({scale_factor})"
    )]
    InvalidSplitCount {
        num_file_splits: i64,
        scale_factor: f64,
    },

    #[error("invalid zipf factor {0}: must be between 0 and 4")]
    InvalidZipfFactor(i64),

    #[error("host list file {0:?} does not exist")]
    MissingHostList(PathBuf),

    #[error("host list must name exactly one host, found {0}")]
    InvalidHostCount(usize),

    #[error("host {0:?} is not supported, only localhost can be used")]
    UnsupportedHost(String),

    #[error("remote directory {0} already exists")]
    RemoteDirExists(String),

    #[error("failed to stage {path:?}: {source}")]
    StagingFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create remote directory {path}: {reason}")]
    RemoteDirCreationFailure { path: String, reason: String },

    #[error("failed to run storage client {command:?}: {source}")]
    StorageClient {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch job on {host}: {source}")]
    Launch {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
