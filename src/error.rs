use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no profile selected (run `desktops detect` first)")]
    NoSelection,

    #[error("state file error: {path}: {detail}")]
    State { path: PathBuf, detail: String },

    #[error("profile read failed: {path}: {source}")]
    ProfileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("profile {path} could not be loaded due to insufficient permissions")]
    ProfilePermission { path: PathBuf },

    #[error("parse error for {path}: {detail}")]
    ProfileParse { path: PathBuf, detail: String },

    #[error("hardware detection failed: {0}")]
    Detection(String),

    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),

    #[error("aborted: {0}")]
    Aborted(String),
}

impl Error {
    /// Process exit status for this kind of failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::NoSelection => 2,
            Error::NotImplemented(_) => 3,
            Error::State { .. } => 4,
            Error::Aborted(_) => 5,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
