use std::path::PathBuf;
use thiserror::Error;

/// Typed failures callers may want to match on. Everything else (I/O, JSON,
/// database) propagates as `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("data root `{}` does not exist or is not a directory", .0.display())]
    MissingRoot(PathBuf),

    /// A song file must carry at least one record; extra records are
    /// silently truncated, zero is an error.
    #[error("song file `{}` contains no records", .0.display())]
    EmptySongFile(PathBuf),
}
