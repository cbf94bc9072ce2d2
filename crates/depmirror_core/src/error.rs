use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while walking a dependency graph or mirroring files.
///
/// Every variant names the path it failed on, so a single error is enough for
/// the user to find the offending file.
#[derive(Debug, Error)]
pub enum Error {
    /// The entry point, the input root, or a resolved dependency does not exist.
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// A specifier could not be resolved to any file.
    #[error("Cannot resolve '{specifier}' from {}", .from.display())]
    Resolution { specifier: String, from: PathBuf },

    /// The output root exists but is not a directory.
    #[error("Output folder is not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    /// A discovered file lives outside of the input root, so it has no mirrored location.
    #[error("{} is outside of the input folder {}", .path.display(), .root.display())]
    OutsideInputRoot { path: PathBuf, root: PathBuf },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Wrap an I/O error, turning `NotFound` into [`Error::NotFound`].
    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound { path: path.to_path_buf() }
        } else {
            Error::Io { op, path: path.to_path_buf(), source }
        }
    }

    /// The path the error is about.
    pub fn path(&self) -> &Path {
        match self {
            Error::NotFound { path }
            | Error::NotADirectory { path }
            | Error::OutsideInputRoot { path, .. }
            | Error::Parse { path, .. }
            | Error::Io { path, .. } => path,
            Error::Resolution { from, .. } => from,
        }
    }
}
