//! Error types for build operations.

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while driving the toolchain.
///
/// Freshness checks never swallow these: a dependency or library that
/// cannot be stat'd surfaces as its own variant instead of silently
/// counting as stale, so missing generated headers are caught early.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A required job parameter is missing or empty.
    #[error("{0}")]
    InvalidConfig(&'static str),

    /// The source list tokenized to nothing.
    #[error("no source files specified")]
    NoSources,

    /// The encoded artifact name would exceed the filesystem name limit.
    #[error("encoded file name for '{path}' is {len} bytes, limit is 254")]
    NameTooLong { path: String, len: usize },

    /// An unexpected stat/read/write/mkdir failure.
    #[error("{}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The depfile has no colon separating target from dependencies.
    #[error("invalid depfile format in {}: no colon found", path.display())]
    MalformedDepfile { path: PathBuf },

    /// A path listed in a depfile cannot be stat'd.
    #[error("failed to stat dep '{}': {}", dep.display(), source)]
    MissingDependency {
        dep: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A path listed in `lib-paths` cannot be stat'd.
    #[error("failed to stat lib '{}': {}", lib.display(), source)]
    MissingLibrary {
        lib: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("compilation failed for {cfile}: {reason}")]
    CompileFailed { cfile: String, reason: String },

    #[error("archive failed for {}: {}", lib.display(), reason)]
    ArchiveFailed { lib: PathBuf, reason: String },

    #[error("linking failed for {}: {}", exe.display(), reason)]
    LinkFailed { exe: PathBuf, reason: String },

    /// The object was built but its command record could not be written.
    /// The artifact is valid; the next run will rebuild it unnecessarily.
    #[error("failed to write cmd file {}: {}", path.display(), source)]
    CmdRecordFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The executable was linked but its link record could not be written.
    #[error("failed to write link cmd file {}: {}", path.display(), source)]
    LinkRecordFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The ambient cancellation signal was raised.
    #[error("build cancelled")]
    Cancelled,
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
