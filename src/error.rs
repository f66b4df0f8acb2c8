use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to start a walk.
///
/// Only the walk's root can fail a traversal. Every other entry that cannot
/// be stat'ed, opened, or read is skipped with a diagnostic and the scan of
/// its siblings continues, so per-entry trouble never surfaces here.
#[derive(Error, Debug)]
pub enum WalkError {
    /// The root path could not be stat'ed.
    #[error("cannot stat walk root {path:?}")]
    RootStat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The root resolved to a directory that could not be opened or read.
    #[error("cannot open walk root {path:?}")]
    RootOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    /// The root path the walk was attempted on.
    ///
    /// Callers use this to print "cannot access: <path>" without pattern
    /// matching on variants.
    pub fn path(&self) -> &Path {
        match self {
            Self::RootStat { path, .. } | Self::RootOpen { path, .. } => path,
        }
    }

    /// The underlying I/O error.
    pub fn io(&self) -> &io::Error {
        match self {
            Self::RootStat { source, .. } | Self::RootOpen { source, .. } => source,
        }
    }

    /// Whether the failure was a missing root, the common case worth a
    /// distinct exit message in most tools.
    pub fn is_not_found(&self) -> bool {
        self.io().kind() == io::ErrorKind::NotFound
    }
}
