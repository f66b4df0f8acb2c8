use std::time::Duration;

/// Summary of a completed streaming walk.
///
/// Skips cover entries that could not be stat'ed, opened, or read; each one
/// produced at most one diagnostic and never stopped its siblings. Entries
/// declined by the visitor are not skips, they simply were not descended
/// into.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Entries the visitor was called for (counting each node once, even
    /// with a post-order revisit).
    pub visited: usize,

    /// How many visited entries were directories.
    pub dirs: usize,

    /// Entries skipped because of per-entry failures.
    pub skipped: usize,

    /// Wall-clock time for the whole walk.
    pub duration: Duration,
}
