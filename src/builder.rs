use std::path::PathBuf;

use crate::engine;
use crate::error::WalkError;
use crate::flags::Control;
use crate::report::Report;
use crate::traits::Visitor;
use crate::tree::Tree;

/// Configures one traversal, created via [`walk()`](crate::walk).
///
/// A builder runs exactly once, in one of two lifetime modes:
///
/// - [`run`](Self::run): streaming. Each node exists only for its visitor
///   call(s); memory stays proportional to depth.
/// - [`collect`](Self::collect): materializing. No visitor; the whole tree
///   is built and handed to the caller.
///
/// # Example
///
/// ```rust,ignore
/// let report = dirwalk::walk("/var/log")
///     .quiet(true)
///     .run(|v: &mut dirwalk::Visit<'_, ()>| {
///         println!("{}", v.path().display());
///         dirwalk::Control::RECURSE
///     })?;
/// ```
pub struct WalkBuilder {
    root: PathBuf,
    flags: Control,
}

impl WalkBuilder {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self {
            root,
            flags: Control::empty(),
        }
    }

    /// Walk-level [`Control`] bits, OR'd into every visit's return value.
    ///
    /// `Control::RECURSE` here turns a trivial visitor into a full
    /// traversal; `Control::SYMFOLLOW` makes [`collect`](Self::collect)
    /// descend through symlinked directories.
    pub fn flags(mut self, flags: Control) -> Self {
        self.flags |= flags;
        self
    }

    /// Suppress diagnostics for unreadable entries.
    ///
    /// Shorthand for `flags(Control::SHUTUP)`. Affects observability only;
    /// skipped entries are still counted in [`Report::skipped`].
    pub fn quiet(mut self, yes: bool) -> Self {
        if yes {
            self.flags |= Control::SHUTUP;
        }
        self
    }

    /// Run the walk in streaming mode, feeding every entry to `visitor`.
    ///
    /// The visitor's scratch type `T` is created per node with
    /// `T::default()`; see [`Visit`](crate::Visit) for the aggregation
    /// contract.
    ///
    /// # Errors
    ///
    /// Fails only when the root cannot be stat'ed or opened. Every other
    /// failure skips one entry and is tallied in the returned [`Report`].
    pub fn run<T, V>(self, mut visitor: V) -> Result<Report, WalkError>
    where
        T: Default,
        V: Visitor<T>,
    {
        engine::run(&self.root, self.flags, &mut visitor)
    }

    /// Run the walk in materializing mode and return the whole tree.
    ///
    /// Symlinks are leaves unless `Control::SYMFOLLOW` was set via
    /// [`flags`](Self::flags), in which case the cycle guard keeps
    /// self-referential links finite.
    ///
    /// # Errors
    ///
    /// Fails only when the root cannot be stat'ed or opened.
    pub fn collect(self) -> Result<Tree, WalkError> {
        engine::collect(&self.root, self.flags)
    }
}
