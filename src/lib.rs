//! # dirwalk
//!
//! Depth-first directory-tree traversal engine, streaming or materialized,
//! with visitor-driven recursion.
//!
//! dirwalk is the walking kernel for tools that process whole filesystem
//! subtrees: recursive copy, recursive chmod/chown, disk-usage accounting,
//! `/proc` and `/sys` scanners. It owns the recursion, the per-entry
//! `lstat`, symlink-cycle protection, and node lifetime; the caller owns
//! everything else through a [`Visitor`] whose return value steers the walk
//! one entry at a time. The engine never opens or stats anything on the
//! caller's behalf beyond the traversal itself, and it resolves every level
//! relative to the already-open parent directory descriptor, so one step
//! costs one path component regardless of depth.
//!
//! Unix-only: the contract is defined in terms of `lstat`, `openat`, and
//! directory streams.
//!
//! # Quick Start
//!
//! ```rust
//! use dirwalk::{walk, Control, Visit};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("a.txt"), b"hello")?;
//! std::fs::create_dir(dir.path().join("sub"))?;
//! std::fs::write(dir.path().join("sub").join("b.txt"), b"world")?;
//!
//! let report = walk(dir.path()).run(|v: &mut Visit<'_, ()>| {
//!     println!("{} (depth {})", v.path().display(), v.depth());
//!     Control::RECURSE
//! })?;
//!
//! assert_eq!(report.visited, 4); // root, a.txt, sub, sub/b.txt
//! # Ok(())
//! # }
//! ```
//!
//! # Bottom-up aggregation
//!
//! Returning [`Control::COMEAGAIN`] gets a directory a second, post-order
//! visit after all of its children. Combined with the per-node scratch slot
//! ([`Visit::extra`]) and the fold-into-parent channel
//! ([`Visit::parent_extra`]), that is enough to roll sizes up a tree
//! without managing an explicit stack:
//!
//! ```rust
//! use dirwalk::{walk, Control, Visit};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("a.txt"), vec![0u8; 100])?;
//! std::fs::create_dir(dir.path().join("sub"))?;
//! std::fs::write(dir.path().join("sub").join("b.txt"), vec![0u8; 50])?;
//!
//! let mut total = 0;
//! walk(dir.path()).run(|v: &mut Visit<'_, u64>| {
//!     if v.is_dir() {
//!         if v.again() {
//!             let subtree = *v.extra();
//!             match v.parent_extra() {
//!                 Some(parent) => *parent += subtree,
//!                 None => total = subtree,
//!             }
//!             Control::empty()
//!         } else {
//!             Control::RECURSE | Control::COMEAGAIN
//!         }
//!     } else {
//!         let len = v.metadata().len();
//!         if let Some(parent) = v.parent_extra() {
//!             *parent += len;
//!         }
//!         Control::empty()
//!     }
//! })?;
//!
//! assert_eq!(total, 150);
//! # Ok(())
//! # }
//! ```
//!
//! # Materialized trees
//!
//! When a caller needs random access to a subtree instead of a single
//! streaming pass, [`walk_tree`] builds the whole thing:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("a.txt"), b"data")?;
//!
//! let tree = dirwalk::walk_tree(dir.path())?;
//! assert_eq!(tree.len(), 2);
//! assert_eq!(tree[tree.root()].depth(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Failure model
//!
//! Only the root is load-bearing: a root that cannot be stat'ed or opened
//! fails the walk with a [`WalkError`]. Every other unreadable entry is
//! skipped with a single diagnostic (suppressible via
//! [`Control::SHUTUP`]), its siblings unaffected. A walk over a live
//! filesystem can always race concurrent renames and deletes; those races
//! surface as exactly these per-entry skips.

#![forbid(unsafe_code)]

mod builder;
mod engine;
mod error;
mod flags;
mod node;
mod report;
mod sys;
mod traits;
mod tree;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::WalkBuilder;
pub use error::WalkError;
pub use flags::Control;
pub use node::{FileKind, Metadata, Visit};
pub use report::Report;
pub use traits::Visitor;
pub use tree::{Node, NodeId, Tree};

use std::path::PathBuf;

// ── Entry points ──────────────────────────────────────────────────────────────

/// Create a [`WalkBuilder`] for the tree rooted at `root`.
///
/// This is the way into both traversal modes; see [`WalkBuilder::run`]
/// (streaming) and [`WalkBuilder::collect`] (materializing).
pub fn walk(root: impl Into<PathBuf>) -> WalkBuilder {
    WalkBuilder::new(root.into())
}

/// Streaming walk in one call: `flags` are OR'd into every visit's return
/// value, `visitor` sees each entry in pre-order (plus requested post-order
/// revisits).
///
/// Equivalent to `walk(root).flags(flags).run(visitor)`.
///
/// # Errors
///
/// Fails only when the root cannot be stat'ed or opened.
pub fn walk_with<T, V>(
    root: impl Into<PathBuf>,
    flags: Control,
    visitor: V,
) -> Result<Report, WalkError>
where
    T: Default,
    V: Visitor<T>,
{
    walk(root).flags(flags).run(visitor)
}

/// Materialize the entire tree under `root` and return it.
///
/// Equivalent to `walk(root).collect()`. Symlinks are kept as leaves; build
/// via [`WalkBuilder::flags`] with [`Control::SYMFOLLOW`] to descend
/// through them.
///
/// # Errors
///
/// Fails only when the root cannot be stat'ed or opened.
pub fn walk_tree(root: impl Into<PathBuf>) -> Result<Tree, WalkError> {
    walk(root).collect()
}
