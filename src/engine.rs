//! The recursive traversal core.
//!
//! One frame of [`stream_node`] corresponds to one filesystem entry. A
//! directory frame owns that directory's open descriptor and the node's
//! scratch state for as long as any descendant is being processed, which is
//! what bounds both open descriptors and live nodes by the recursion depth
//! rather than by the number of entries seen. Each level opens its children
//! relative to its own descriptor, so a single open touches one path
//! component no matter how deep the walk already is.

use std::ffi::OsStr;
use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::warn;

use crate::error::WalkError;
use crate::flags::Control;
use crate::node::{Metadata, Visit};
use crate::report::Report;
use crate::sys;
use crate::traits::Visitor;
use crate::tree::{Node, NodeId, Tree};

/// One link of the active ancestor chain, stack-allocated in the frame that
/// is descending. `dev`/`ino` identify the directory actually entered, so
/// for a followed symlink they describe the link's target, not the link.
pub(crate) struct Ancestor<'a> {
    pub(crate) name: &'a OsStr,
    pub(crate) dev: u64,
    pub(crate) ino: u64,
    pub(crate) parent: Option<&'a Ancestor<'a>>,
}

/// Rebuild a path from the ancestor chain plus the entry's own name.
pub(crate) fn path_from(chain: Option<&Ancestor<'_>>, name: &OsStr) -> PathBuf {
    let mut names = vec![name];
    let mut cursor = chain;
    while let Some(ancestor) = cursor {
        names.push(ancestor.name);
        cursor = ancestor.parent;
    }
    let mut path = PathBuf::new();
    for part in names.iter().rev() {
        path.push(part);
    }
    path
}

struct StreamState<'v, T> {
    visitor: &'v mut dyn Visitor<T>,
    base: Control,
    visited: usize,
    dirs: usize,
    skipped: usize,
}

impl<T> StreamState<'_, T> {
    fn skip(&mut self, quiet: bool, chain: Option<&Ancestor<'_>>, name: &OsStr, err: &io::Error) {
        self.skipped += 1;
        if !quiet {
            warn!("skipping {}: {err}", path_from(chain, name).display());
        }
    }
}

/// Run a streaming walk over `root`.
///
/// `base` is OR'd into every visit's returned [`Control`] before the engine
/// interprets it. Only root trouble is an error; everything else is a
/// per-entry skip.
pub(crate) fn run<T: Default>(
    root: &Path,
    base: Control,
    visitor: &mut dyn Visitor<T>,
) -> Result<Report, WalkError> {
    let start = Instant::now();
    let name = root.as_os_str();
    let root_err = |source: io::Error| WalkError::RootStat {
        path: root.to_path_buf(),
        source,
    };

    let stat = sys::lstat_at(None, name).map_err(root_err)?;
    let metadata = Metadata::from_stat(&stat);
    let link_target = if metadata.is_symlink() {
        Some(sys::read_link_at(None, name).map_err(root_err)?)
    } else {
        None
    };

    let mut state = StreamState {
        visitor,
        base,
        visited: 0,
        dirs: 0,
        skipped: 0,
    };
    let quiet = base.contains(Control::SHUTUP);
    stream_node(
        &mut state, None, None, name, metadata, link_target, 1, None, quiet,
    )?;

    Ok(Report {
        visited: state.visited,
        dirs: state.dirs,
        skipped: state.skipped,
        duration: start.elapsed(),
    })
}

/// Visit one entry and, per the visitor's directives, its subtree.
///
/// `Err` escapes only from the root frame; failures below the root are
/// accounted in the state and swallowed here.
#[allow(clippy::too_many_arguments)]
fn stream_node<T: Default>(
    state: &mut StreamState<'_, T>,
    parent_fd: Option<BorrowedFd<'_>>,
    chain: Option<&Ancestor<'_>>,
    name: &OsStr,
    metadata: Metadata,
    link_target: Option<PathBuf>,
    depth: usize,
    mut parent_extra: Option<&mut T>,
    quiet: bool,
) -> Result<(), WalkError> {
    state.visited += 1;
    if metadata.is_dir() {
        state.dirs += 1;
    }

    let mut extra = T::default();
    let mut ctl = {
        let mut visit = Visit {
            name,
            metadata: &metadata,
            link_target: link_target.as_deref(),
            depth,
            again: false,
            extra: &mut extra,
            parent_extra: parent_extra.as_deref_mut(),
            chain,
        };
        state.visitor.visit(&mut visit)
    };
    ctl |= state.base;
    let quiet = quiet || ctl.contains(Control::SHUTUP);

    // Holds this level's open descriptor until after the revisit below.
    let descent = plan_descent(state, parent_fd, chain, name, &metadata, ctl, depth, quiet)?;

    if let Some((fd, dev, ino)) = descent.as_ref() {
        let frame = Ancestor {
            name,
            dev: *dev,
            ino: *ino,
            parent: chain,
        };
        match sys::read_dir(fd.as_fd()) {
            Ok(entries) => {
                for entry in entries {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(err) => {
                            // A dirent stream that goes bad mid-scan cannot
                            // be resumed; the entries already yielded stand.
                            state.skip(quiet, chain, name, &io::Error::from(err));
                            break;
                        }
                    };
                    let bytes = entry.file_name().to_bytes();
                    if sys::is_dot_or_dotdot(bytes) {
                        continue;
                    }
                    let child_name = OsStr::from_bytes(bytes);
                    let child_stat = match sys::lstat_at(Some(fd.as_fd()), child_name) {
                        Ok(stat) => stat,
                        Err(err) => {
                            state.skip(quiet, Some(&frame), child_name, &err);
                            continue;
                        }
                    };
                    let child_meta = Metadata::from_stat(&child_stat);
                    let child_link = if child_meta.is_symlink() {
                        match sys::read_link_at(Some(fd.as_fd()), child_name) {
                            Ok(target) => Some(target),
                            Err(err) => {
                                state.skip(quiet, Some(&frame), child_name, &err);
                                continue;
                            }
                        }
                    } else {
                        None
                    };
                    stream_node(
                        state,
                        Some(fd.as_fd()),
                        Some(&frame),
                        child_name,
                        child_meta,
                        child_link,
                        depth + 1,
                        Some(&mut extra),
                        quiet,
                    )?;
                }
            }
            Err(err) => {
                if depth == 1 {
                    return Err(WalkError::RootOpen {
                        path: name.into(),
                        source: err,
                    });
                }
                state.skip(quiet, chain, name, &err);
            }
        }
    }

    if ctl.contains(Control::COMEAGAIN) {
        let mut visit = Visit {
            name,
            metadata: &metadata,
            link_target: link_target.as_deref(),
            depth,
            again: true,
            extra: &mut extra,
            parent_extra: parent_extra.as_deref_mut(),
            chain,
        };
        // The revisit's return value is advisory; recursion was decided by
        // the first visit and the children are already done.
        let _ = state.visitor.visit(&mut visit);
    }

    // The directory descriptor drops here, so open fds stay bounded by the
    // current depth on every exit path.
    drop(descent);
    Ok(())
}

/// Decide whether to descend into `name` and open it if so.
///
/// Returns the opened descriptor plus the dev/ino pair of the directory
/// entered. `None` means the entry stays a leaf: not a directory, recursion
/// not requested, a symlink without `SYMFOLLOW`, a dangling link, a cycle,
/// or an unopenable non-root directory (skipped with a diagnostic).
#[allow(clippy::too_many_arguments)]
fn plan_descent<T>(
    state: &mut StreamState<'_, T>,
    parent_fd: Option<BorrowedFd<'_>>,
    chain: Option<&Ancestor<'_>>,
    name: &OsStr,
    metadata: &Metadata,
    ctl: Control,
    depth: usize,
    quiet: bool,
) -> Result<Option<(OwnedFd, u64, u64)>, WalkError> {
    if !ctl.contains(Control::RECURSE) {
        return Ok(None);
    }

    if metadata.is_dir() {
        match sys::open_dir_at(parent_fd, name, true) {
            Ok(fd) => return Ok(Some((fd, metadata.dev(), metadata.ino()))),
            Err(err) => {
                if depth == 1 {
                    return Err(WalkError::RootOpen {
                        path: name.into(),
                        source: err,
                    });
                }
                state.skip(quiet, chain, name, &err);
                return Ok(None);
            }
        }
    }

    if metadata.is_symlink() && ctl.contains(Control::SYMFOLLOW) {
        // The link itself was already visited from its lstat identity; all
        // that is resolved here is whether there is a directory behind it.
        let target = match sys::stat_at(parent_fd, name) {
            Ok(stat) => Metadata::from_stat(&stat),
            // Dangling or unresolvable target: the entry stays a leaf.
            Err(_) => return Ok(None),
        };
        if !target.is_dir() {
            return Ok(None);
        }
        if on_chain(chain, target.dev(), target.ino()) {
            // A link back into an ancestor would expand forever. Skipping
            // the descent is not an error; the entry was visited as a leaf.
            return Ok(None);
        }
        match sys::open_dir_at(parent_fd, name, false) {
            Ok(fd) => return Ok(Some((fd, target.dev(), target.ino()))),
            Err(err) => {
                if depth == 1 {
                    return Err(WalkError::RootOpen {
                        path: name.into(),
                        source: err,
                    });
                }
                state.skip(quiet, chain, name, &err);
                return Ok(None);
            }
        }
    }

    Ok(None)
}

fn on_chain(chain: Option<&Ancestor<'_>>, dev: u64, ino: u64) -> bool {
    let mut cursor = chain;
    while let Some(ancestor) = cursor {
        if ancestor.dev == dev && ancestor.ino == ino {
            return true;
        }
        cursor = ancestor.parent;
    }
    false
}

/// Materialize the whole tree under `root`.
///
/// Runs the same streaming engine with an internal visitor that records
/// every entry into an arena: pushed on the pre-order visit, popped off the
/// parent stack on the post-order one. `base` carries walk-level flags
/// through, so `SYMFOLLOW` and `SHUTUP` work for materialized walks too.
pub(crate) fn collect(root: &Path, base: Control) -> Result<Tree, WalkError> {
    let mut tree = Tree::new();
    let mut stack: Vec<NodeId> = Vec::new();

    let mut record = |visit: &mut Visit<'_, ()>| -> Control {
        if visit.again() {
            stack.pop();
            return Control::empty();
        }
        let parent = stack.last().copied();
        let id = tree.push(Node {
            name: visit.name().to_os_string(),
            metadata: visit.metadata().clone(),
            link_target: visit.link_target().map(Path::to_path_buf),
            depth: visit.depth(),
            parent,
            children: Vec::new(),
        });
        stack.push(id);
        Control::RECURSE | Control::COMEAGAIN
    };

    run(root, base, &mut record)?;
    Ok(tree)
}
