//! Thin wrappers over the fd-relative filesystem calls the engine is built
//! on. Everything here resolves a single path component against an
//! already-open parent directory descriptor; `None` means "relative to the
//! current working directory", which only the walk root uses.

use std::ffi::OsStr;
use std::io;
use std::os::fd::{BorrowedFd, OwnedFd};
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

use rustix::fs::{self, AtFlags, Dir, Mode, OFlags, Stat};

fn at(dirfd: Option<BorrowedFd<'_>>) -> BorrowedFd<'_> {
    dirfd.unwrap_or(fs::CWD)
}

/// `fstatat` with `AT_SYMLINK_NOFOLLOW`: the identity of an entry is always
/// what `lstat` says it is, never the thing a symlink points at.
pub(crate) fn lstat_at(dirfd: Option<BorrowedFd<'_>>, name: &OsStr) -> io::Result<Stat> {
    fs::statat(at(dirfd), name, AtFlags::SYMLINK_NOFOLLOW).map_err(io::Error::from)
}

/// `fstatat` following symlinks. Used only to ask "does this link land on a
/// directory, and which one" before deciding to descend through it.
pub(crate) fn stat_at(dirfd: Option<BorrowedFd<'_>>, name: &OsStr) -> io::Result<Stat> {
    fs::statat(at(dirfd), name, AtFlags::empty()).map_err(io::Error::from)
}

/// Open a directory entry relative to its parent descriptor.
///
/// `nofollow` is set whenever the entry was stat'ed as a plain directory, so
/// a concurrent swap-for-symlink rename fails the open instead of
/// redirecting the walk.
pub(crate) fn open_dir_at(
    dirfd: Option<BorrowedFd<'_>>,
    name: &OsStr,
    nofollow: bool,
) -> io::Result<OwnedFd> {
    let mut oflags = OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC;
    if nofollow {
        oflags |= OFlags::NOFOLLOW;
    }
    fs::openat(at(dirfd), name, oflags, Mode::empty()).map_err(io::Error::from)
}

/// Begin iterating the entries of an open directory descriptor.
pub(crate) fn read_dir(dirfd: BorrowedFd<'_>) -> io::Result<Dir> {
    Dir::read_from(dirfd).map_err(io::Error::from)
}

/// `readlinkat` relative to the parent descriptor.
pub(crate) fn read_link_at(dirfd: Option<BorrowedFd<'_>>, name: &OsStr) -> io::Result<PathBuf> {
    let target = fs::readlinkat(at(dirfd), name, Vec::new()).map_err(io::Error::from)?;
    Ok(PathBuf::from(std::ffi::OsString::from_vec(
        target.into_bytes(),
    )))
}

pub(crate) fn is_dot_or_dotdot(name: &[u8]) -> bool {
    name == b"." || name == b".."
}
