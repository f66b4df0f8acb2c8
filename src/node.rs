use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use rustix::fs::{FileType, RawMode, Stat};

use crate::engine::{path_from, Ancestor};

/// What kind of filesystem object an entry is, per its `lstat` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link. Never descended into unless the visitor asks.
    Symlink,

    /// A named pipe.
    Fifo,

    /// A unix domain socket.
    Socket,

    /// A character device.
    CharDevice,

    /// A block device.
    BlockDevice,

    /// Anything the mode bits don't identify.
    Other,
}

/// Owned snapshot of an entry's `lstat` result.
///
/// Captured exactly once, before the entry's first visit; a node whose
/// `lstat` failed is never constructed. The snapshot never follows
/// symlinks, so a symlink's metadata describes the link itself.
#[derive(Debug, Clone)]
pub struct Metadata {
    dev: u64,
    ino: u64,
    mode: u32,
    nlink: u64,
    uid: u32,
    gid: u32,
    size: u64,
    blocks: u64,
    block_size: u64,
    mtime: i64,
    mtime_nsec: i64,
}

impl Metadata {
    pub(crate) fn from_stat(st: &Stat) -> Self {
        Self {
            dev: st.st_dev as u64,
            ino: st.st_ino as u64,
            mode: st.st_mode as u32,
            nlink: st.st_nlink as u64,
            uid: st.st_uid as u32,
            gid: st.st_gid as u32,
            size: st.st_size as u64,
            blocks: st.st_blocks as u64,
            block_size: st.st_blksize as u64,
            mtime: st.st_mtime as i64,
            mtime_nsec: st.st_mtime_nsec as i64,
        }
    }

    /// Device the entry lives on. Together with [`ino`](Self::ino) this
    /// identifies the entry uniquely; the engine's cycle guard compares
    /// these pairs against the ancestor chain before following a symlink.
    pub fn dev(&self) -> u64 {
        self.dev
    }

    /// Inode number.
    pub fn ino(&self) -> u64 {
        self.ino
    }

    /// The raw `st_mode` word, type bits included.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Permission and setuid/setgid/sticky bits only.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Hard link count.
    pub fn nlink(&self) -> u64 {
        self.nlink
    }

    /// Owning user id.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Owning group id.
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Size in bytes (for symlinks, the length of the target path).
    pub fn len(&self) -> u64 {
        self.size
    }

    /// Whether the entry has zero length.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Allocated size in 512-byte blocks, the unit `du` accounts in.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Preferred I/O block size.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Last modification time as seconds since the epoch.
    pub fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Nanosecond part of the modification time.
    pub fn mtime_nsec(&self) -> i64 {
        self.mtime_nsec
    }

    /// Classify the entry from its mode bits.
    pub fn kind(&self) -> FileKind {
        match FileType::from_raw_mode(self.mode as RawMode) {
            FileType::RegularFile => FileKind::File,
            FileType::Directory => FileKind::Dir,
            FileType::Symlink => FileKind::Symlink,
            FileType::Fifo => FileKind::Fifo,
            FileType::Socket => FileKind::Socket,
            FileType::CharacterDevice => FileKind::CharDevice,
            FileType::BlockDevice => FileKind::BlockDevice,
            _ => FileKind::Other,
        }
    }

    /// Whether the entry itself is a directory (a symlink to one is not).
    pub fn is_dir(&self) -> bool {
        self.kind() == FileKind::Dir
    }

    /// Whether the entry is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.kind() == FileKind::Symlink
    }
}

/// The visitor's window onto the entry currently being visited.
///
/// A `Visit` is only valid for the duration of one visitor call; the engine
/// owns the underlying node and frees it (streaming) or records it
/// (materializing) once the entry is done. `T` is per-entry scratch state,
/// created with `T::default()` before the first visit and kept alive across
/// the optional second one, which is what makes bottom-up aggregation work
/// without the visitor managing its own stack:
/// a child folds its contribution into [`parent_extra`](Self::parent_extra),
/// and the parent reads the accumulated total from
/// [`extra`](Self::extra) on its post-order visit.
pub struct Visit<'a, T> {
    pub(crate) name: &'a OsStr,
    pub(crate) metadata: &'a Metadata,
    pub(crate) link_target: Option<&'a Path>,
    pub(crate) depth: usize,
    pub(crate) again: bool,
    pub(crate) extra: &'a mut T,
    pub(crate) parent_extra: Option<&'a mut T>,
    pub(crate) chain: Option<&'a Ancestor<'a>>,
}

impl<T> Visit<'_, T> {
    /// The entry's base name. For the walk root this is the path the walk
    /// was started with, which is what makes [`path`](Self::path) resolve.
    pub fn name(&self) -> &OsStr {
        self.name
    }

    /// The entry's `lstat` snapshot.
    pub fn metadata(&self) -> &Metadata {
        self.metadata
    }

    /// Where a symlink points, verbatim. `None` for everything else.
    pub fn link_target(&self) -> Option<&Path> {
        self.link_target
    }

    /// Distance from the walk root; the root itself is 1 and every child is
    /// its parent's depth plus one.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `false` on the pre-order visit, `true` on the post-order revisit
    /// requested with [`Control::COMEAGAIN`](crate::Control::COMEAGAIN).
    pub fn again(&self) -> bool {
        self.again
    }

    /// Whether this entry is a directory. Shorthand for
    /// `self.metadata().is_dir()`.
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    /// Whether this entry is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.metadata.is_symlink()
    }

    /// This entry's scratch slot.
    pub fn extra(&mut self) -> &mut T {
        self.extra
    }

    /// The enclosing directory's scratch slot, `None` at the root.
    ///
    /// Alive for the whole visit because the parent's frame outlives all of
    /// its children within a single walk.
    pub fn parent_extra(&mut self) -> Option<&mut T> {
        self.parent_extra.as_deref_mut()
    }

    /// Reconstruct the entry's path by walking the ancestor chain back to
    /// the walk root.
    ///
    /// Re-resolving the result from the directory the walk was started in
    /// reaches the same entry this node was built from, as long as nothing
    /// renamed the tree out from underneath the walk in the meantime.
    pub fn path(&self) -> PathBuf {
        path_from(self.chain, self.name)
    }
}
