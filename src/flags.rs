use bitflags::bitflags;

bitflags! {
    /// Directives a [`Visitor`](crate::Visitor) returns to steer the walk.
    ///
    /// The bits are independent and freely combinable. An empty set means
    /// "this entry is done": no recursion, no revisit.
    ///
    /// Flags passed to [`WalkBuilder::flags`](crate::WalkBuilder::flags) are
    /// OR'd into every visit's return value before interpretation, so a walk
    /// built with `Control::RECURSE` descends everywhere even when the
    /// visitor returns `Control::empty()`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Control: u32 {
        /// Descend into this entry's children after the pre-order visit.
        ///
        /// Meaningful only for directories (and, with [`Control::SYMFOLLOW`],
        /// symlinks that resolve to directories). Ignored on the post-order
        /// visit, where children have already been processed.
        const RECURSE = 1 << 0;

        /// When recursing, treat a symlink to a directory as a directory.
        ///
        /// Without this bit a symlink is always visited as a single leaf.
        /// Following is subject to the cycle guard: a link that resolves to
        /// an ancestor of the current entry is not descended into.
        const SYMFOLLOW = 1 << 1;

        /// Visit this entry a second time, with
        /// [`Visit::again`](crate::Visit::again) set, after all of its
        /// children have been processed.
        ///
        /// The second visit's return value does not affect control flow.
        const COMEAGAIN = 1 << 2;

        /// Suppress the engine's diagnostics for unreadable entries in this
        /// subtree. Changes observability only, never which entries are
        /// visited.
        const SHUTUP = 1 << 3;
    }
}
