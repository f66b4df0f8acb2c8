use crate::flags::Control;
use crate::node::Visit;

/// Caller-supplied policy invoked once (or twice) per entry.
///
/// The engine calls [`visit`](Self::visit) pre-order for every entry it
/// constructs, and again post-order when the first call returned
/// [`Control::COMEAGAIN`]. The returned [`Control`] bits from the first
/// call steer recursion; the second call's return value is ignored.
///
/// `T` is the per-entry scratch state threaded through
/// [`Visit::extra`]/[`Visit::parent_extra`]. Tools that don't aggregate
/// anything use `T = ()`.
///
/// Any `FnMut(&mut Visit<'_, T>) -> Control` closure is a visitor, which is
/// the common way to supply one:
///
/// ```rust,ignore
/// walk(path).run(|v: &mut Visit<'_, ()>| {
///     println!("{}", v.path().display());
///     Control::RECURSE
/// })?;
/// ```
///
/// Restrictions like "only recurse into numeric-named directories" (the
/// `/proc/<pid>` scan shape) are expressed in the visitor itself by
/// withholding [`Control::RECURSE`]; the engine has no filtering primitive.
/// There is likewise no abort channel: a visitor stops a walk early by
/// refusing recursion everywhere and tracking a done flag in its own state.
pub trait Visitor<T> {
    /// Inspect one entry and return the directives for it.
    fn visit(&mut self, node: &mut Visit<'_, T>) -> Control;
}

impl<T, F> Visitor<T> for F
where
    F: FnMut(&mut Visit<'_, T>) -> Control,
{
    fn visit(&mut self, node: &mut Visit<'_, T>) -> Control {
        self(node)
    }
}
