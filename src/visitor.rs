//! Visitor contracts for VBuffer iteration.
//!
//! Every iteration kernel in [`crate::iter`] is parameterized over a
//! visitor trait rather than a boxed closure, so the compiler monomorphizes
//! the traversal loop and the visitor body inlines into it — no indirect
//! call on the hot path. Context is not a separate generic parameter: a
//! visitor is just a struct, so by-reference context is whatever the
//! struct happens to borrow.
//!
//! Visitors that may short-circuit a traversal return `bool`; returning
//! `false` stops the enclosing iteration immediately and the iteration
//! function itself returns `false` to its caller. Visitors that produce a
//! replacement value return `T` and cannot short-circuit (every visited
//! slot must yield a value).

/// Visits a single defined slot, read-only.
pub trait ElementVisitor<T> {
    /// Returns `false` to stop iteration early.
    fn visit(&mut self, index: usize, value: T) -> bool;
}

/// Visits a single defined slot with mutable access to the stored value.
pub trait InPlaceVisitor<T> {
    fn visit(&mut self, index: usize, value: &mut T) -> bool;
}

/// Visits a defined slot and produces its replacement value.
pub trait ProducerVisitor<T> {
    fn visit(&mut self, index: usize, value: T) -> T;
}

/// Visits a pair of values at the same index, read-only.
pub trait PairVisitor<T> {
    /// Returns `false` to stop iteration early.
    fn visit(&mut self, index: usize, a: T, b: T) -> bool;
}

/// Visits a pair of values at the same index, mutating the destination
/// side in place. `src` is read-only, `dst` is the stored value to
/// overwrite.
pub trait PairInPlaceVisitor<T> {
    fn visit(&mut self, index: usize, src: T, dst: &mut T) -> bool;
}

/// Visits a pair of values at the same index and produces a third value for
/// a separate output buffer.
pub trait PairCopyVisitor<T> {
    fn visit(&mut self, index: usize, src: T, dst: T) -> T;
}

/// Wraps an `FnMut(usize, T) -> bool` closure as an [`ElementVisitor`].
pub struct FnElementVisitor<F>(pub F);

impl<T, F: FnMut(usize, T) -> bool> ElementVisitor<T> for FnElementVisitor<F> {
    fn visit(&mut self, index: usize, value: T) -> bool {
        (self.0)(index, value)
    }
}

/// Wraps an `FnMut(usize, &mut T) -> bool` closure as an [`InPlaceVisitor`].
pub struct FnInPlaceVisitor<F>(pub F);

impl<T, F: FnMut(usize, &mut T) -> bool> InPlaceVisitor<T> for FnInPlaceVisitor<F> {
    fn visit(&mut self, index: usize, value: &mut T) -> bool {
        (self.0)(index, value)
    }
}

/// Wraps an `FnMut(usize, T) -> T` closure as a [`ProducerVisitor`].
pub struct FnProducerVisitor<F>(pub F);

impl<T, F: FnMut(usize, T) -> T> ProducerVisitor<T> for FnProducerVisitor<F> {
    fn visit(&mut self, index: usize, value: T) -> T {
        (self.0)(index, value)
    }
}

/// Wraps an `FnMut(usize, T, T) -> bool` closure as a [`PairVisitor`].
pub struct FnPairVisitor<F>(pub F);

impl<T, F: FnMut(usize, T, T) -> bool> PairVisitor<T> for FnPairVisitor<F> {
    fn visit(&mut self, index: usize, a: T, b: T) -> bool {
        (self.0)(index, a, b)
    }
}

/// Wraps an `FnMut(usize, T, &mut T) -> bool` closure as a
/// [`PairInPlaceVisitor`].
pub struct FnPairInPlaceVisitor<F>(pub F);

impl<T, F: FnMut(usize, T, &mut T) -> bool> PairInPlaceVisitor<T> for FnPairInPlaceVisitor<F> {
    fn visit(&mut self, index: usize, src: T, dst: &mut T) -> bool {
        (self.0)(index, src, dst)
    }
}

/// Wraps an `FnMut(usize, T, T) -> T` closure as a [`PairCopyVisitor`].
pub struct FnPairCopyVisitor<F>(pub F);

impl<T, F: FnMut(usize, T, T) -> T> PairCopyVisitor<T> for FnPairCopyVisitor<F> {
    fn visit(&mut self, index: usize, src: T, dst: T) -> T {
        (self.0)(index, src, dst)
    }
}
