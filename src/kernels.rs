//! The named operations a caller actually invokes. `scale_into` and
//! `add_mult_into` are thin, realistic compositions over the iteration
//! components; `copy_from_list` and the NaN/finiteness predicates are
//! pure scans with no supporting machinery of their own, but still part
//! of the named surface callers depend on.

use crate::iter::{apply_in_place, apply_with_either_defined};
use crate::vbuffer::{Element, VBuffer};
use crate::visitor::{FnInPlaceVisitor, FnPairInPlaceVisitor};
use std::ops::{Add, Mul};

/// Multiplies every defined slot of `v` by `c`, in place. Preserves shape
/// (dense stays dense, sparse keeps its index set — multiplying by a
/// scalar never turns a non-zero value into zero's structural absence;
/// that is `maybe_sparsify_copy`'s job, not this kernel's).
pub fn scale_into<T>(v: &mut VBuffer<T>, c: T)
where
    T: Element + Mul<Output = T>,
{
    apply_in_place(v, &mut FnInPlaceVisitor(|_i, val: &mut T| {
        *val = *val * c;
        true
    }));
}

/// Computes `dst = dst + c * src` in place, across any density
/// combination. Implemented directly as the outer-join in-place merge
/// a slot defined only in `src` is a new contribution to
/// `dst`, a slot defined only in `dst` is left as-is (added to zero), and
/// a slot defined in both combines normally.
pub fn add_mult_into<T>(dst: &mut VBuffer<T>, c: T, src: &VBuffer<T>) -> Result<(), crate::error::HvaError>
where
    T: Element + Add<Output = T> + Mul<Output = T>,
{
    apply_with_either_defined(
        dst,
        src,
        &mut FnPairInPlaceVisitor(|_i, s: T, d: &mut T| {
            *d = *d + c * s;
            true
        }),
    )?;
    Ok(())
}

/// Truncating copy from a sequential container into a dense `dst` of the
/// given `length`. Slots beyond `source`'s length are zeroed.
pub fn copy_from_list<T: Element>(source: &[T], dst: &mut VBuffer<T>, length: usize) {
    let mut values = Vec::with_capacity(length);
    for i in 0..length {
        values.push(if i < source.len() { source[i] } else { T::zero() });
    }
    *dst = VBuffer::from_parts(length, length, values, None).expect("dense shape is always valid");
}

/// Reports whether any explicit slot of `v` holds NaN.
pub fn has_nans_f32(v: &VBuffer<f32>) -> bool {
    v.values().iter().any(|x| x.is_nan())
}

/// Double-precision variant of [`has_nans_f32`].
pub fn has_nans_f64(v: &VBuffer<f64>) -> bool {
    v.values().iter().any(|x| x.is_nan())
}

/// Reports whether any explicit slot of `v` holds NaN or an infinity.
pub fn has_non_finite_f32(v: &VBuffer<f32>) -> bool {
    v.values().iter().any(|x| !x.is_finite())
}

/// Double-precision variant of [`has_non_finite_f32`].
pub fn has_non_finite_f64(v: &VBuffer<f64>) -> bool {
    v.values().iter().any(|x| !x.is_finite())
}
