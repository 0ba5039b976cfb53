//! Pair iteration with separate output: `apply_with_copy` and
//! `apply_with_either_defined_copy`. Parallel to the in-place merge
//! engine, but `dst` is read-only and results land in a third buffer
//! `res`.

use crate::error::{HvaError, PreconditionViolation};
use crate::vbuffer::{Element, VBuffer};
use crate::visitor::PairCopyVisitor;

fn check_lengths<T: Element>(dst: &VBuffer<T>, src: &VBuffer<T>) -> Result<(), HvaError> {
    if dst.length() != src.length() {
        return Err(PreconditionViolation::LengthMismatch {
            a: dst.length(),
            b: src.length(),
        }
        .into());
    }
    Ok(())
}

/// Inner join into a separate buffer: `res` carries `dst`'s own index set.
/// Slots also present in `src` are computed by the visitor; slots unique
/// to `dst` are copied verbatim (no visitor call).
pub fn apply_with_copy<T, V>(
    dst: &VBuffer<T>,
    src: &VBuffer<T>,
    res: &mut VBuffer<T>,
    visitor: &mut V,
) -> Result<(), HvaError>
where
    T: Element,
    V: PairCopyVisitor<T>,
{
    check_lengths(dst, src)?;
    let length = dst.length();

    if dst.is_dense() {
        let mut values = Vec::with_capacity(length);
        match src.indices() {
            None => {
                for i in 0..length {
                    values.push(visitor.visit(i, src.get(i), dst.get(i)));
                }
            }
            Some(src_idx) => {
                // src is sparse: only its defined slots go through the
                // visitor. Slots src leaves implicit are dst's own value,
                // copied verbatim with no visitor call.
                let src_vals = src.values();
                let mut sj = 0usize;
                for i in 0..length {
                    if sj < src_idx.len() && src_idx[sj] == i {
                        values.push(visitor.visit(i, src_vals[sj], dst.get(i)));
                        sj += 1;
                    } else {
                        values.push(dst.get(i));
                    }
                }
            }
        }
        *res = VBuffer::from_parts(length, length, values, None)?;
        return Ok(());
    }

    let dst_idx = dst.indices().unwrap().to_vec();
    let dst_vals = dst.values().to_vec();

    if src.is_dense() {
        let src_vals = src.values();
        let values: Vec<T> = dst_idx
            .iter()
            .zip(dst_vals.iter())
            .map(|(&i, &dv)| visitor.visit(i, src_vals[i], dv))
            .collect();
        let count = values.len();
        *res = VBuffer::from_parts(length, count, values, Some(dst_idx))?;
        return Ok(());
    }

    let src_idx = src.indices().unwrap().to_vec();
    let src_vals = src.values().to_vec();
    let mut values = Vec::with_capacity(dst_idx.len());
    let mut sj = 0usize;
    for (di, &d_index) in dst_idx.iter().enumerate() {
        while sj < src_idx.len() && src_idx[sj] < d_index {
            sj += 1;
        }
        if sj < src_idx.len() && src_idx[sj] == d_index {
            values.push(visitor.visit(d_index, src_vals[sj], dst_vals[di]));
            sj += 1;
        } else {
            // No visitor call for the side `src` does not define — copied
            // verbatim, without a visitor call.
            values.push(dst_vals[di]);
        }
    }
    let count = values.len();
    *res = VBuffer::from_parts(length, count, values, Some(dst_idx))?;
    Ok(())
}

/// Outer join into a separate buffer: `res` carries `S_dst ∪ S_src`, with
/// zero supplied for whichever side is missing at a given slot.
pub fn apply_with_either_defined_copy<T, V>(
    dst: &VBuffer<T>,
    src: &VBuffer<T>,
    res: &mut VBuffer<T>,
    visitor: &mut V,
) -> Result<(), HvaError>
where
    T: Element,
    V: PairCopyVisitor<T>,
{
    check_lengths(dst, src)?;
    let length = dst.length();

    if dst.is_dense() || src.is_dense() {
        let mut values = Vec::with_capacity(length);
        for i in 0..length {
            values.push(visitor.visit(i, src.get(i), dst.get(i)));
        }
        *res = VBuffer::from_parts(length, length, values, None)?;
        return Ok(());
    }

    let dst_idx = dst.indices().unwrap();
    let dst_vals = dst.values();
    let src_idx = src.indices().unwrap();
    let src_vals = src.values();

    let mut out_idx = Vec::with_capacity(dst_idx.len() + src_idx.len());
    let mut out_vals = Vec::with_capacity(dst_idx.len() + src_idx.len());
    let (mut di, mut si) = (0usize, 0usize);
    while di < dst_idx.len() && si < src_idx.len() {
        match dst_idx[di].cmp(&src_idx[si]) {
            std::cmp::Ordering::Less => {
                out_idx.push(dst_idx[di]);
                out_vals.push(visitor.visit(dst_idx[di], T::zero(), dst_vals[di]));
                di += 1;
            }
            std::cmp::Ordering::Greater => {
                out_idx.push(src_idx[si]);
                out_vals.push(visitor.visit(src_idx[si], src_vals[si], T::zero()));
                si += 1;
            }
            std::cmp::Ordering::Equal => {
                out_idx.push(dst_idx[di]);
                out_vals.push(visitor.visit(dst_idx[di], src_vals[si], dst_vals[di]));
                di += 1;
                si += 1;
            }
        }
    }
    while di < dst_idx.len() {
        out_idx.push(dst_idx[di]);
        out_vals.push(visitor.visit(dst_idx[di], T::zero(), dst_vals[di]));
        di += 1;
    }
    while si < src_idx.len() {
        out_idx.push(src_idx[si]);
        out_vals.push(visitor.visit(src_idx[si], src_vals[si], T::zero()));
        si += 1;
    }

    let count = out_idx.len();
    if count == length {
        *res = VBuffer::from_parts(length, length, out_vals, None)?;
    } else {
        *res = VBuffer::from_parts(length, count, out_vals, Some(out_idx))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::FnPairCopyVisitor;

    #[test]
    fn inner_copy_preserves_dst_shape_and_leaves_dst_untouched() {
        let dst = VBuffer::from_parts(6, 2, vec![1, 2], Some(vec![1, 5])).unwrap();
        let src = VBuffer::from_parts(6, 1, vec![10], Some(vec![1])).unwrap();
        let mut res = VBuffer::<i32>::empty(6);
        apply_with_copy(&dst, &src, &mut res, &mut FnPairCopyVisitor(|_i, s, d| d + s)).unwrap();
        assert_eq!(res.indices(), Some(&[1usize, 5][..]));
        assert_eq!(res.values(), &[11, 2]);
        assert_eq!(dst.values(), &[1, 2]);
    }

    #[test]
    fn inner_copy_dense_dst_sparse_src_copies_unmatched_slots_verbatim() {
        // Non-additive visitor: replacing `d` with `s` would corrupt any
        // slot it's wrongly invoked on with an implicit-zero `s`.
        let dst = VBuffer::from_parts(5, 5, vec![10, 20, 30, 40, 50], None).unwrap();
        let src = VBuffer::from_parts(5, 2, vec![2, 7], Some(vec![1, 3])).unwrap();
        let mut res = VBuffer::<i32>::empty(5);
        apply_with_copy(&dst, &src, &mut res, &mut FnPairCopyVisitor(|_i, s, _d| s)).unwrap();
        assert!(res.is_dense());
        assert_eq!(res.values(), &[10, 2, 30, 7, 50]);
        assert_eq!(dst.values(), &[10, 20, 30, 40, 50]);
    }

    #[test]
    fn outer_copy_unions_indices_without_mutating_dst() {
        let dst = VBuffer::from_parts(10, 2, vec![1, 2], Some(vec![0, 4])).unwrap();
        let src = VBuffer::from_parts(10, 2, vec![3, 5], Some(vec![4, 7])).unwrap();
        let mut res = VBuffer::<i32>::empty(10);
        apply_with_either_defined_copy(&dst, &src, &mut res, &mut FnPairCopyVisitor(|_i, s, d| d + s))
            .unwrap();
        assert_eq!(res.indices(), Some(&[0usize, 4, 7][..]));
        assert_eq!(res.values(), &[1, 8, 5]);
        assert_eq!(dst.values(), &[1, 2]);
    }
}
