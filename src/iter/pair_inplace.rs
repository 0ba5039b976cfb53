//! In-place pair iteration: `apply_with` (inner join) and
//! `apply_with_either_defined` (outer join), mutating `dst` directly.
//!
//! The structural case analysis for this engine distinguishes nine
//! shapes. Many of them are different entry points into the same linear
//! two-pointer merge rather than genuinely different algorithms, so this
//! implementation collapses them into: four cheap early-outs (kept
//! distinct because each avoids work the general merge would otherwise
//! do), and a single two-pointer merge that handles the remaining
//! structural relationships uniformly — one merge for the outer join,
//! one for the inner join, since the two joins grow `dst`'s shape
//! differently. Both merges visit slots in increasing index order and
//! call the visitor exactly once per defined pairing.

use crate::error::{HvaError, PreconditionViolation};
use crate::vbuffer::{Element, VBuffer};
use crate::visitor::PairInPlaceVisitor;

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

/// Inner join: only slots present in both `src` and `dst` are visited;
/// `dst`'s own index set never changes.
pub fn apply_with<T, V>(
    dst: &mut VBuffer<T>,
    src: &VBuffer<T>,
    visitor: &mut V,
) -> Result<bool, HvaError>
where
    T: Element,
    V: PairInPlaceVisitor<T>,
{
    engine(dst, src, false, visitor)
}

/// Outer join: every slot present in either `src` or `dst` is visited,
/// with zero supplied for the missing side; `dst` grows to `S_dst ∪
/// S_src`.
pub fn apply_with_either_defined<T, V>(
    dst: &mut VBuffer<T>,
    src: &VBuffer<T>,
    visitor: &mut V,
) -> Result<bool, HvaError>
where
    T: Element,
    V: PairInPlaceVisitor<T>,
{
    engine(dst, src, true, visitor)
}

fn engine<T, V>(
    dst: &mut VBuffer<T>,
    src: &VBuffer<T>,
    outer: bool,
    visitor: &mut V,
) -> Result<bool, HvaError>
where
    T: Element,
    V: PairInPlaceVisitor<T>,
{
    check_lengths(dst, src)?;

    // Case 1: src has nothing defined.
    if src.count() == 0 {
        if !outer {
            return Ok(true);
        }
        return Ok(visit_all_defined_in_place(dst, visitor));
    }

    // Case 2: src is dense. Densify dst (no-op if already dense) and walk
    // every slot; src is defined everywhere so inner and outer coincide.
    if src.is_dense() {
        dst.densify();
        let length = dst.length();
        let dst_vals = dst.values_mut();
        let src_vals = src.values();
        for i in 0..length {
            if !visitor.visit(i, src_vals[i], &mut dst_vals[i]) {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    // Case 3: dst is dense, src sparse with at least one entry.
    if dst.is_dense() {
        if outer {
            let length = dst.length();
            let dst_vals = dst.values_mut();
            for i in 0..length {
                if !visitor.visit(i, src.get(i), &mut dst_vals[i]) {
                    return Ok(false);
                }
            }
        } else {
            let idx = src.indices().unwrap().to_vec();
            let vals = src.values().to_vec();
            let dst_vals = dst.values_mut();
            for (&i, v) in idx.iter().zip(vals.iter()) {
                if !visitor.visit(i, *v, &mut dst_vals[i]) {
                    return Ok(false);
                }
            }
        }
        return Ok(true);
    }

    // Case 4: dst sparse and empty, src sparse with at least one entry.
    if dst.count() == 0 {
        if !outer {
            return Ok(true);
        }
        let idx = src.indices().unwrap().to_vec();
        let mut values = Vec::with_capacity(idx.len());
        for &i in &idx {
            let mut v = T::zero();
            if !visitor.visit(i, src.get(i), &mut v) {
                // Even on short-circuit we must leave dst in a valid
                // state; commit what was produced so far.
                values.push(v);
                let count = values.len();
                let produced_idx = idx[..count].to_vec();
                *dst = VBuffer::from_parts(dst.length(), count, values, Some(produced_idx))?;
                return Ok(false);
            }
            values.push(v);
        }
        let count = values.len();
        *dst = VBuffer::from_parts(dst.length(), count, values, Some(idx))?;
        return Ok(true);
    }

    // Cases 5-9: both sparse, both non-empty. Handled by a single
    // two-pointer merge per join kind.
    if outer {
        merge_outer(dst, src, visitor)
    } else {
        merge_inner(dst, src, visitor)
    }
}

fn visit_all_defined_in_place<T, V>(dst: &mut VBuffer<T>, visitor: &mut V) -> bool
where
    T: Element,
    V: PairInPlaceVisitor<T>,
{
    if let Some(idx) = dst.indices() {
        let idx = idx.to_vec();
        let vals = dst.values_mut();
        for (pos, &i) in idx.iter().enumerate() {
            if !visitor.visit(i, T::zero(), &mut vals[pos]) {
                return false;
            }
        }
        true
    } else {
        let length = dst.length();
        let vals = dst.values_mut();
        for i in 0..length {
            if !visitor.visit(i, T::zero(), &mut vals[i]) {
                return false;
            }
        }
        true
    }
}

/// Inner join over two non-empty sparse operands: `dst`'s shape never
/// changes; slots also present in `src` are updated, others are left
/// untouched.
fn merge_inner<T, V>(dst: &mut VBuffer<T>, src: &VBuffer<T>, visitor: &mut V) -> Result<bool, HvaError>
where
    T: Element,
    V: PairInPlaceVisitor<T>,
{
    let dst_idx = dst.indices().unwrap().to_vec();
    let src_idx = src.indices().unwrap().to_vec();
    let src_vals = src.values().to_vec();

    let mut sj = 0usize;
    let dst_vals = dst.values_mut();
    for (di, &d_index) in dst_idx.iter().enumerate() {
        while sj < src_idx.len() && src_idx[sj] < d_index {
            sj += 1;
        }
        if sj < src_idx.len() && src_idx[sj] == d_index {
            if !visitor.visit(d_index, src_vals[sj], &mut dst_vals[di]) {
                return Ok(false);
            }
            sj += 1;
        }
    }
    Ok(true)
}

/// Outer join over two non-empty sparse operands: `dst` grows to `S_dst ∪
/// S_src`. Builds a fresh index/value pair since `dst`'s shape may change
/// arbitrarily; densifies directly when the union covers every slot.
fn merge_outer<T, V>(dst: &mut VBuffer<T>, src: &VBuffer<T>, visitor: &mut V) -> Result<bool, HvaError>
where
    T: Element,
    V: PairInPlaceVisitor<T>,
{
    let dst_idx = dst.indices().unwrap().to_vec();
    let dst_vals = dst.values().to_vec();
    let src_idx = src.indices().unwrap().to_vec();
    let src_vals = src.values().to_vec();
    let length = dst.length();

    let mut out_idx = Vec::with_capacity(dst_idx.len() + src_idx.len());
    let mut out_vals = Vec::with_capacity(dst_idx.len() + src_idx.len());
    let (mut di, mut si) = (0usize, 0usize);
    let mut ok = true;

    while di < dst_idx.len() && si < src_idx.len() {
        let (d, s) = (dst_idx[di], src_idx[si]);
        let (index, src_val, mut v) = match d.cmp(&s) {
            std::cmp::Ordering::Less => {
                let r = (d, T::zero(), dst_vals[di]);
                di += 1;
                r
            }
            std::cmp::Ordering::Greater => {
                let r = (s, src_vals[si], T::zero());
                si += 1;
                r
            }
            std::cmp::Ordering::Equal => {
                let r = (d, src_vals[si], dst_vals[di]);
                di += 1;
                si += 1;
                r
            }
        };
        if !visitor.visit(index, src_val, &mut v) {
            ok = false;
        }
        out_idx.push(index);
        out_vals.push(v);
        if !ok {
            break;
        }
    }
    if ok {
        while di < dst_idx.len() {
            let index = dst_idx[di];
            let mut v = dst_vals[di];
            if !visitor.visit(index, T::zero(), &mut v) {
                out_idx.push(index);
                out_vals.push(v);
                ok = false;
                break;
            }
            out_idx.push(index);
            out_vals.push(v);
            di += 1;
        }
    }
    if ok {
        while si < src_idx.len() {
            let index = src_idx[si];
            let mut v = T::zero();
            if !visitor.visit(index, src_vals[si], &mut v) {
                out_idx.push(index);
                out_vals.push(v);
                ok = false;
                break;
            }
            out_idx.push(index);
            out_vals.push(v);
            si += 1;
        }
    }

    let count = out_idx.len();
    if count == length {
        *dst = VBuffer::from_parts(length, length, out_vals, None)?;
    } else {
        *dst = VBuffer::from_parts(length, count, out_vals, Some(out_idx))?;
    }
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::FnPairInPlaceVisitor;

    #[test]
    fn scenario_4_inner_join_dst_contains_src_indices() {
        let src = VBuffer::from_parts(6, 1, vec![10], Some(vec![2])).unwrap();
        let mut dst = VBuffer::from_parts(6, 3, vec![1, 2, 3], Some(vec![1, 2, 5])).unwrap();
        apply_with(&mut dst, &src, &mut FnPairInPlaceVisitor(|_i, s, d: &mut i32| {
            *d += s;
            true
        }))
        .unwrap();
        assert_eq!(dst.indices(), Some(&[1usize, 2, 5][..]));
        assert_eq!(dst.values(), &[1, 12, 3]);
    }

    #[test]
    fn scenario_5_outer_join_forces_densification() {
        let src = VBuffer::from_parts(3, 1, vec![5], Some(vec![0])).unwrap();
        let mut dst = VBuffer::from_parts(3, 2, vec![7, 9], Some(vec![1, 2])).unwrap();
        apply_with_either_defined(&mut dst, &src, &mut FnPairInPlaceVisitor(|_i, s, d: &mut i32| {
            *d = s + *d;
            true
        }))
        .unwrap();
        assert!(dst.is_dense());
        assert_eq!(dst.values(), &[5, 7, 9]);
    }

    #[test]
    fn inner_join_leaves_unmatched_dst_slots_untouched() {
        let src = VBuffer::from_parts(10, 2, vec![1, 2], Some(vec![0, 4])).unwrap();
        let mut dst = VBuffer::from_parts(10, 2, vec![100, 200], Some(vec![4, 7])).unwrap();
        apply_with(&mut dst, &src, &mut FnPairInPlaceVisitor(|_i, s, d: &mut i32| {
            *d += s;
            true
        }))
        .unwrap();
        assert_eq!(dst.indices(), Some(&[4usize, 7][..]));
        assert_eq!(dst.values(), &[201, 200]);
    }

    #[test]
    fn outer_join_on_disjoint_sparse_operands_unions_indices() {
        // add_mult_into-style scenario: a + 2*b
        let mut a = VBuffer::from_parts(10, 2, vec![1, 2], Some(vec![0, 4])).unwrap();
        let b = VBuffer::from_parts(10, 2, vec![3, 5], Some(vec![4, 7])).unwrap();
        apply_with_either_defined(&mut a, &b, &mut FnPairInPlaceVisitor(|_i, s, d: &mut i32| {
            *d += 2 * s;
            true
        }))
        .unwrap();
        assert_eq!(a.indices(), Some(&[0usize, 4, 7][..]));
        assert_eq!(a.values(), &[1, 8, 10]);
    }

    #[test]
    fn dense_src_walks_whole_length() {
        let src = VBuffer::<i32>::dense(4);
        let mut dst = VBuffer::from_parts(4, 1, vec![9], Some(vec![2])).unwrap();
        apply_with(&mut dst, &src, &mut FnPairInPlaceVisitor(|_i, _s, _d: &mut i32| true)).unwrap();
        assert!(dst.is_dense());
    }
}
