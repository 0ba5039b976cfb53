//! Single-operand iteration.

use crate::vbuffer::{Element, VBuffer};
use crate::visitor::{ElementVisitor, InPlaceVisitor, ProducerVisitor};

/// Iterates the explicit entries of `v` in increasing slot order.
/// Returns `false` if the visitor short-circuited.
pub fn for_each_defined<T, V>(v: &VBuffer<T>, visitor: &mut V) -> bool
where
    T: Element,
    V: ElementVisitor<T>,
{
    match v.indices() {
        None => {
            for (i, &val) in v.values().iter().enumerate() {
                if !visitor.visit(i, val) {
                    return false;
                }
            }
        }
        Some(idx) => {
            for (&i, &val) in idx.iter().zip(v.values().iter()) {
                if !visitor.visit(i, val) {
                    return false;
                }
            }
        }
    }
    true
}

/// Same traversal as [`for_each_defined`], but the visitor receives a
/// mutable reference to the stored value. Never changes `v`'s structure.
pub fn apply_in_place<T, V>(v: &mut VBuffer<T>, visitor: &mut V) -> bool
where
    T: Element,
    V: InPlaceVisitor<T>,
{
    if let Some(idx) = v.indices() {
        let idx = idx.to_vec();
        for (&i, val) in idx.iter().zip(v.values_mut().iter_mut()) {
            if !visitor.visit(i, val) {
                return false;
            }
        }
    } else {
        for (i, val) in v.values_mut().iter_mut().enumerate() {
            if !visitor.visit(i, val) {
                return false;
            }
        }
    }
    true
}

/// Computes `dst[i] = f(i, src[i])` over the explicit positions of `src`.
/// `dst` ends up with the same structural shape as `src` (same length,
/// count, and indices when sparse); its buffers are reused when large
/// enough.
pub fn apply_into_either_defined<T, V>(src: &VBuffer<T>, dst: &mut VBuffer<T>, visitor: &mut V)
where
    T: Element,
    V: ProducerVisitor<T>,
{
    match src.indices() {
        None => {
            let mut values = Vec::with_capacity(src.length());
            for (i, &val) in src.values().iter().enumerate() {
                values.push(visitor.visit(i, val));
            }
            *dst = VBuffer::from_parts(src.length(), src.length(), values, None)
                .expect("dense shape is always valid");
        }
        Some(idx) => {
            let idx = idx.to_vec();
            let mut values = Vec::with_capacity(idx.len());
            for (&i, &val) in idx.iter().zip(src.values().iter()) {
                values.push(visitor.visit(i, val));
            }
            let count = idx.len();
            *dst = VBuffer::from_parts(src.length(), count, values, Some(idx))
                .expect("src's own shape is already valid");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::{FnElementVisitor, FnInPlaceVisitor, FnProducerVisitor};

    #[test]
    fn for_each_defined_visits_sparse_indices_only() {
        let v = VBuffer::from_parts(6, 2, vec![7, 9], Some(vec![2, 4])).unwrap();
        let mut seen = Vec::new();
        for_each_defined(&v, &mut FnElementVisitor(|i, val| {
            seen.push((i, val));
            true
        }));
        assert_eq!(seen, vec![(2, 7), (4, 9)]);
    }

    #[test]
    fn for_each_defined_short_circuits() {
        let v = VBuffer::<i32>::from_parts(6, 3, vec![1, 2, 3], Some(vec![0, 1, 2])).unwrap();
        let mut seen = Vec::new();
        let completed = for_each_defined(&v, &mut FnElementVisitor(|i, val| {
            seen.push((i, val));
            i < 0
        }));
        assert!(!completed);
        assert_eq!(seen, vec![(0, 1)]);
    }

    #[test]
    fn apply_in_place_mutates_values_only() {
        let mut v = VBuffer::from_parts(6, 2, vec![7, 9], Some(vec![2, 4])).unwrap();
        apply_in_place(&mut v, &mut FnInPlaceVisitor(|_i, val: &mut i32| {
            *val *= 10;
            true
        }));
        assert_eq!(v.values(), &[70, 90]);
        assert_eq!(v.indices(), Some(&[2usize, 4][..]));
    }

    #[test]
    fn apply_into_either_defined_preserves_shape() {
        let src = VBuffer::from_parts(6, 2, vec![7, 9], Some(vec![2, 4])).unwrap();
        let mut dst = VBuffer::<i32>::empty(6);
        apply_into_either_defined(&src, &mut dst, &mut FnProducerVisitor(|_i, v| v + 1));
        assert_eq!(dst.values(), &[8, 10]);
        assert_eq!(dst.indices(), Some(&[2usize, 4][..]));
    }
}
