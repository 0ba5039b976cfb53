//! Read-only pair iteration: inner and outer joins over two
//! VBuffers' index sets, without mutating either operand.

use crate::error::{HvaError, PreconditionViolation};
use crate::vbuffer::{Element, VBuffer};
use crate::visitor::PairVisitor;

fn check_lengths<T: Element>(a: &VBuffer<T>, b: &VBuffer<T>) -> Result<(), HvaError> {
    if a.length() != b.length() {
        return Err(PreconditionViolation::LengthMismatch {
            a: a.length(),
            b: b.length(),
        }
        .into());
    }
    Ok(())
}

/// Inner join: visits only indices defined in both `a` and `b`.
/// Short-circuits (returns `Ok(false)`) on the visitor's first `false`.
pub fn for_each_both_defined<T, V>(
    a: &VBuffer<T>,
    b: &VBuffer<T>,
    visitor: &mut V,
) -> Result<bool, HvaError>
where
    T: Element,
    V: PairVisitor<T>,
{
    check_lengths(a, b)?;
    match (a.indices(), b.indices()) {
        (None, None) => {
            for i in 0..a.length() {
                if !visitor.visit(i, a.get(i), b.get(i)) {
                    return Ok(false);
                }
            }
        }
        (Some(idx), None) => {
            for (&i, &va) in idx.iter().zip(a.values().iter()) {
                if !visitor.visit(i, va, b.get(i)) {
                    return Ok(false);
                }
            }
        }
        (None, Some(idx)) => {
            for (&i, &vb) in idx.iter().zip(b.values().iter()) {
                if !visitor.visit(i, a.get(i), vb) {
                    return Ok(false);
                }
            }
        }
        (Some(ia), Some(ib)) => {
            let (va, vb) = (a.values(), b.values());
            let (mut pa, mut pb) = (0usize, 0usize);
            while pa < ia.len() && pb < ib.len() {
                match ia[pa].cmp(&ib[pb]) {
                    std::cmp::Ordering::Less => pa += 1,
                    std::cmp::Ordering::Greater => pb += 1,
                    std::cmp::Ordering::Equal => {
                        if !visitor.visit(ia[pa], va[pa], vb[pb]) {
                            return Ok(false);
                        }
                        pa += 1;
                        pb += 1;
                    }
                }
            }
        }
    }
    Ok(true)
}

/// Outer join: visits every index defined in either `a` or `b`, supplying
/// zero for the missing side.
pub fn for_each_either_defined<T, V>(
    a: &VBuffer<T>,
    b: &VBuffer<T>,
    visitor: &mut V,
) -> Result<bool, HvaError>
where
    T: Element,
    V: PairVisitor<T>,
{
    check_lengths(a, b)?;
    match (a.indices(), b.indices()) {
        (None, None) | (Some(_), None) | (None, Some(_)) => {
            for i in 0..a.length() {
                if !visitor.visit(i, a.get(i), b.get(i)) {
                    return Ok(false);
                }
            }
        }
        (Some(ia), Some(ib)) => {
            let (va, vb) = (a.values(), b.values());
            let (mut pa, mut pb) = (0usize, 0usize);
            while pa < ia.len() && pb < ib.len() {
                match ia[pa].cmp(&ib[pb]) {
                    std::cmp::Ordering::Less => {
                        if !visitor.visit(ia[pa], va[pa], T::zero()) {
                            return Ok(false);
                        }
                        pa += 1;
                    }
                    std::cmp::Ordering::Greater => {
                        if !visitor.visit(ib[pb], T::zero(), vb[pb]) {
                            return Ok(false);
                        }
                        pb += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        if !visitor.visit(ia[pa], va[pa], vb[pb]) {
                            return Ok(false);
                        }
                        pa += 1;
                        pb += 1;
                    }
                }
            }
            while pa < ia.len() {
                if !visitor.visit(ia[pa], va[pa], T::zero()) {
                    return Ok(false);
                }
                pa += 1;
            }
            while pb < ib.len() {
                if !visitor.visit(ib[pb], T::zero(), vb[pb]) {
                    return Ok(false);
                }
                pb += 1;
            }
        }
    }
    Ok(true)
}
