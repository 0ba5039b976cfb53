//! Hybrid sparse/dense vector algebra (HVA) and a typed kernel dispatch
//! cache (TKDC) — the numeric substrate beneath feature pipelines and
//! linear learners that need to treat dense and sparse vectors
//! uniformly without paying a branch per element for the distinction.
//!
//! # Overview
//!
//! A [`VBuffer`] is a vector that is either fully materialized (dense) or
//! carries only its non-default slots as sorted (index, value) pairs
//! (sparse). Every iteration kernel in [`iter`] handles all four
//! density combinations of its operands, and [`kernels`] composes those
//! into the named operations callers actually reach for
//! (`scale_into`, `add_mult_into`, ...).
//!
//! [`dispatch::Tkdc`] is the companion piece: a concurrent cache that
//! resolves a tuple of runtime type descriptors to a specialized
//! callable once, then serves every later call from a lock-free
//! hash-chain lookup.
//!
//! # Quick start
//!
//! ```
//! use hva_kernel::{scale_into, VBuffer};
//!
//! let mut v = VBuffer::from_parts(6, 2, vec![2, 5], Some(vec![1, 4])).unwrap();
//! scale_into(&mut v, 3);
//! assert_eq!(v.values(), &[6, 15]);
//! ```
//!
//! # Modules
//!
//! - [`vbuffer`]: the hybrid vector type and its structural primitives.
//! - [`visitor`]: the visitor contracts every iteration kernel is
//!   parameterized over.
//! - [`iter`]: single- and pair-operand iteration kernels.
//! - [`kernels`]: the named external operator surface built on `iter`.
//! - [`dispatch`]: the typed kernel dispatch cache.
//! - [`error`]: the crate's error taxonomy.

pub mod dispatch;
pub mod error;
pub mod iter;
pub mod kernels;
pub mod vbuffer;
pub mod visitor;

pub use dispatch::{Tkdc, TkdcConfig};
pub use error::{HvaError, PreconditionViolation, TkdcError};
pub use iter::{
    apply_in_place, apply_into_either_defined, apply_with, apply_with_copy,
    apply_with_either_defined, apply_with_either_defined_copy, for_each_both_defined,
    for_each_defined, for_each_either_defined,
};
pub use kernels::{
    add_mult_into, copy_from_list, has_nans_f32, has_nans_f64, has_non_finite_f32,
    has_non_finite_f64, scale_into,
};
pub use vbuffer::{Element, VBuffer};
pub use visitor::{
    ElementVisitor, FnElementVisitor, FnInPlaceVisitor, FnPairCopyVisitor, FnPairInPlaceVisitor,
    FnPairVisitor, FnProducerVisitor, InPlaceVisitor, PairCopyVisitor, PairInPlaceVisitor,
    PairVisitor, ProducerVisitor,
};
