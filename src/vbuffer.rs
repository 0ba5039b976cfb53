//! `VBuffer<T>` — the hybrid dense/sparse vector representation
//! and its structural primitives.
//!
//! A `VBuffer` is dense or sparse depending only on whether it carries an
//! index side-array: dense when `indices` is `None` (`count == length`
//! always), sparse otherwise (`indices[0..count)` strictly increasing,
//! `values[0..count)` the corresponding values, every other slot implicitly
//! the type's zero).

use crate::error::{HvaError, PreconditionViolation};

/// Element types usable inside a `VBuffer`. Kept deliberately minimal —
/// `VBuffer` never needs more than equality and a zero value to maintain
/// its own invariants; arithmetic is only required by the kernels built on
/// top (see `crate::kernels`), not by the buffer itself.
pub trait Element: Copy + PartialEq {
    fn zero() -> Self;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

macro_rules! impl_element_numeric {
    ($($t:ty),* $(,)?) => {
        $(
            impl Element for $t {
                fn zero() -> Self { 0 as $t }
            }
        )*
    };
}

impl_element_numeric!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// The hybrid dense/sparse vector. See module docs for the shape rule.
#[derive(Debug, Clone)]
pub struct VBuffer<T: Element> {
    length: usize,
    count: usize,
    values: Vec<T>,
    indices: Option<Vec<usize>>,
}

impl<T: Element> VBuffer<T> {
    /// Sparse, no defined slots.
    pub fn empty(length: usize) -> Self {
        VBuffer {
            length,
            count: 0,
            values: Vec::new(),
            indices: Some(Vec::new()),
        }
    }

    /// Dense, every slot zeroed.
    pub fn dense(length: usize) -> Self {
        VBuffer {
            length,
            count: length,
            values: vec![T::zero(); length],
            indices: None,
        }
    }

    /// Explicit construction. `indices` must be `None` iff `count ==
    /// length` (dense). Asserts invariant 3 (strict monotonicity, bounds).
    pub fn from_parts(
        length: usize,
        count: usize,
        values: Vec<T>,
        indices: Option<Vec<usize>>,
    ) -> Result<Self, HvaError> {
        if count > length {
            return Err(PreconditionViolation::InvalidShape { length, count }.into());
        }
        match &indices {
            None => {
                if count != length {
                    return Err(PreconditionViolation::InvalidShape { length, count }.into());
                }
            }
            Some(idx) => {
                if idx.len() < count {
                    return Err(HvaError::InvariantBreach(format!(
                        "indices array has {} entries, need {count}",
                        idx.len()
                    )));
                }
                let mut prev: Option<usize> = None;
                for &i in &idx[..count] {
                    if i >= length {
                        return Err(HvaError::InvariantBreach(format!(
                            "sparse index {i} out of bounds for length {length}"
                        )));
                    }
                    if let Some(p) = prev {
                        if i <= p {
                            return Err(HvaError::InvariantBreach(
                                "sparse indices not strictly increasing".into(),
                            ));
                        }
                    }
                    prev = Some(i);
                }
            }
        }
        if values.len() < count {
            return Err(HvaError::InvariantBreach(format!(
                "values array has {} entries, need {count}",
                values.len()
            )));
        }
        Ok(VBuffer {
            length,
            count,
            values,
            indices,
        })
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_dense(&self) -> bool {
        self.indices.is_none()
    }

    #[inline]
    pub fn is_sparse(&self) -> bool {
        !self.is_dense()
    }

    /// Explicit indices, `0..count`. `None` for dense buffers (every index
    /// `0..length` is implicitly defined).
    pub fn indices(&self) -> Option<&[usize]> {
        self.indices.as_deref().map(|s| &s[..self.count])
    }

    /// Explicit values, `0..count`.
    pub fn values(&self) -> &[T] {
        &self.values[..self.count]
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values[..self.count]
    }

    /// Read the logical value at `slot`, defined or implicit zero.
    pub fn get(&self, slot: usize) -> T {
        debug_assert!(slot < self.length);
        match &self.indices {
            None => self.values[slot],
            Some(idx) => match idx[..self.count].binary_search(&slot) {
                Ok(pos) => self.values[pos],
                Err(_) => T::zero(),
            },
        }
    }

    /// Runs the representation's invariant checks in debug builds. Never fails (or
    /// panics) on a buffer that was constructed via [`VBuffer::from_parts`]
    /// or mutated only through this module's own operators — this exists
    /// to catch bugs in the crate itself, not caller error.
    pub(crate) fn debug_assert_invariants(&self) {
        if cfg!(debug_assertions) {
            assert!(self.count <= self.length);
            match &self.indices {
                None => assert_eq!(self.count, self.length),
                Some(idx) => {
                    assert!(idx.len() >= self.count);
                    assert!(self.values.len() >= self.count);
                    for w in idx[..self.count].windows(2) {
                        assert!(w[0] < w[1]);
                    }
                    if let Some(&last) = idx[..self.count].last() {
                        assert!(last < self.length);
                    }
                }
            }
        }
    }

    /// Drops the index side-array and marks the buffer dense. Caller must
    /// already have ensured `values[0..length)` holds the correct dense
    /// image (used internally by [`VBuffer::densify`]).
    fn mark_dense(&mut self, length: usize) {
        self.length = length;
        self.count = length;
        self.indices = None;
    }

    // ---- structural primitives ----

    /// Zeroes every defined slot without changing shape.
    pub fn clear(&mut self) {
        for v in self.values[..self.count].iter_mut() {
            *v = T::zero();
        }
    }

    /// Converts a sparse buffer to dense. No-op if already dense.
    ///
    /// Rewrites `values` in place when its capacity already covers
    /// `length`, scanning from the highest defined index down so a write
    /// never clobbers a source that hasn't been read yet (every sparse
    /// index `i` satisfies `indices[i] >= i`, so writes only ever land on
    /// positions at or beyond the read cursor).
    pub fn densify(&mut self) {
        if self.is_dense() {
            return;
        }
        let length = self.length;
        let count = self.count;
        let indices = self.indices.take().unwrap();

        if self.values.len() < length {
            self.values.resize(length, T::zero());
        }
        let mut si = count;
        for pos in (0..length).rev() {
            if si > 0 && indices[si - 1] == pos {
                si -= 1;
                self.values[pos] = self.values[si];
            } else {
                self.values[pos] = T::zero();
            }
        }
        self.values.truncate(length);
        self.mark_dense(length);
    }

    /// Ensures slots `[0, k)` are explicitly represented, without fully
    /// densifying the rest of the buffer. The existing tail is shifted
    /// rightward as a unit: any gap between the new prefix and the tail's
    /// first surviving entry is bridged with zero-valued entries too, so
    /// the explicit region stays one contiguous run from `0` up to the
    /// tail's leading index rather than leaving a hole at `[k, tail_start)`.
    pub fn densify_first_k(&mut self, k: usize) -> Result<(), HvaError> {
        if k > self.length {
            return Err(PreconditionViolation::SlotOutOfBounds {
                slot: k,
                length: self.length,
            }
            .into());
        }
        if self.is_dense() || k == 0 {
            return Ok(());
        }
        if k == self.length {
            self.densify();
            return Ok(());
        }

        let indices = self.indices.as_ref().unwrap();
        let split = indices[..self.count].partition_point(|&i| i < k);

        // Fast path: the first k entries are already explicit and
        // contiguous (0, 1, ..., k-1).
        if split == k && indices[..k].iter().enumerate().all(|(i, &v)| i == v) {
            return Ok(());
        }
        // Fast path: previously empty.
        if self.count == 0 {
            self.indices = Some((0..k).collect());
            self.values = vec![T::zero(); k];
            self.count = k;
            self.debug_assert_invariants();
            return Ok(());
        }

        let tail_start = indices.get(split).copied().unwrap_or(self.length);
        let mut new_indices = Vec::with_capacity(tail_start.max(k) + (self.count - split));
        let mut new_values = Vec::with_capacity(tail_start.max(k) + (self.count - split));
        let mut j = 0usize;
        for i in 0..k {
            if j < split && indices[j] == i {
                new_values.push(self.values[j]);
                j += 1;
            } else {
                new_values.push(T::zero());
            }
            new_indices.push(i);
        }
        // Bridge the gap between the prefix and the tail's first entry so
        // the result has no implicit hole at the seam.
        for i in k..tail_start {
            new_indices.push(i);
            new_values.push(T::zero());
        }
        new_indices.extend_from_slice(&indices[split..self.count]);
        new_values.extend_from_slice(&self.values[split..self.count]);

        self.count = new_indices.len();
        self.indices = Some(new_indices);
        self.values = new_values;
        self.debug_assert_invariants();
        Ok(())
    }

    /// Single-slot read/manipulate with optional sparsification guard.
    ///
    /// `manip` may read and overwrite the value at `slot`. If the slot was
    /// implicit and the manipulator leaves it zero (per `is_zero`,
    /// defaulting to [`Element::is_zero`]), the structure is left
    /// unchanged; otherwise the new (index, value) pair is spliced into
    /// sorted position, densifying if that fills the buffer.
    pub fn apply_at_slot<F, Z>(
        &mut self,
        slot: usize,
        mut manip: F,
        is_zero: Option<Z>,
    ) -> Result<(), HvaError>
    where
        F: FnMut(&mut T),
        Z: Fn(&T) -> bool,
    {
        if slot >= self.length {
            return Err(PreconditionViolation::SlotOutOfBounds {
                slot,
                length: self.length,
            }
            .into());
        }
        if self.is_dense() {
            manip(&mut self.values[slot]);
            return Ok(());
        }

        let indices = self.indices.as_ref().unwrap();
        match indices[..self.count].binary_search(&slot) {
            Ok(pos) => {
                manip(&mut self.values[pos]);
                Ok(())
            }
            Err(pos) => {
                let mut v = T::zero();
                manip(&mut v);
                let zero = match &is_zero {
                    Some(f) => f(&v),
                    None => v.is_zero(),
                };
                if zero {
                    return Ok(());
                }
                let indices = self.indices.as_mut().unwrap();
                indices.insert(pos, slot);
                self.values.insert(pos, v);
                self.count += 1;
                if self.count == self.length {
                    self.densify();
                } else {
                    self.debug_assert_invariants();
                }
                Ok(())
            }
        }
    }

    /// Opportunistically collapses a dense `src` to sparse, writing into
    /// `dst`. Falls back to a dense copy when `src` is too short to bother,
    /// or when the fraction of non-zero slots exceeds `threshold`. A
    /// buffer that is already sparse is copied as-is.
    pub fn maybe_sparsify_copy<Z>(
        src: &VBuffer<T>,
        dst: &mut VBuffer<T>,
        is_zero: Z,
        threshold: f64,
    ) -> Result<(), HvaError>
    where
        Z: Fn(&T) -> bool,
    {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(PreconditionViolation::InvalidThreshold {
                threshold: threshold.to_string(),
            }
            .into());
        }
        if src.is_sparse() || src.length < 20 {
            *dst = src.clone();
            return Ok(());
        }

        let limit = (src.length as f64 * threshold).floor() as usize + 1;
        let mut nz = Vec::new();
        for i in 0..src.length {
            if !is_zero(&src.values[i]) {
                nz.push(i);
                if nz.len() > limit {
                    *dst = src.clone();
                    return Ok(());
                }
            }
        }
        let values: Vec<T> = nz.iter().map(|&i| src.values[i]).collect();
        let count = nz.len();
        *dst = VBuffer::from_parts(src.length, count, values, Some(nz))?;
        Ok(())
    }
}
