use std::ops::{Add, Mul, Sub};

use num_traits::Float;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::frame::index::FrameIndex;

/// Sparse coefficient vector over the frame index set. Absent indices carry
/// the value zero; stored entries may be zero only transiently (compress
/// removes them).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "C: Serialize", deserialize = "C: Deserialize<'de>"))]
pub struct SparseVector<C: Float, const D: usize>
{
    entries: FxHashMap<FrameIndex<D>, C>,
}

impl<C: Float, const D: usize> Default for SparseVector<C, D>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<C: Float, const D: usize> SparseVector<C, D>
{
    pub fn new() -> Self
    {
        Self { entries: FxHashMap::default() }
    }

    #[inline]
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    /// Coefficient of `index`, zero if absent.
    #[inline]
    pub fn get(&self, index: &FrameIndex<D>) -> C
    {
        self.entries.get(index).copied().unwrap_or_else(C::zero)
    }

    pub fn set(&mut self, index: FrameIndex<D>, value: C)
    {
        if value == C::zero()
        {
            self.entries.remove(&index);
        }
        else
        {
            self.entries.insert(index, value);
        }
    }

    /// Adds `value` to the coefficient of `index`.
    pub fn add(&mut self, index: FrameIndex<D>, value: C)
    {
        let entry = self.entries.entry(index).or_insert_with(C::zero);
        *entry = *entry + value;
    }

    pub fn clear(&mut self)
    {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FrameIndex<D>, &C)>
    {
        self.entries.iter()
    }

    pub fn indices(&self) -> impl Iterator<Item = &FrameIndex<D>>
    {
        self.entries.keys()
    }

    pub fn scale(&mut self, factor: C)
    {
        if factor == C::zero()
        {
            self.entries.clear();
            return;
        }
        for value in self.entries.values_mut()
        {
            *value = *value * factor;
        }
    }

    /// self += factor * other.
    pub fn axpy(&mut self, factor: C, other: &SparseVector<C, D>)
    {
        for (index, &value) in other.iter()
        {
            self.add(*index, factor * value);
        }
    }

    /// Euclidean inner product.
    pub fn dot(&self, other: &SparseVector<C, D>) -> C
    {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small
            .iter()
            .fold(C::zero(), |acc, (index, &value)| acc + value * large.get(index))
    }

    pub fn l2_norm_sqr(&self) -> C
    {
        self.entries.values().fold(C::zero(), |acc, &v| acc + v * v)
    }

    pub fn l2_norm(&self) -> C
    {
        self.l2_norm_sqr().sqrt()
    }

    /// Weak l^tau quasi-norm, sup_n n^(1/tau) |v|_n over the nonincreasing
    /// rearrangement of the magnitudes.
    pub fn weak_norm(&self, tau: f64) -> C
    {
        let mut magnitudes: Vec<C> = self.entries.values().map(|v| v.abs()).collect();
        magnitudes.sort_by(|a, b| b.partial_cmp(a).expect("finite coefficients"));
        let mut norm = C::zero();
        for (n, &m) in magnitudes.iter().enumerate()
        {
            let weight = C::from(((n + 1) as f64).powf(1.0 / tau)).expect("representable weight");
            norm = norm.max(weight * m);
        }
        norm
    }

    /// Removes all entries with magnitude at most `threshold`.
    pub fn compress(&mut self, threshold: C)
    {
        self.entries.retain(|_, value| value.abs() > threshold);
    }

    /// Best coarsening: the shortest vector w with ||self - w|| <= eps,
    /// made deterministic by breaking magnitude ties in index order.
    ///
    /// Each application drops a tail of mass at most eps^2, so repeated
    /// application at the same eps may shrink the vector further; a vector
    /// whose smallest entry magnitude exceeds eps is a fixed point.
    pub fn coarsen(&self, eps: C) -> SparseVector<C, D>
    {
        if eps <= C::zero()
        {
            return self.clone();
        }
        let mut sorted: Vec<(&FrameIndex<D>, &C)> = self.entries.iter().collect();
        sorted.sort_by(|(il, vl), (ir, vr)| {
            vr.abs()
                .partial_cmp(&vl.abs())
                .expect("finite coefficients")
                .then_with(|| il.cmp(ir))
        });

        let bound = self.l2_norm_sqr() - eps * eps;
        let mut result = SparseVector::new();
        if bound <= C::zero()
        {
            return result;
        }
        let mut mass = C::zero();
        for (index, &value) in sorted
        {
            result.set(*index, value);
            mass = mass + value * value;
            if mass > bound
            {
                break;
            }
        }
        result
    }

    /// Entries supported on patch `p`.
    pub fn restrict_to_patch(&self, p: usize) -> SparseVector<C, D>
    {
        let entries = self
            .entries
            .iter()
            .filter(|(index, _)| index.p() == p)
            .map(|(index, value)| (*index, *value))
            .collect();
        SparseVector { entries }
    }

    /// Splits into per-patch parts; the parts sum back to the whole.
    pub fn split_by_patch(&self, n_patches: usize) -> Vec<SparseVector<C, D>>
    {
        let mut parts = vec![SparseVector::new(); n_patches];
        for (index, &value) in self.iter()
        {
            parts[index.p()].set(*index, value);
        }
        parts
    }
}

impl<C: Float, const D: usize> FromIterator<(FrameIndex<D>, C)> for SparseVector<C, D>
{
    fn from_iter<T: IntoIterator<Item = (FrameIndex<D>, C)>>(iter: T) -> Self
    {
        let mut v = SparseVector::new();
        for (index, value) in iter
        {
            v.set(index, value);
        }
        v
    }
}

impl<C: Float, const D: usize> Add for &SparseVector<C, D>
{
    type Output = SparseVector<C, D>;

    fn add(self, rhs: Self) -> Self::Output
    {
        let mut result = self.clone();
        result.axpy(C::one(), rhs);
        result
    }
}

impl<C: Float, const D: usize> Sub for &SparseVector<C, D>
{
    type Output = SparseVector<C, D>;

    fn sub(self, rhs: Self) -> Self::Output
    {
        let mut result = self.clone();
        result.axpy(-C::one(), rhs);
        result
    }
}

impl<C: Float, const D: usize> Mul<C> for &SparseVector<C, D>
{
    type Output = SparseVector<C, D>;

    fn mul(self, rhs: C) -> Self::Output
    {
        let mut result = self.clone();
        result.scale(rhs);
        result
    }
}
