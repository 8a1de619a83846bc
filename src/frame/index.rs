use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Index of one aggregated-frame function: patch, level, per-direction type
/// (0 = generator, 1 = wavelet) and per-direction translation.
///
/// The total order is level first, then patch-major within the level.
/// Generators sort before wavelets of the same level; the level slot j0-1
/// of an enumeration holds the generators of level j0.
#[serde_as]
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct FrameIndex<const D: usize>
{
    p: usize,
    j: i32,
    #[serde_as(as = "[_; D]")]
    e: [u8; D],
    #[serde_as(as = "[_; D]")]
    k: [i32; D],
}

impl<const D: usize> FrameIndex<D>
{
    pub fn new(p: usize, j: i32, e: [u8; D], k: [i32; D]) -> Self
    {
        Self { p, j, e, k }
    }

    /// Patch number.
    #[inline]
    pub fn p(&self) -> usize
    {
        self.p
    }

    /// Level.
    #[inline]
    pub fn j(&self) -> i32
    {
        self.j
    }

    /// Per-direction type.
    #[inline]
    pub fn e(&self) -> &[u8; D]
    {
        &self.e
    }

    /// Per-direction translation.
    #[inline]
    pub fn k(&self) -> &[i32; D]
    {
        &self.k
    }

    /// A generator has type 0 in every direction.
    #[inline]
    pub fn is_generator(&self) -> bool
    {
        self.e.iter().all(|&e| e == 0)
    }

    /// The type array encoded as a binary number, first direction most
    /// significant.
    #[inline]
    pub(crate) fn e_code(&self) -> usize
    {
        self.e.iter().fold(0, |acc, &e| acc << 1 | e as usize)
    }

    pub(crate) fn e_from_code(code: usize) -> [u8; D]
    {
        std::array::from_fn(|d| (code >> (D - 1 - d) & 1) as u8)
    }
}

impl<const D: usize> PartialEq for FrameIndex<D>
{
    fn eq(&self, other: &Self) -> bool {
        self.p == other.p && self.j == other.j && self.e == other.e && self.k == other.k
    }
}
impl<const D: usize> Eq for FrameIndex<D> {}

impl<const D: usize> Hash for FrameIndex<D>
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.p.hash(state);
        self.j.hash(state);
        self.e.hash(state);
        self.k.hash(state);
    }
}

impl<const D: usize> Ord for FrameIndex<D>
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.j
            .cmp(&other.j)
            .then(self.is_generator().cmp(&other.is_generator()).reverse())
            .then(self.p.cmp(&other.p))
            .then(self.e.cmp(&other.e))
            .then(self.k.cmp(&other.k))
    }
}
impl<const D: usize> PartialOrd for FrameIndex<D>
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
