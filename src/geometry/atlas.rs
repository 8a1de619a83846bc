use crate::geometry::chart::{BoundingBox, Chart};

/// An overlapping cover of the domain: one chart per patch plus the
/// patch adjacency relation.
pub struct Atlas<const D: usize>
{
    charts: Vec<Box<dyn Chart<D>>>,
    patch_boxes: Vec<BoundingBox<D>>,
    adjacency: Vec<Vec<bool>>,
}

impl<const D: usize> Atlas<D>
{
    /// Builds an atlas, deriving adjacency from overlapping patch images.
    pub fn new(charts: Vec<Box<dyn Chart<D>>>) -> Self
    {
        let reference = BoundingBox::default();
        let patch_boxes: Vec<_> = charts.iter().map(|c| c.map_box(&reference)).collect();
        let n = charts.len();
        let mut adjacency = vec![vec![false; n]; n];
        for p in 0..n
        {
            for q in 0..n
            {
                adjacency[p][q] = p == q || patch_boxes[p].intersects(&patch_boxes[q]);
            }
        }
        Self { charts, patch_boxes, adjacency }
    }

    /// Builds an atlas with an explicitly supplied adjacency relation.
    pub fn with_adjacency(charts: Vec<Box<dyn Chart<D>>>, adjacency: Vec<Vec<bool>>) -> Self
    {
        assert_eq!(charts.len(), adjacency.len());
        let reference = BoundingBox::default();
        let patch_boxes = charts.iter().map(|c| c.map_box(&reference)).collect();
        Self { charts, patch_boxes, adjacency }
    }

    #[inline]
    pub fn n_patches(&self) -> usize
    {
        self.charts.len()
    }

    #[inline]
    pub fn chart(&self, p: usize) -> &dyn Chart<D>
    {
        self.charts[p].as_ref()
    }

    /// Physical bounding box of patch `p`.
    #[inline]
    pub fn patch_box(&self, p: usize) -> &BoundingBox<D>
    {
        &self.patch_boxes[p]
    }

    #[inline]
    pub fn adjacent(&self, p: usize, q: usize) -> bool
    {
        self.adjacency[p][q]
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::geometry::chart::AffineChart;

    fn two_patch_cover() -> Atlas<1>
    {
        Atlas::new(vec![
            Box::new(AffineChart::<1>::scaling([0.0], [0.7])),
            Box::new(AffineChart::<1>::scaling([0.3], [1.0])),
        ])
    }

    #[test]
    fn adjacency_from_overlap()
    {
        let atlas = two_patch_cover();
        assert_eq!(atlas.n_patches(), 2);
        assert!(atlas.adjacent(0, 1));
        assert!(atlas.adjacent(1, 0));
        assert!(atlas.adjacent(0, 0));
        assert_eq!(atlas.patch_box(0), &BoundingBox::new([0.0], [0.7]));
        assert_eq!(atlas.patch_box(1), &BoundingBox::new([0.3], [1.0]));
    }

    #[test]
    fn disjoint_patches_are_not_adjacent()
    {
        let atlas = Atlas::<1>::new(vec![
            Box::new(AffineChart::<1>::scaling([0.0], [0.4])),
            Box::new(AffineChart::<1>::scaling([0.6], [1.0])),
        ]);
        assert!(!atlas.adjacent(0, 1));
    }
}
