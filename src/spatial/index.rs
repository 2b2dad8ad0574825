use crate::core::{bounds::Bounds, geo::Point};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A drawn marker as seen by the hit tester.
#[derive(Debug, Clone)]
pub struct HitTarget {
    /// Index into the frame's marker list.
    pub index: usize,
    pub center: Point,
    /// Distance from the centre that still counts as a hit.
    pub hit_radius: f64,
}

impl HitTarget {
    pub fn new(index: usize, center: Point, hit_radius: f64) -> Self {
        Self {
            index,
            center,
            hit_radius,
        }
    }

    pub fn bounds(&self) -> Bounds {
        let r = Point::new(self.hit_radius, self.hit_radius);
        Bounds::new(self.center.subtract(&r), self.center.add(&r))
    }
}

impl PartialEq for HitTarget {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

// --- rstar integration -------------------------------------------------------------------------

impl RTreeObject for HitTarget {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let bounds = self.bounds();
        AABB::from_corners(
            [bounds.min.x, bounds.min.y],
            [bounds.max.x, bounds.max.y],
        )
    }
}

impl PointDistance for HitTarget {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.center.x - point[0];
        let dy = self.center.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.distance_2(point) <= self.hit_radius * self.hit_radius
    }
}

/// R-tree over the markers drawn in the last frame, in canvas pixels.
pub struct MarkerIndex {
    rtree: RTree<HitTarget>,
}

impl MarkerIndex {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
        }
    }

    /// Replaces the whole index with this frame's targets.
    pub fn rebuild(&mut self, targets: Vec<HitTarget>) {
        self.rtree = RTree::bulk_load(targets);
    }

    /// Marker under `point`: the closest centre among those whose hit radius
    /// covers it. Ties go to the later-drawn marker, which is on top.
    pub fn hit_test(&self, point: &Point) -> Option<usize> {
        let query = [point.x, point.y];
        self.rtree
            .locate_all_at_point(&query)
            .map(|t| (t.distance_2(&query), t.index))
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.1.cmp(&a.1))
            })
            .map(|(_, index)| index)
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }
}

impl Default for MarkerIndex {
    fn default() -> Self {
        Self::new()
    }
}
