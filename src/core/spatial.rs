//! Spatial index over address coordinates
//!
//! Addresses span a county-scale extent, so coordinates are projected to an
//! approximate local planar frame by scaling degrees to meters at a reference
//! latitude. This keeps radius queries in plain meters without a projected
//! coordinate system; the approximation degrades away from the calibration
//! latitude and is only valid at small extents.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Meters-per-degree scale factors at a reference latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarScale {
    pub m_per_deg_lng: f64,
    pub m_per_deg_lat: f64,
}

impl PlanarScale {
    /// Scale factors for a small area around `ref_lat_deg`
    ///
    /// One degree of latitude is treated as a constant ~111.1 km; one degree
    /// of longitude shrinks with the cosine of the reference latitude.
    pub fn at_latitude(ref_lat_deg: f64) -> Self {
        Self {
            m_per_deg_lng: 111_320.0 * ref_lat_deg.to_radians().cos(),
            m_per_deg_lat: 111_132.0,
        }
    }

    /// Project `[lng, lat]` degrees into local planar meters
    pub fn project(&self, point: [f64; 2]) -> [f64; 2] {
        [point[0] * self.m_per_deg_lng, point[1] * self.m_per_deg_lat]
    }
}

/// Planar point with its address index, for the R-tree
#[derive(Clone, Copy, Debug, PartialEq)]
struct IndexedPoint {
    coords: [f64; 2],
    idx: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.coords[0] - point[0];
        let dy = self.coords[1] - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.coords == *point
    }
}

/// Static proximity index over address locations
///
/// Built once per run; no insertions or deletions afterward.
pub struct AddressIndex {
    tree: RTree<IndexedPoint>,
    projected: Vec<[f64; 2]>,
}

impl AddressIndex {
    /// Bulk-load the index from `[lng, lat]` locations
    pub fn build(locations: &[[f64; 2]], scale: PlanarScale) -> Self {
        let projected: Vec<[f64; 2]> = locations.iter().map(|p| scale.project(*p)).collect();

        let points = projected
            .iter()
            .enumerate()
            .map(|(idx, coords)| IndexedPoint {
                coords: *coords,
                idx,
            })
            .collect();

        Self {
            tree: RTree::bulk_load(points),
            projected,
        }
    }

    pub fn len(&self) -> usize {
        self.projected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projected.is_empty()
    }

    /// Indices of all points within `radius_m` of point `idx`, itself included
    ///
    /// Sorted ascending so downstream pair evaluation is deterministic.
    pub fn neighbors_within(&self, idx: usize, radius_m: f64) -> Vec<usize> {
        let center = self.projected[idx];
        let mut neighbors: Vec<usize> = self
            .tree
            .locate_within_distance(center, radius_m * radius_m)
            .map(|p| p.idx)
            .collect();
        neighbors.sort_unstable();
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_scale_at_mid_latitude() {
        let scale = PlanarScale::at_latitude(39.0);
        // cos(39 deg) ~ 0.777, so a degree of longitude is ~86.5 km
        assert!((scale.m_per_deg_lng - 86_516.0).abs() < 100.0, "{}", scale.m_per_deg_lng);
        assert_eq!(scale.m_per_deg_lat, 111_132.0);
    }

    #[test]
    fn test_planar_scale_project() {
        let scale = PlanarScale {
            m_per_deg_lng: 85_000.0,
            m_per_deg_lat: 111_000.0,
        };
        let p = scale.project([2.0, 1.0]);
        assert_eq!(p, [170_000.0, 111_000.0]);
    }

    #[test]
    fn test_neighbors_within_radius() {
        let scale = PlanarScale::at_latitude(39.0);
        // ~0.0003 deg latitude is ~33 m; 0.002 deg is ~220 m
        let locations = [
            [-77.0760, 39.0300],
            [-77.0760, 39.0303], // ~33 m north of [0]
            [-77.0760, 39.0320], // ~220 m north of [0]
        ];
        let index = AddressIndex::build(&locations, scale);
        assert_eq!(index.len(), 3);

        let near = index.neighbors_within(0, 50.0);
        assert_eq!(near, vec![0, 1]);

        let wide = index.neighbors_within(0, 300.0);
        assert_eq!(wide, vec![0, 1, 2]);
    }

    #[test]
    fn test_neighbors_are_sorted_and_include_self() {
        let scale = PlanarScale::at_latitude(39.0);
        let locations = [
            [-77.0760, 39.0302],
            [-77.0760, 39.0301],
            [-77.0760, 39.0300],
        ];
        let index = AddressIndex::build(&locations, scale);
        let neighbors = index.neighbors_within(1, 100.0);
        assert_eq!(neighbors, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_index() {
        let index = AddressIndex::build(&[], PlanarScale::at_latitude(39.0));
        assert!(index.is_empty());
    }
}
