use nalgebra::Point3;
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// A point returned by a spatial query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the set the index was built from.
    pub index: usize,
    pub squared_distance: f64,
}

/// Nearest neighbor and radius queries over a fixed set of 3d points.
///
/// Query results are written into caller-owned buffers so that a worker can reuse them for
/// every query it makes. Implementations must be safe to query from several threads once built.
pub trait SpatialIndex: Sync {
    /// The number of indexed points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the contents of `neighbors` with the (up to) `k` points closest to `query`,
    /// closest first.
    fn k_nearest(&self, query: Point3<f64>, k: usize, neighbors: &mut Vec<Neighbor>);

    /// Replaces the contents of `neighbors` with every point within `radius` of `query`,
    /// ordered by distance and then by index.
    fn within_radius(&self, query: Point3<f64>, radius: f64, neighbors: &mut Vec<Neighbor>);
}

/// An R-tree over a point set.
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    pub fn new(points: &[Point3<f64>]) -> Self {
        let points = points
            .iter()
            .enumerate()
            .map(|(ix, p)| IndexedPoint::new([p.x, p.y, p.z], ix))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }
}

fn neighbor(point: &IndexedPoint, query: Point3<f64>) -> Neighbor {
    let [x, y, z] = *point.geom();
    Neighbor {
        index: point.data,
        squared_distance: (Point3::new(x, y, z) - query).norm_squared(),
    }
}

impl SpatialIndex for PointIndex {
    fn len(&self) -> usize {
        self.tree.size()
    }

    fn k_nearest(&self, query: Point3<f64>, k: usize, neighbors: &mut Vec<Neighbor>) {
        neighbors.clear();
        neighbors.extend(
            self.tree
                .nearest_neighbor_iter(&[query.x, query.y, query.z])
                .take(k)
                .map(|p| neighbor(p, query)),
        );
    }

    fn within_radius(&self, query: Point3<f64>, radius: f64, neighbors: &mut Vec<Neighbor>) {
        neighbors.clear();
        if radius.is_nan() || radius < 0.0 {
            return;
        }
        neighbors.extend(
            self.tree
                .locate_within_distance([query.x, query.y, query.z], radius * radius)
                .map(|p| neighbor(p, query)),
        );
        // The tree yields points in storage order, which is not meaningful to callers.
        neighbors.sort_unstable_by(|a, b| {
            a.squared_distance
                .total_cmp(&b.squared_distance)
                .then(a.index.cmp(&b.index))
        });
    }
}
