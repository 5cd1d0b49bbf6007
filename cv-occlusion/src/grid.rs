use crate::Ray;
use float_ord::FloatOrd;
use log::*;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("cannot build a voxel grid over an empty cloud")]
    EmptyCloud,
    #[error("leaf size must be positive and finite, got {0}")]
    InvalidLeafSize(f64),
    #[error("cloud point {0} has a non-finite coordinate")]
    NonFinitePoint(usize),
    #[error("a leaf size of {leaf_size} needs {dims:?} cells, which is too many")]
    TooManyCells { leaf_size: f64, dims: [f64; 3] },
}

/// A uniform voxel partition of a point cloud's bounding box.
///
/// Cells are cubes of edge `leaf_size`. The grid starts at the minimum corner of the cloud and
/// has `floor((max - min) / leaf_size) + 1` cells along each axis, so every point falls inside a
/// cell and the far faces of the grid lie slightly beyond the cloud. Only occupied cells are
/// stored.
///
/// The grid is immutable once built and may be queried from many threads.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    points: Vec<Point3<f64>>,
    min: Point3<f64>,
    max: Point3<f64>,
    leaf_size: f64,
    dims: [usize; 3],
    /// Point indices per occupied cell, in ascending order.
    cells: HashMap<usize, Vec<usize>>,
}

impl VoxelGrid {
    pub fn initialize(points: Vec<Point3<f64>>, leaf_size: f64) -> Result<Self, GridError> {
        if !(leaf_size.is_finite() && leaf_size > 0.0) {
            return Err(GridError::InvalidLeafSize(leaf_size));
        }
        if let Some(ix) = points
            .iter()
            .position(|p| !p.coords.iter().all(|n| n.is_finite()))
        {
            return Err(GridError::NonFinitePoint(ix));
        }
        let first = *points.first().ok_or(GridError::EmptyCloud)?;
        let (min, cloud_max) = points.iter().fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });

        let cells_per_axis = ((cloud_max - min) / leaf_size).map(|n| n.floor() + 1.0);
        let too_many = || GridError::TooManyCells {
            leaf_size,
            dims: [cells_per_axis.x, cells_per_axis.y, cells_per_axis.z],
        };
        let dims = [0, 1, 2].map(|axis| cells_per_axis[axis] as usize);
        dims.iter()
            .try_fold(1usize, |total, &n| total.checked_mul(n))
            .filter(|_| cells_per_axis.iter().all(|&n| n < usize::MAX as f64))
            .ok_or_else(too_many)?;
        let max = min + cells_per_axis * leaf_size;

        let mut grid = Self {
            points,
            min,
            max,
            leaf_size,
            dims,
            cells: HashMap::new(),
        };
        for ix in 0..grid.points.len() {
            let cell = grid.linear(grid.cell_of(grid.points[ix]));
            grid.cells.entry(cell).or_default().push(ix);
        }
        info!(
            "voxel grid of {:?} cells with leaf size {}, {} occupied by {} points",
            grid.dims,
            leaf_size,
            grid.cells.len(),
            grid.points.len()
        );
        Ok(grid)
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn point(&self, ix: usize) -> Option<Point3<f64>> {
        self.points.get(ix).copied()
    }

    pub fn leaf_size(&self) -> f64 {
        self.leaf_size
    }

    /// The number of cells along each axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// The minimum and maximum corner of the grid.
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        (self.min, self.max)
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// The cell containing `point`, clamped to the grid.
    pub fn cell_of(&self, point: Point3<f64>) -> [usize; 3] {
        let offset = (point - self.min) / self.leaf_size;
        [0, 1, 2].map(|axis| {
            let cell = offset[axis].floor().max(0.0) as usize;
            cell.min(self.dims[axis] - 1)
        })
    }

    fn linear(&self, [x, y, z]: [usize; 3]) -> usize {
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    /// The points of a cell, or an empty slice if it is unoccupied.
    pub fn cell_points(&self, cell: [usize; 3]) -> &[usize] {
        self.cells
            .get(&self.linear(cell))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The parameter at which `ray` enters the grid, or `None` if it misses the grid entirely.
    ///
    /// A ray starting inside the grid enters it at `0.0`.
    pub fn intersect_bounding_box(&self, ray: &Ray) -> Option<f64> {
        let mut entry = 0.0f64;
        let mut exit = f64::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (low, high) = (self.min[axis], self.max[axis]);
            if direction == 0.0 {
                if origin < low || origin > high {
                    return None;
                }
                continue;
            }
            let a = (low - origin) / direction;
            let b = (high - origin) / direction;
            entry = entry.max(a.min(b));
            exit = exit.min(a.max(b));
        }
        (entry <= exit).then(|| entry)
    }

    /// Walks the cells crossed by `ray` from parameter `entry` onwards and returns the point of
    /// the first occupied cell that lies nearest along the ray.
    ///
    /// Within a cell the point with the smallest ray parameter wins, ties going to the lower
    /// point index. Points behind the ray origin are never hit, so a cell that only holds such
    /// points is walked through. Returns `None` if the ray leaves the grid without a hit.
    pub fn first_hit(&self, ray: &Ray, entry: f64) -> Option<usize> {
        let direction = ray.direction.into_inner();
        let mut cell = self.cell_of(ray.at(entry));

        let mut step = [0isize; 3];
        let mut next_crossing = Vector3::repeat(f64::INFINITY);
        let mut crossing_delta = Vector3::repeat(f64::INFINITY);
        for axis in 0..3 {
            let d = direction[axis];
            if d == 0.0 {
                continue;
            }
            let low = self.min[axis] + cell[axis] as f64 * self.leaf_size;
            let boundary = if d > 0.0 { low + self.leaf_size } else { low };
            step[axis] = if d > 0.0 { 1 } else { -1 };
            next_crossing[axis] = (boundary - ray.origin[axis]) / d;
            crossing_delta[axis] = self.leaf_size / d.abs();
        }

        loop {
            if let Some(ix) = self.nearest_in_cell(ray, cell) {
                return Some(ix);
            }
            // Ties go to the lowest axis.
            let axis = next_crossing.imin();
            if !next_crossing[axis].is_finite() {
                return None;
            }
            let moved = cell[axis] as isize + step[axis];
            if moved < 0 || moved >= self.dims[axis] as isize {
                return None;
            }
            cell[axis] = moved as usize;
            next_crossing[axis] += crossing_delta[axis];
        }
    }

    fn nearest_in_cell(&self, ray: &Ray, cell: [usize; 3]) -> Option<usize> {
        self.cell_points(cell)
            .iter()
            .map(|&ix| (ix, ray.parameter(self.points[ix])))
            .filter(|&(_, t)| t >= 0.0)
            .min_by_key(|&(_, t)| FloatOrd(t))
            .map(|(ix, _)| ix)
    }

    /// The point `ray` hits first, if any.
    pub fn cast(&self, ray: &Ray) -> Option<usize> {
        let entry = self.intersect_bounding_box(ray)?;
        self.first_hit(ray, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ray(origin: [f64; 3], direction: [f64; 3]) -> Ray {
        Ray::new(origin.into(), direction.into()).unwrap()
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            VoxelGrid::initialize(vec![], 1.0).unwrap_err(),
            GridError::EmptyCloud
        );
        assert_eq!(
            VoxelGrid::initialize(vec![Point3::origin()], 0.0).unwrap_err(),
            GridError::InvalidLeafSize(0.0)
        );
        assert!(matches!(
            VoxelGrid::initialize(vec![Point3::origin()], f64::NAN),
            Err(GridError::InvalidLeafSize(_))
        ));
        assert_eq!(
            VoxelGrid::initialize(vec![Point3::origin(), Point3::new(0.0, f64::INFINITY, 0.0)], 1.0)
                .unwrap_err(),
            GridError::NonFinitePoint(1)
        );
        assert!(matches!(
            VoxelGrid::initialize(vec![Point3::origin(), Point3::new(1e300, 1e300, 1e300)], 1e-300),
            Err(GridError::TooManyCells { .. })
        ));
    }

    #[test]
    fn single_point_grid() {
        let grid = VoxelGrid::initialize(vec![Point3::new(1.0, 2.0, 3.0)], 0.5).unwrap();
        assert_eq!(grid.dims(), [1, 1, 1]);
        let (min, max) = grid.bounds();
        assert_eq!(min, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(max, Point3::new(1.5, 2.5, 3.5));
        assert_eq!(grid.cast(&ray([1.2, 2.2, 0.0], [0.0, 0.0, 1.0])), Some(0));
    }

    #[test]
    fn entry_parameter() {
        let grid =
            VoxelGrid::initialize(vec![Point3::origin(), Point3::new(1.5, 1.5, 1.5)], 1.0).unwrap();
        assert_eq!(grid.bounds().1, Point3::new(2.0, 2.0, 2.0));
        let t = grid
            .intersect_bounding_box(&ray([-3.0, 0.5, 0.5], [1.0, 0.0, 0.0]))
            .unwrap();
        assert_relative_eq!(t, 3.0);
        let inside = grid.intersect_bounding_box(&ray([1.0, 1.0, 1.0], [0.0, 1.0, 0.0]));
        assert_eq!(inside, Some(0.0));
        let behind = grid.intersect_bounding_box(&ray([-3.0, 0.5, 0.5], [-1.0, 0.0, 0.0]));
        assert_eq!(behind, None);
        let beside = grid.intersect_bounding_box(&ray([-3.0, 5.0, 0.5], [1.0, 0.0, 0.0]));
        assert_eq!(beside, None);
    }

    #[test]
    fn walks_past_empty_cells() {
        let grid = VoxelGrid::initialize(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.5, 0.5, 0.5),
                Point3::new(3.2, 0.5, 0.5),
            ],
            1.0,
        )
        .unwrap();
        assert_eq!(grid.dims(), [4, 1, 1]);
        assert_eq!(grid.occupied_cells(), 2);
        // The origin cell only holds a point behind the ray start.
        let hit = grid.cast(&ray([0.5, 0.5, 0.5], [1.0, 0.0, 0.0]));
        assert_eq!(hit, Some(2));
        let hit = grid.cast(&ray([1.5, 0.5, 0.5], [1.0, 0.0, 0.0]));
        assert_eq!(hit, Some(2));
        let hit = grid.cast(&ray([10.0, 0.5, 0.5], [-1.0, 0.0, 0.0]));
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn ray_starting_inside_a_cell() {
        let grid = VoxelGrid::initialize(
            vec![
                Point3::new(0.2, 0.5, 0.5),
                Point3::new(0.8, 0.5, 0.5),
                Point3::new(1.9, 0.5, 0.5),
            ],
            1.0,
        )
        .unwrap();
        let forward = ray([0.5, 0.5, 0.5], [1.0, 0.0, 0.0]);
        assert_eq!(grid.intersect_bounding_box(&forward), Some(0.0));
        assert_eq!(grid.cast(&forward), Some(1));
        assert_eq!(grid.cast(&ray([0.5, 0.5, 0.5], [-1.0, 0.0, 0.0])), Some(0));
        // Only the point behind the origin shares its cell.
        assert_eq!(grid.cast(&ray([1.85, 0.5, 0.5], [-1.0, 0.0, 0.0])), Some(1));
        assert_eq!(grid.cast(&ray([1.95, 0.5, 0.5], [1.0, 0.0, 0.0])), None);
    }

    #[test]
    fn diagonal_walk_leaves_grid() {
        let grid = VoxelGrid::initialize(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.5, 0.5, 0.5), Point3::new(2.5, 2.5, 0.5)],
            1.0,
        )
        .unwrap();
        // Crosses (0, 1), (0, 2), (1, 2) and leaves through the top without touching a point.
        let miss = grid.cast(&ray([0.5, 1.7, 0.5], [1.0, 1.0, 0.0]));
        assert_eq!(miss, None);
        // Crosses (0, 1), (1, 1), (2, 1) and then drops into (2, 0).
        let hit = grid.cast(&ray([0.5, 1.7, 0.5], [1.0, -0.3, 0.0]));
        assert_eq!(hit, Some(1));
    }
}
