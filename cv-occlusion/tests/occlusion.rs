use cv_occlusion::{Mask, Ray, RayProjector, VoxelGrid};
use cv_shot::{Intrinsics, Pose, Shot, WorldToCamera};
use nalgebra::{Point2, Point3, Vector3};

/// Ten points spread over a 2x2x2 grid of unit cells. Cell (1, 1, 0) is empty.
fn cube() -> Vec<Point3<f64>> {
    vec![
        Point3::new(0.25, 0.25, 0.25),
        Point3::new(1.75, 0.25, 0.25),
        Point3::new(0.25, 1.75, 0.25),
        Point3::new(1.75, 1.75, 1.75),
        Point3::new(0.25, 0.25, 1.75),
        Point3::new(1.75, 0.25, 1.75),
        Point3::new(0.25, 1.75, 1.75),
        Point3::new(1.1, 1.2, 1.3),
        Point3::new(1.2, 1.1, 0.9),
        Point3::new(1.6, 1.6, 1.6),
    ]
}

fn ray(origin: [f64; 3], direction: [f64; 3]) -> Ray {
    Ray::new(origin.into(), direction.into()).unwrap()
}

#[test]
fn cube_first_hits() {
    let grid = VoxelGrid::initialize(cube(), 1.0).unwrap();
    assert_eq!(grid.dims(), [2, 2, 2]);
    assert_eq!(grid.occupied_cells(), 7);

    // Straight through the center of the cube.
    let center = ray([-5.0, -5.0, -5.0], [1.0, 1.0, 1.0]);
    let entry = grid.intersect_bounding_box(&center).unwrap();
    assert!((center.at(entry) - Point3::new(0.25, 0.25, 0.25)).norm() < 1e-9);
    assert_eq!(grid.first_hit(&center, entry), Some(0));

    // Down the column of the empty cell into the nearest point of the cell above it.
    let column = ray([1.5, 1.5, -5.0], [0.0, 0.0, 1.0]);
    assert_eq!(grid.cast(&column), Some(9));

    // From the other side the same column hits the top point first.
    let column = ray([1.5, 1.5, 9.0], [0.0, 0.0, -1.0]);
    assert_eq!(grid.cast(&column), Some(3));

    // Parallel to the column but outside the cube.
    let outside = ray([3.0, 3.0, -5.0], [0.0, 0.0, 1.0]);
    assert_eq!(grid.intersect_bounding_box(&outside), None);
    assert_eq!(grid.cast(&outside), None);
}

/// A wall at `z = 10` partially hidden by a smaller occluder at `z = 5`.
fn scene() -> Vec<Point3<f64>> {
    let square = |half: i32, z: f64| {
        (-half..=half).flat_map(move |x| {
            (-half..=half).map(move |y| Point3::new(x as f64 * 0.1, y as f64 * 0.1, z))
        })
    };
    square(30, 10.0).chain(square(5, 5.0)).collect()
}

fn camera() -> Shot {
    Shot::new(
        WorldToCamera::identity(),
        Intrinsics::identity()
            .focal(20.0)
            .principal_point(Point2::new(5.0, 5.0)),
        [10, 10],
    )
}

#[test]
fn occluder_hides_wall() {
    let _ = pretty_env_logger::try_init();
    let grid = VoxelGrid::initialize(scene(), 0.25).unwrap();
    let projector = RayProjector::new(&grid, 100.0);
    let mask = Mask::from_fn(10, 10, |x, y| (x, y) == (0, 0) || (x, y) == (5, 5));

    let points = projector.project(&mask, &camera());
    assert_eq!(points.len(), 2);
    // Pixel (0, 0) passes beside the occluder and reaches the wall near (-2.5, -2.5).
    assert_eq!(points[0].z, 10.0);
    assert!((points[0].x + 2.5).abs() < 0.5 && (points[0].y + 2.5).abs() < 0.5);
    // The center pixel is stopped by the occluder.
    assert_eq!(points[1].z, 5.0);
    assert!(points[1].x.abs() < 0.5 && points[1].y.abs() < 0.5);
}

#[test]
fn projection_is_deterministic() {
    let grid = VoxelGrid::initialize(scene(), 0.25).unwrap();
    let projector = RayProjector::new(&grid, 100.0);
    let mask = Mask::from_fn(10, 10, |x, y| (x + y) % 3 == 0);
    let first = projector.project_indices(&mask, &camera());
    let second = projector.project_indices(&mask, &camera());
    assert_eq!(first, second);
    assert!(first.len() <= mask.count());
}

#[test]
fn camera_looking_away_projects_nothing() {
    let grid = VoxelGrid::initialize(scene(), 0.25).unwrap();
    let projector = RayProjector::new(&grid, 100.0);
    let turned = Shot::new(
        WorldToCamera::from_parts(
            Vector3::zeros(),
            nalgebra::Rotation3::from_axis_angle(&Vector3::y_axis(), std::f64::consts::PI),
        ),
        *camera().intrinsics(),
        [10, 10],
    );
    let mask = Mask::from_fn(10, 10, |_, _| true);
    assert!(projector.project(&mask, &turned).is_empty());
}
