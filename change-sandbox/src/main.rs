mod error;
mod input;
mod settings;

use error::Error;
use settings::ChangeSettings;

use cv_neighbors::{match_neighbors, read_image_list, PairListWriter, RegistrationService};
use cv_occlusion::{project_correspondences, triangulate_mask, RayProjector, VoxelGrid};
use cv_pointclouds::{export, export_change_points};
use cv_visibility::{Mesh, PointIndex, ReferenceCloud, Visibility, VisibilityResolver};
use log::*;
use nalgebra::{Matrix3, Point3};
use serde::Serialize;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(StructOpt, Clone)]
#[structopt(
    name = "change-sandbox",
    about = "A tool for projecting image change masks onto reconstructed scenes"
)]
struct Opt {
    /// The file where settings are specified.
    ///
    /// This is in the format of `ChangeSettings`. Missing fields take their default values and
    /// command line options override the file.
    #[structopt(short, long, default_value = "change-settings.json")]
    settings: PathBuf,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt, Clone)]
enum Command {
    /// Resolves the images that observe each vertex of a mesh.
    Visibility {
        /// PLY mesh of the scene
        mesh: PathBuf,
        /// JSON reference cloud with the images that observed each point
        reference: PathBuf,
        /// JSON camera list, indexed by image id, to count neighborhood projections
        #[structopt(long)]
        cameras: Option<PathBuf>,
        /// Number of nearest reference points that vote
        #[structopt(long)]
        knn: Option<usize>,
        /// Number of candidate images kept per vertex
        #[structopt(long)]
        candidates: Option<usize>,
        /// Neighborhood radius in multiples of the mean edge length
        #[structopt(long)]
        radius_multiplier: Option<f64>,
        /// Output JSON report with one entry per vertex
        #[structopt(short, long)]
        output: PathBuf,
    },
    /// Casts the pixels of a change mask into a point cloud and keeps the first points hit.
    Project {
        /// PLY point cloud of the scene
        cloud: PathBuf,
        /// JSON camera list
        cameras: PathBuf,
        /// Index of the camera the mask was detected in
        camera: usize,
        /// Change mask image, nonzero pixels are changed
        mask: PathBuf,
        /// Edge length of a voxel
        #[structopt(long)]
        leaf_size: Option<f64>,
        /// Depth pixels are unprojected to when building rays
        #[structopt(long)]
        unproject_depth: Option<f64>,
        /// Output PLY file of change points
        #[structopt(short, long)]
        output: PathBuf,
    },
    /// Collects the reconstructed points whose image features lie inside a change mask.
    Correspondences {
        /// JSON file with the features of the image and the points they correspond to
        features: PathBuf,
        /// Change mask image, nonzero pixels are changed
        mask: PathBuf,
        /// Output PLY file of colored change points
        #[structopt(short, long)]
        output: PathBuf,
    },
    /// Triangulates a change mask from two cameras related by a homography.
    Triangulate {
        /// JSON camera list
        cameras: PathBuf,
        /// Index of the camera the mask was detected in
        first: usize,
        /// Index of the second camera
        second: usize,
        /// JSON row-major 3x3 homography from the first image to the second
        homography: PathBuf,
        /// Change mask image, nonzero pixels are changed
        mask: PathBuf,
        /// Output PLY file of change points
        #[structopt(short, long)]
        output: PathBuf,
    },
    /// Picks the registered neighbors of new images from a match report.
    Neighbors {
        /// File listing one new image per line
        new_images: PathBuf,
        /// Match report
        matches: PathBuf,
        /// Number of neighbors kept per new image
        #[structopt(short = "k", long)]
        nearest_neighbors: Option<usize>,
        /// Output file with one `new neighbor` pair per line
        #[structopt(short, long)]
        output: PathBuf,
    },
}

/// One line of the visibility report.
#[derive(Serialize)]
struct VertexReport<'a> {
    vertex: usize,
    #[serde(flatten)]
    visibility: &'a Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    projections: Option<usize>,
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    let settings = std::fs::File::open(&opt.settings)
        .ok()
        .and_then(|file| serde_json::from_reader(file).ok());
    if settings.is_some() {
        info!("loaded existing settings");
    } else {
        info!("used default settings");
    }
    let settings: ChangeSettings = settings.unwrap_or_default();

    if let Err(e) = run(opt.command, settings) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Command, mut settings: ChangeSettings) -> Result<(), Error> {
    match command {
        Command::Visibility {
            mesh,
            reference,
            cameras,
            knn,
            candidates,
            radius_multiplier,
            output,
        } => {
            settings.knn_reference_points = knn.unwrap_or(settings.knn_reference_points);
            settings.candidate_images = candidates.unwrap_or(settings.candidate_images);
            settings.radius_multiplier = radius_multiplier.unwrap_or(settings.radius_multiplier);
            visibility(&mesh, &reference, cameras.as_deref(), &output, settings)
        }
        Command::Project {
            cloud,
            cameras,
            camera,
            mask,
            leaf_size,
            unproject_depth,
            output,
        } => {
            settings.leaf_size = leaf_size.unwrap_or(settings.leaf_size);
            settings.unproject_depth = unproject_depth.unwrap_or(settings.unproject_depth);
            let cloud = input::read_mesh(&cloud)?;
            let shot = input::shot(&input::read_shots(&cameras)?, camera)?;
            let mask = input::read_mask(&mask)?;
            let grid = VoxelGrid::initialize(cloud.vertices, settings.leaf_size)?;
            let points =
                RayProjector::new(&grid, settings.unproject_depth).project(&mask, &shot);
            write_change_points(&output, points)
        }
        Command::Correspondences {
            features,
            mask,
            output,
        } => {
            let features: input::FeatureFile = input::read_json(&features)?;
            let mask = input::read_mask(&mask)?;
            let found =
                project_correspondences(&mask, &features.features, &features.correspondences);
            info!(
                "{} of {} reconstructed points lie in the mask",
                found.points.len(),
                features.correspondences.len()
            );
            let writer = input::create(&output)?;
            export(writer, found.points.iter().map(|c| (c.point, c.color))).map_err(|source| {
                Error::Io {
                    path: output.clone(),
                    source,
                }
            })
        }
        Command::Triangulate {
            cameras,
            first,
            second,
            homography,
            mask,
            output,
        } => {
            let shots = input::read_shots(&cameras)?;
            let (first, second) = (input::shot(&shots, first)?, input::shot(&shots, second)?);
            let homography: [[f64; 3]; 3] = input::read_json(&homography)?;
            let homography = Matrix3::from_fn(|r, c| homography[r][c]);
            let mask = input::read_mask(&mask)?;
            let points = triangulate_mask(&mask, &first, &second, &homography);
            write_change_points(&output, points)
        }
        Command::Neighbors {
            new_images,
            matches,
            nearest_neighbors,
            output,
        } => {
            let k = nearest_neighbors.unwrap_or(settings.nearest_neighbors);
            let images = read_image_list(input::open(&new_images)?).map_err(|source| {
                Error::Io {
                    path: new_images.clone(),
                    source,
                }
            })?;
            let rankings = match_neighbors(images, input::open(&matches)?, k).map_err(
                |source| Error::Match {
                    path: matches.clone(),
                    source,
                },
            )?;
            for ranking in rankings.iter().filter(|r| r.is_empty()) {
                warn!("found no registered neighbor for {}", ranking.image());
            }
            PairListWriter::new(input::create(&output)?, k)
                .register_images(&rankings)
                .map_err(|source| Error::Io {
                    path: output.clone(),
                    source,
                })?;
            Ok(())
        }
    }
}

fn visibility(
    mesh: &Path,
    reference: &Path,
    cameras: Option<&Path>,
    output: &Path,
    settings: ChangeSettings,
) -> Result<(), Error> {
    let mesh = input::read_mesh(mesh)?;
    let mesh = Mesh::new(mesh.vertices, mesh.faces)?;
    let reference: ReferenceCloud = input::read_json(reference)?;
    info!(
        "loaded mesh with {} vertices and reference cloud with {} points",
        mesh.vertices().len(),
        reference.len()
    );

    let reference_index = PointIndex::new(reference.points());
    let mesh_index = PointIndex::new(mesh.vertices());
    let resolver = VisibilityResolver::new(
        &reference,
        &reference_index,
        &mesh,
        &mesh_index,
        settings.visibility(),
    );
    let visibilities = resolver.resolve_all(mesh.vertices());
    let unobserved = visibilities.iter().filter(|v| v.is_unobserved()).count();
    if unobserved > 0 {
        warn!("{} vertices are observed by no image", unobserved);
    }

    let shots = cameras.map(input::read_shots).transpose()?;
    let report: Vec<VertexReport> = visibilities
        .iter()
        .enumerate()
        .map(|(vertex, visibility)| VertexReport {
            vertex,
            visibility,
            projections: shots
                .as_ref()
                .map(|shots| visibility.project_neighborhood(shots, mesh.vertices()).len()),
        })
        .collect();
    input::write_json(output, &report)
}

fn write_change_points(output: &Path, points: Vec<Point3<f64>>) -> Result<(), Error> {
    info!("exporting {} change points to {}", points.len(), output.display());
    export_change_points(input::create(output)?, points).map_err(|source| Error::Io {
        path: output.to_owned(),
        source,
    })
}
