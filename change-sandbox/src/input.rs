use crate::Error;
use cv_occlusion::{ImageFeature, Mask, PointCorrespondence};
use cv_pointclouds::{read_ply, PlyMesh};
use cv_shot::Shot;
use nalgebra::{Matrix3, Vector3};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A bundle camera as stored in the camera JSON files.
///
/// `rotation` is row-major and together with `translation` maps world points into camera space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub rotation: [[f64; 3]; 3],
    pub translation: [f64; 3],
    pub focal: f64,
    pub width: u32,
    pub height: u32,
}

impl CameraRecord {
    pub fn shot(&self) -> Shot {
        Shot::from_bundle(
            Matrix3::from_fn(|r, c| self.rotation[r][c]),
            Vector3::from(self.translation),
            self.focal,
            [self.width, self.height],
        )
    }
}

/// The features of one image and the reconstructed points they correspond to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureFile {
    pub features: Vec<ImageFeature>,
    pub correspondences: Vec<PointCorrespondence>,
}

pub fn open(path: &Path) -> Result<BufReader<File>, Error> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })
}

pub fn create(path: &Path) -> Result<BufWriter<File>, Error> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    serde_json::from_reader(open(path)?).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })
}

pub fn write_json(path: &Path, value: &impl Serialize) -> Result<(), Error> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })?;
    writer.flush().map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })
}

pub fn read_mesh(path: &Path) -> Result<PlyMesh, Error> {
    read_ply(open(path)?).map_err(|source| Error::Ply {
        path: path.to_owned(),
        source,
    })
}

pub fn read_mask(path: &Path) -> Result<Mask, Error> {
    let image = image::open(path).map_err(|source| Error::Image {
        path: path.to_owned(),
        source,
    })?;
    Ok(Mask::from_image(image))
}

pub fn read_shots(path: &Path) -> Result<Vec<Shot>, Error> {
    let cameras: Vec<CameraRecord> = read_json(path)?;
    Ok(cameras.iter().map(CameraRecord::shot).collect())
}

/// Picks a shot by its index in the camera file.
pub fn shot(shots: &[Shot], index: usize) -> Result<Shot, Error> {
    shots.get(index).copied().ok_or(Error::MissingCamera {
        index,
        count: shots.len(),
    })
}
