use cv_shot::KeyPoint;
use image::{DynamicImage, GrayImage, Luma};

/// A binary change mask. A pixel is set when its intensity is non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask(pub GrayImage);

impl Mask {
    /// Converts an image of any color type to a mask through its luma channel.
    pub fn from_image(image: DynamicImage) -> Self {
        Self(image.into_luma8())
    }

    /// Creates a `cols` by `rows` mask from a predicate over `(x, y)` pixel positions.
    pub fn from_fn(cols: u32, rows: u32, mut set: impl FnMut(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(cols, rows, |x, y| {
            Luma([if set(x, y) { u8::MAX } else { 0 }])
        }))
    }

    pub fn rows(&self) -> u32 {
        self.0.height()
    }

    pub fn cols(&self) -> u32 {
        self.0.width()
    }

    /// Checks the pixel at column `x` and row `y`. Pixels outside the mask are never set.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.cols() && y < self.rows() && self.0.get_pixel(x, y).0[0] > 0
    }

    /// The `(x, y)` position of every set pixel, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel.0[0] > 0)
            .map(|(x, y, _)| (x, y))
    }

    /// The keypoints of every set pixel, row by row, with `x` the column and `y` the row.
    pub fn points(&self) -> Vec<KeyPoint> {
        self.pixels()
            .map(|(x, y)| KeyPoint::from_pixel(x, y))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.pixels().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn points_are_row_major() {
        let mask = Mask::from_fn(4, 3, |x, y| (x, y) == (3, 0) || (x, y) == (1, 2) || x == y);
        let points: Vec<(f64, f64)> = mask.points().iter().map(|kp| (kp.x, kp.y)).collect();
        assert_eq!(
            points,
            vec![(0.0, 0.0), (3.0, 0.0), (1.0, 1.0), (1.0, 2.0), (2.0, 2.0)]
        );
        assert_eq!(mask.count(), 5);
    }

    #[test]
    fn color_masks_use_luma() {
        let mut image = RgbImage::new(2, 2);
        image.put_pixel(1, 0, Rgb([0, 0, 255]));
        let mask = Mask::from_image(DynamicImage::ImageRgb8(image));
        assert_eq!((mask.cols(), mask.rows()), (2, 2));
        assert!(mask.is_set(1, 0));
        assert!(!mask.is_set(0, 0));
        assert!(!mask.is_set(5, 0));
    }
}
