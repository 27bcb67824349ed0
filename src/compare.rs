//! Pixel comparison between a captured screenshot and its reference.
//!
//! A pixel matches when every RGBA channel differs by less than the tolerance. The diff
//! image keeps matching pixels, faded by the transparency factor, and paints
//! mismatching pixels according to the [`ErrorMode`].

use image::{Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

use crate::harness::types::HarnessResult;

/// Maximum mismatch percentage that still passes
pub const DEFAULT_THRESHOLD: f64 = 0.01;

/// Per-channel difference at which two pixels stop being considered equal
pub const DEFAULT_TOLERANCE: u8 = 16;

/// Alpha factor applied to matching pixels in the diff image
pub const DEFAULT_TRANSPARENCY: f32 = 0.4;

/// How mismatching pixels are painted in the diff image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Solid error colour
    Flat,
    /// Reference pixel blended halfway toward the error colour, so moved
    /// content stays recognisable
    Movement,
}

/// Comparison settings
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub tolerance: u8,
    pub transparency: f32,
    pub error_color: [u8; 4],
    pub error_mode: ErrorMode,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            transparency: DEFAULT_TRANSPARENCY,
            error_color: [255, 0, 255, 255],
            error_mode: ErrorMode::Movement,
        }
    }
}

/// Outcome of comparing two images
#[derive(Debug, Clone)]
pub struct Comparison {
    /// Percentage of mismatching pixels, rounded to two decimals
    pub mismatch_percentage: f64,
    /// Raw count of mismatching pixels
    pub mismatched_pixels: u64,
    /// `(width, height)` of actual minus reference, `(0, 0)` when equal
    pub dimension_difference: (i64, i64),
    /// Visualisation of the differences
    pub diff: RgbaImage,
}

impl Comparison {
    /// Whether the images have the same dimensions
    pub fn same_dimensions(&self) -> bool {
        self.dimension_difference == (0, 0)
    }

    /// Whether the mismatch is within `threshold` percent
    pub fn passes(&self, threshold: f64) -> bool {
        self.mismatch_percentage <= threshold
    }

    /// Encode the diff image as PNG bytes
    pub fn diff_png(&self) -> HarnessResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.diff
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Write the diff image as a PNG file
    pub fn write_diff(&self, path: &Path) -> HarnessResult<()> {
        std::fs::write(path, self.diff_png()?)?;
        Ok(())
    }
}

/// Decode two encoded images and compare them
pub fn compare_png_bytes(
    actual: &[u8],
    reference: &[u8],
    options: &CompareOptions,
) -> HarnessResult<Comparison> {
    let actual = image::load_from_memory(actual)?.to_rgba8();
    let reference = image::load_from_memory(reference)?.to_rgba8();
    Ok(compare_images(&actual, &reference, options))
}

/// Compare two decoded images over the union of their extents
pub fn compare_images(actual: &RgbaImage, reference: &RgbaImage, options: &CompareOptions) -> Comparison {
    let width = actual.width().max(reference.width());
    let height = actual.height().max(reference.height());
    let mut diff = RgbaImage::new(width, height);
    let mut mismatched: u64 = 0;

    for y in 0..height {
        for x in 0..width {
            let a = pixel_at(actual, x, y);
            let r = pixel_at(reference, x, y);
            let out = match (a, r) {
                (Some(a), Some(r)) if is_similar(&a, &r, options.tolerance) => fade(&a, options.transparency),
                (a, r) => {
                    mismatched += 1;
                    let base = r.or(a).unwrap_or(Rgba([0, 0, 0, 0]));
                    error_pixel(&base, options)
                }
            };
            diff.put_pixel(x, y, out);
        }
    }

    let total = u64::from(width) * u64::from(height);
    let mismatch_percentage = if total == 0 {
        0.0
    } else {
        round2(mismatched as f64 / total as f64 * 100.0)
    };

    Comparison {
        mismatch_percentage,
        mismatched_pixels: mismatched,
        dimension_difference: (
            i64::from(actual.width()) - i64::from(reference.width()),
            i64::from(actual.height()) - i64::from(reference.height()),
        ),
        diff,
    }
}

fn pixel_at(img: &RgbaImage, x: u32, y: u32) -> Option<Rgba<u8>> {
    if x < img.width() && y < img.height() {
        Some(*img.get_pixel(x, y))
    } else {
        None
    }
}

fn is_similar(a: &Rgba<u8>, b: &Rgba<u8>, tolerance: u8) -> bool {
    a.0.iter().zip(b.0.iter()).all(|(x, y)| x.abs_diff(*y) < tolerance)
}

fn fade(px: &Rgba<u8>, transparency: f32) -> Rgba<u8> {
    let alpha = (f32::from(px[3]) * transparency).round().clamp(0.0, 255.0) as u8;
    Rgba([px[0], px[1], px[2], alpha])
}

fn error_pixel(base: &Rgba<u8>, options: &CompareOptions) -> Rgba<u8> {
    let [er, eg, eb, ea] = options.error_color;
    match options.error_mode {
        ErrorMode::Flat => Rgba([er, eg, eb, ea]),
        ErrorMode::Movement => {
            let blend = |channel: u8, error: u8| -> u8 {
                let scaled = f32::from(channel) * (f32::from(error) / 255.0);
                ((scaled + f32::from(error)) / 2.0).round() as u8
            };
            Rgba([blend(base[0], er), blend(base[1], eg), blend(base[2], eb), base[3]])
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_identical_images_have_zero_mismatch() {
        let img = solid(40, 30, [10, 20, 30, 255]);
        let cmp = compare_images(&img, &img, &CompareOptions::default());
        assert_eq!(cmp.mismatch_percentage, 0.0);
        assert_eq!(cmp.mismatched_pixels, 0);
        assert!(cmp.same_dimensions());
        assert!(cmp.passes(DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_tolerance_is_exclusive() {
        let a = solid(10, 10, [100, 100, 100, 255]);
        let b = solid(10, 10, [115, 85, 100, 255]);
        let cmp = compare_images(&a, &b, &CompareOptions::default());
        assert_eq!(cmp.mismatched_pixels, 0);

        let c = solid(10, 10, [116, 100, 100, 255]);
        let cmp = compare_images(&a, &c, &CompareOptions::default());
        assert_eq!(cmp.mismatch_percentage, 100.0);
    }

    #[test]
    fn test_single_pixel_in_ten_thousand_is_the_boundary() {
        let reference = solid(100, 100, [0, 0, 0, 255]);
        let mut actual = reference.clone();
        actual.put_pixel(50, 50, Rgba([255, 255, 255, 255]));

        let cmp = compare_images(&actual, &reference, &CompareOptions::default());
        assert_eq!(cmp.mismatch_percentage, 0.01);
        assert!(cmp.passes(DEFAULT_THRESHOLD));

        actual.put_pixel(51, 50, Rgba([255, 255, 255, 255]));
        let cmp = compare_images(&actual, &reference, &CompareOptions::default());
        assert_eq!(cmp.mismatch_percentage, 0.02);
        assert!(!cmp.passes(DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_diff_image_fades_matches_and_marks_errors() {
        let reference = solid(2, 1, [200, 0, 0, 255]);
        let mut actual = reference.clone();
        actual.put_pixel(1, 0, Rgba([0, 0, 200, 255]));

        let cmp = compare_images(&actual, &reference, &CompareOptions::default());
        assert_eq!(*cmp.diff.get_pixel(0, 0), Rgba([200, 0, 0, 102]));
        // movement: (200 * 1 + 255) / 2, (0 * 0 + 0) / 2, (0 * 1 + 255) / 2
        assert_eq!(*cmp.diff.get_pixel(1, 0), Rgba([228, 0, 128, 255]));

        let flat = CompareOptions { error_mode: ErrorMode::Flat, ..Default::default() };
        let cmp = compare_images(&actual, &reference, &flat);
        assert_eq!(*cmp.diff.get_pixel(1, 0), Rgba([255, 0, 255, 255]));
    }

    #[test]
    fn test_size_mismatch_counts_uncovered_pixels() {
        let actual = solid(10, 10, [0, 0, 0, 255]);
        let reference = solid(10, 5, [0, 0, 0, 255]);
        let cmp = compare_images(&actual, &reference, &CompareOptions::default());
        assert_eq!(cmp.dimension_difference, (0, 5));
        assert_eq!(cmp.mismatched_pixels, 50);
        assert_eq!(cmp.mismatch_percentage, 50.0);
        assert_eq!(cmp.diff.dimensions(), (10, 10));
    }

    #[test]
    fn test_compare_png_bytes_and_diff_encoding() {
        let img = solid(8, 8, [1, 2, 3, 255]);
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png).unwrap();

        let cmp = compare_png_bytes(&png, &png, &CompareOptions::default()).unwrap();
        assert_eq!(cmp.mismatch_percentage, 0.0);
        let diff = cmp.diff_png().unwrap();
        assert_eq!(&diff[0..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_compare_png_bytes_rejects_garbage() {
        assert!(compare_png_bytes(b"not a png", b"nor this", &CompareOptions::default()).is_err());
    }
}
