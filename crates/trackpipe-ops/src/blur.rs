//! Gaussian blur with kernel-size and sigma controls.
//!
//! Blurring goes through [`imageproc::filter::gaussian_blur_f32`], which
//! only accepts single-channel images and derives its kernel extent from
//! sigma. The RGBA image is therefore split into four channels, each is
//! blurred, and the result is reassembled. The `size` control matters
//! when `Sigma` is zero: sigma is then derived from the kernel size the
//! way OpenCV does it.

use image::GrayImage;
use trackpipe::{Operator, OperatorError, ParamSpec, ParamValues, RgbaImage};

use crate::adjust::make_odd;

/// Gaussian blur controlled by `size` (0..=100, forced odd) and `Sigma`
/// (0..=10).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GaussianBlur;

impl GaussianBlur {
    /// Label of the kernel size control.
    pub const SIZE: &'static str = "size";
    /// Label of the sigma control.
    pub const SIGMA: &'static str = "Sigma";
}

impl Operator for GaussianBlur {
    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new(Self::SIZE).max(100).adjust(make_odd),
            ParamSpec::new(Self::SIGMA).max(10),
        ]
    }

    #[allow(clippy::cast_possible_truncation)]
    fn transform(
        &self,
        image: &RgbaImage,
        params: &ParamValues<'_>,
    ) -> Result<RgbaImage, OperatorError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OperatorError::EmptyImage);
        }
        let size = params.value(Self::SIZE)?;
        let sigma = params.value(Self::SIGMA)?;
        Ok(gaussian_blur_rgba(image, effective_sigma(size, sigma) as f32))
    }
}

/// `sigma` when positive, otherwise the sigma OpenCV derives for a kernel
/// of `size` pixels.
#[must_use]
pub fn effective_sigma(size: f64, sigma: f64) -> f64 {
    if sigma > 0.0 {
        sigma
    } else {
        0.3f64.mul_add((size - 1.0).mul_add(0.5, -1.0), 0.8)
    }
}

/// Blur each RGBA channel independently.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc` panics on `sigma <= 0.0`.
#[must_use = "returns the blurred RGBA image"]
pub fn gaussian_blur_rgba(image: &RgbaImage, sigma: f32) -> RgbaImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    let (w, h) = image.dimensions();
    let channels: [GrayImage; 4] = std::array::from_fn(|c| {
        GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]))
    });
    let blurred: [GrayImage; 4] =
        std::array::from_fn(|c| imageproc::filter::gaussian_blur_f32(&channels[c], sigma));

    RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba(std::array::from_fn(|c| blurred[c].get_pixel(x, y).0[0]))
    })
}
