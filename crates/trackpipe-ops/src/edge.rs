//! Canny edge detection on the luminance of an RGBA image.

use image::{Rgba, imageops};
use trackpipe::{Operator, OperatorError, ParamSpec, ParamValues, RgbaImage};

/// Minimum allowed Canny threshold.
///
/// A zero low threshold marks every pixel with any gradient as a
/// candidate edge.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Binary edge map: opaque white on edges, opaque black elsewhere.
///
/// Controls `low` and `high` (both 0..=255) are the hysteresis
/// thresholds. Both are clamped to at least [`MIN_THRESHOLD`] and `low`
/// is clamped to at most `high`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Canny;

impl Canny {
    /// Label of the low threshold control.
    pub const LOW: &'static str = "low";
    /// Label of the high threshold control.
    pub const HIGH: &'static str = "high";
}

impl Operator for Canny {
    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new(Self::LOW).max(255).default_position(50),
            ParamSpec::new(Self::HIGH).max(255).default_position(150),
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
        let high = (params.value(Self::HIGH)? as f32).max(MIN_THRESHOLD);
        let low = (params.value(Self::LOW)? as f32)
            .max(MIN_THRESHOLD)
            .min(high);

        let gray = imageops::grayscale(image);
        let edges = imageproc::edges::canny(&gray, low, high);
        Ok(RgbaImage::from_fn(edges.width(), edges.height(), |x, y| {
            let v = edges.get_pixel(x, y).0[0];
            Rgba([v, v, v, 255])
        }))
    }
}
