use image::Rgba;
use trackpipe::{Operator, OperatorError, ParamValues, RgbaImage};

/// Produces an opaque black image, ignoring its input.
///
/// Has no parameters, so it only runs in the initial draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
}

impl Canvas {
    /// A canvas of the given size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Operator for Canvas {
    fn transform(
        &self,
        _image: &RgbaImage,
        _params: &ParamValues<'_>,
    ) -> Result<RgbaImage, OperatorError> {
        Ok(RgbaImage::from_pixel(
            self.width,
            self.height,
            Rgba([0, 0, 0, 255]),
        ))
    }
}
