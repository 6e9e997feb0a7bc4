//! An operator that yields a fixed, pre-loaded image.

use std::path::Path;
use std::sync::Arc;

use trackpipe::{Operator, OperatorError, ParamValues, RgbaImage, TrackpipeError};

/// Yields the image it was built with, ignoring its input.
///
/// The pixels are shared between clones, so replicating a window that
/// starts with a `LoadImage` does not copy the image.
#[derive(Debug, Clone)]
pub struct LoadImage {
    image: Arc<RgbaImage>,
}

impl LoadImage {
    /// Decode the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingImage`] if `path` does not exist
    /// and [`TrackpipeError::ImageDecode`] if it cannot be decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TrackpipeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TrackpipeError::MissingImage(path.to_path_buf()));
        }
        let image = image::open(path)?.to_rgba8();
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "loaded image"
        );
        Ok(Self::from_image(image))
    }

    /// Wrap an image already in memory.
    #[must_use]
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// The image this operator yields.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl Operator for LoadImage {
    fn transform(
        &self,
        _image: &RgbaImage,
        _params: &ParamValues<'_>,
    ) -> Result<RgbaImage, OperatorError> {
        Ok(RgbaImage::clone(&self.image))
    }
}
