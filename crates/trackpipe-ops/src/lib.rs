//! Operators for trackpipe pipelines.
//!
//! - [`Canvas`]: a blank black image of fixed size.
//! - [`LoadImage`]: a pre-loaded image, ignoring its input.
//! - [`GaussianBlur`]: kernel `size` and `Sigma` controls.
//! - [`DrawLine`]: a red line from the image centre, polar controls.
//! - [`Canny`]: binary edge map with `low` / `high` thresholds.
//!
//! The [`adjust`] module holds the value mappings these operators use
//! for their controls.

pub mod adjust;
pub mod blur;
pub mod canvas;
pub mod edge;
pub mod line;
pub mod load;

pub use blur::GaussianBlur;
pub use canvas::Canvas;
pub use edge::Canny;
pub use line::DrawLine;
pub use load::LoadImage;
