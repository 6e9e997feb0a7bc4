//! A red line drawn from the image centre, controlled in polar form.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use trackpipe::{Operator, OperatorError, ParamSpec, ParamValues, RgbaImage};

use crate::adjust::quarter_steps_to_radians;

/// Draws a red line from the centre of the input to a point given by
/// `rho` (length, 0..=300) and `theta` (angle, 0..=90 mapped onto a full
/// turn), `thickness` pixels wide (3..=10).
///
/// The endpoint offset is derived once per apply in
/// [`compute_derived`](Operator::compute_derived).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawLine {
    offset: (i32, i32),
}

impl DrawLine {
    /// Label of the length control.
    pub const RHO: &'static str = "rho";
    /// Label of the angle control.
    pub const THETA: &'static str = "theta";
    /// Label of the width control.
    pub const THICKNESS: &'static str = "thickness";

    /// Line drawer with no offset derived yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { offset: (0, 0) }
    }

    /// Endpoint offset from the centre, as of the last derive.
    #[must_use]
    pub const fn offset(&self) -> (i32, i32) {
        self.offset
    }
}

impl Operator for DrawLine {
    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new(Self::RHO).max(300).default_position(100),
            ParamSpec::new(Self::THETA)
                .max(90)
                .adjust(quarter_steps_to_radians),
            ParamSpec::new(Self::THICKNESS)
                .min(3)
                .max(10)
                .default_position(5),
        ]
    }

    #[allow(clippy::cast_possible_truncation)]
    fn compute_derived(&mut self, params: &ParamValues<'_>) -> Result<(), OperatorError> {
        let rho = params.value(Self::RHO)?;
        let theta = params.value(Self::THETA)?;
        self.offset = (
            (theta.cos() * rho).trunc() as i32,
            (theta.sin() * rho).trunc() as i32,
        );
        Ok(())
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn transform(
        &self,
        image: &RgbaImage,
        params: &ParamValues<'_>,
    ) -> Result<RgbaImage, OperatorError> {
        let (width, height) = image.dimensions();
        let Some(mut pixmap) = Pixmap::new(width, height) else {
            return Err(OperatorError::EmptyImage);
        };

        // Pixel centres sit at half-integer coordinates.
        let cx = (width / 2) as f32 + 0.5;
        let cy = (height / 2) as f32 + 0.5;
        let mut pb = PathBuilder::new();
        pb.move_to(cx, cy);
        pb.line_to(cx + self.offset.0 as f32, cy + self.offset.1 as f32);
        let Some(path) = pb.finish() else {
            return Ok(image.clone());
        };

        let stroke = Stroke {
            width: params.value(Self::THICKNESS)? as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 0, 0, 255);
        paint.anti_alias = true;
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

        Ok(composite_over(&pixmap, image))
    }
}

/// Source-over composite of a premultiplied pixmap onto a straight-alpha
/// image of the same size.
#[allow(clippy::cast_possible_truncation)]
fn composite_over(overlay: &Pixmap, base: &RgbaImage) -> RgbaImage {
    let mut out = base.clone();
    for (pixel, src) in out.pixels_mut().zip(overlay.data().chunks_exact(4)) {
        let sa = u32::from(src[3]);
        if sa == 0 {
            continue;
        }
        let da = u32::from(pixel.0[3]);
        let keep = 255 - sa;
        let out_a = sa + da * keep / 255;
        for c in 0..3 {
            let dst_premul = u32::from(pixel.0[c]) * da / 255;
            let premul = u32::from(src[c]) + dst_premul * keep / 255;
            pixel.0[c] = (premul * 255 / out_a).min(255) as u8;
        }
        pixel.0[3] = out_a.min(255) as u8;
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use trackpipe::Param;

    use super::*;

    fn params(rho: i32, theta: i32, thickness: i32) -> Vec<Param> {
        DrawLine::new()
            .params()
            .into_iter()
            .zip([rho, theta, thickness])
            .map(|(spec, raw)| Param::new(spec.default_position(raw)))
            .collect()
    }

    fn black(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn defaults_match_the_classic_demo() {
        let specs = DrawLine::new().params();
        let summary: Vec<_> = specs
            .iter()
            .map(|s| (s.label().to_string(), s.min_value(), s.max_position(), s.default_raw()))
            .collect();
        assert_eq!(
            summary,
            [
                ("rho".to_string(), 0, 300, 100),
                ("theta".to_string(), 0, 90, 1),
                ("thickness".to_string(), 3, 10, 5),
            ]
        );
    }

    #[test]
    fn derived_offset_follows_polar_controls() {
        let mut op = DrawLine::new();

        let p = params(100, 0, 5);
        op.compute_derived(&ParamValues::new(&p)).unwrap();
        assert_eq!(op.offset(), (100, 0));

        let p = params(100, 45, 5);
        op.compute_derived(&ParamValues::new(&p)).unwrap();
        assert_eq!(op.offset(), (-100, 0));

        let p = params(50, 1, 5);
        op.compute_derived(&ParamValues::new(&p)).unwrap();
        assert_eq!(op.offset(), (49, 3));
    }

    #[test]
    fn draws_red_from_the_centre_and_leaves_the_rest() {
        let mut op = DrawLine::new();
        let p = params(20, 0, 5);
        let values = ParamValues::new(&p);
        op.compute_derived(&values).unwrap();
        let out = op.transform(&black(64, 48), &values).unwrap();

        assert_eq!(out.get_pixel(32, 24).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(42, 24).0, [255, 0, 0, 255]);
        // Behind the centre and far off the line stay black.
        assert_eq!(out.get_pixel(20, 24).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn thickness_below_min_is_clamped() {
        let p = params(10, 0, 0);
        let values = ParamValues::new(&p);
        assert!((values.value("thickness").unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_input_is_an_error() {
        let p = params(10, 0, 5);
        let err = DrawLine::new()
            .transform(&RgbaImage::new(0, 0), &ParamValues::new(&p))
            .unwrap_err();
        assert_eq!(err, OperatorError::EmptyImage);
    }

    #[test]
    fn composite_respects_transparent_base() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        let out = composite_over(&pixmap, &RgbaImage::new(1, 1));
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
