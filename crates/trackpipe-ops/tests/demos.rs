//! The bundled operators driven through real engines, headless.

#![allow(clippy::unwrap_used)]

use trackpipe::headless::{ControlPanel, RecordingSurface, ScriptedInput};
use trackpipe::{
    Engine, EngineConfig, FanOut, Frontend, Pipeline, RgbaImage, SourceImage, Stage, TickOutcome,
    Window,
};
use trackpipe_ops::{Canny, Canvas, DrawLine, GaussianBlur, LoadImage};

#[derive(Default)]
struct Harness {
    controls: ControlPanel,
    surface: RecordingSurface,
    input: ScriptedInput,
}

impl Harness {
    fn frontend(&mut self) -> Frontend<'_> {
        Frontend::new(&mut self.controls, &mut self.surface, &mut self.input)
    }
}

fn checkerboard(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    })
}

#[test]
fn line_demo_redraws_when_the_angle_moves() {
    let mut pipeline = Pipeline::new(
        [
            Stage::new(Canvas::new(64, 48)).into(),
            Stage::new(DrawLine::new()).into(),
        ],
        None,
        EngineConfig::default(),
    )
    .unwrap();
    let mut h = Harness::default();

    pipeline.tick(&mut h.frontend()).unwrap();
    let first = h.surface.last_image("Step 1").unwrap().clone();
    assert_eq!(first.dimensions(), (64, 48));
    assert_eq!(first.get_pixel(32, 24).0, [255, 0, 0, 255]);

    h.controls.set_position("theta", "Step 1", 45).unwrap();
    assert!(matches!(
        pipeline.tick(&mut h.frontend()).unwrap(),
        TickOutcome::Redrawn { .. }
    ));
    let second = h.surface.last_image("Step 1").unwrap();
    assert_ne!(&first, second);
    // Pointing left now: a pixel left of the centre is red.
    assert_eq!(second.get_pixel(22, 24).0, [255, 0, 0, 255]);
}

#[test]
fn blur_demo_only_redraws_the_second_window() {
    let windows = [
        Window::unnamed(vec![
            Stage::new(LoadImage::from_image(checkerboard(16))),
            Stage::new(GaussianBlur),
        ])
        .unwrap(),
        Window::unnamed(vec![Stage::new(GaussianBlur)]).unwrap(),
    ];
    let mut pipeline =
        Pipeline::new(windows.map(Into::into), None, EngineConfig::default()).unwrap();
    let mut h = Harness::default();
    pipeline.tick(&mut h.frontend()).unwrap();

    h.controls.set_position("Sigma", "Step 2", 4).unwrap();
    let outcome = pipeline.tick(&mut h.frontend()).unwrap();
    assert_eq!(
        outcome,
        TickOutcome::Redrawn {
            from_window: 1,
            windows: 1
        }
    );
    assert_eq!(h.surface.show_count("Step 1"), 1);
    assert_eq!(h.surface.show_count("Step 2"), 2);
}

#[test]
fn canny_fans_out_over_images() {
    let images = vec![
        SourceImage::new("board", checkerboard(24)),
        SourceImage::new("flat", RgbaImage::from_pixel(24, 24, image::Rgba([90, 90, 90, 255]))),
    ];
    let mut fan = FanOut::new([Stage::new(Canny).into()], images, EngineConfig::default()).unwrap();
    let mut h = Harness::default();
    fan.tick(&mut h.frontend()).unwrap();

    let board = h.surface.last_image("board").unwrap();
    let flat = h.surface.last_image("flat").unwrap();
    assert!(board.pixels().any(|p| p.0[0] == 255));
    assert!(flat.pixels().all(|p| p.0[0] == 0));

    h.controls.set_position("high", "board", 255).unwrap();
    assert_eq!(
        fan.tick(&mut h.frontend()).unwrap(),
        TickOutcome::Redrawn {
            from_window: 0,
            windows: 2
        }
    );
}
