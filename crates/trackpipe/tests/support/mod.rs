//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use trackpipe::headless::{ControlPanel, RecordingSurface, ScriptedInput};
use trackpipe::{Frontend, Operator, OperatorError, ParamSpec, ParamValues, RgbaImage};

/// Log of `(operator id, param value, input red channel)` per apply.
pub type ApplyLog = Rc<RefCell<Vec<(&'static str, u32, u8)>>>;

/// Adds its single parameter to the red channel and records every call.
#[derive(Clone)]
pub struct Probe {
    pub id: &'static str,
    pub label: &'static str,
    pub max: i32,
    pub default: i32,
    pub log: ApplyLog,
}

impl Probe {
    pub fn new(id: &'static str, label: &'static str, max: i32, default: i32, log: &ApplyLog) -> Self {
        Self {
            id,
            label,
            max,
            default,
            log: Rc::clone(log),
        }
    }
}

impl Operator for Probe {
    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new(self.label)
                .max(self.max)
                .default_position(self.default),
        ]
    }

    #[allow(clippy::cast_possible_truncation)]
    fn transform(
        &self,
        image: &RgbaImage,
        params: &ParamValues<'_>,
    ) -> Result<RgbaImage, OperatorError> {
        let amount = params.value_u32(self.label)?;
        let red_in = image.pixels().next().map_or(0, |p| p.0[0]);
        self.log.borrow_mut().push((self.id, amount, red_in));

        let mut out = image.clone();
        for px in out.pixels_mut() {
            px.0[0] = px.0[0].saturating_add(amount.min(255) as u8);
        }
        Ok(out)
    }
}

/// Fails whenever its `fail` parameter is non-zero.
#[derive(Clone)]
pub struct Flaky;

impl Operator for Flaky {
    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("fail").max(1).default_position(0)]
    }

    fn transform(
        &self,
        image: &RgbaImage,
        params: &ParamValues<'_>,
    ) -> Result<RgbaImage, OperatorError> {
        if params.value_u32("fail")? == 0 {
            Ok(image.clone())
        } else {
            Err(OperatorError::InvalidParameter {
                label: "fail".to_string(),
                reason: "set to fail".to_string(),
            })
        }
    }
}

/// Route engine logs to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn new_log() -> ApplyLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn applies(log: &ApplyLog) -> Vec<&'static str> {
    log.borrow().iter().map(|(id, _, _)| *id).collect()
}

pub fn gray(width: u32, height: u32, level: u8) -> RgbaImage {
    RgbaImage::from_pixel(width, height, image::Rgba([level, level, level, 255]))
}

/// Owns the headless collaborators and lends them out as a [`Frontend`].
#[derive(Default)]
pub struct Harness {
    pub controls: ControlPanel,
    pub surface: RecordingSurface,
    pub input: ScriptedInput,
}

impl Harness {
    pub fn frontend(&mut self) -> Frontend<'_> {
        Frontend::new(&mut self.controls, &mut self.surface, &mut self.input)
    }
}
