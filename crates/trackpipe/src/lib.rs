//! trackpipe: incremental execution engine for interactive image pipelines.
//!
//! A pipeline is an ordered list of [`Window`]s, each an ordered list of
//! [`Stage`]s, each wrapping one caller-supplied [`Operator`]. Every
//! operator declares tunable [`Param`]s that are bound to slots on an
//! external control surface. Each tick the engine pulls fresh control
//! positions, finds the first stale window and redraws only the suffix
//! of the chain starting there, feeding it the cached output of the
//! window before it.
//!
//! Two engines are provided:
//!
//! - [`Pipeline`]: the linear engine with suffix recompute.
//! - [`FanOut`]: one window definition replicated over several images,
//!   all driven by the controls of the first (master) image.
//!
//! The crate performs no image processing and owns no display. The
//! control surface, rendering surface and key input are reached through
//! the traits in [`frontend`]; in-memory implementations live in
//! [`headless`].

pub mod diagnostics;
pub mod engine;
pub mod frontend;
pub mod headless;
pub mod operator;
pub mod parallel;
pub mod param;
pub mod pipeline;
pub mod stage;
pub mod types;
pub mod window;

pub use diagnostics::{DrawReport, EngineStats, TerminationReason, TickOutcome};
pub use engine::Engine;
pub use frontend::{ControlSource, Frontend, KeyInput, Surface};
pub use operator::Operator;
pub use parallel::{FanOut, SourceImage, load_images};
pub use param::{Adjust, Param, ParamSpec, ParamValues};
pub use pipeline::{Element, Pipeline};
pub use stage::Stage;
pub use types::{EngineConfig, FailurePolicy, OperatorError, RgbaImage, TrackpipeError};
pub use window::Window;
