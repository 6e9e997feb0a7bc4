//! The linear engine: windows chained in declared order with suffix
//! recompute.

use std::collections::HashSet;

use tracing::{debug, info, trace};

use crate::diagnostics::{EngineStats, TickOutcome};
use crate::engine::{Engine, Lifecycle, Phase};
use crate::frontend::{Frontend, Surface};
use crate::stage::Stage;
use crate::types::{EngineConfig, RgbaImage, TrackpipeError};
use crate::window::Window;

/// One item of caller input to an engine: a bare stage or a whole window.
///
/// An engine accepts either only bare stages, which it wraps into one
/// implicit window, or only windows. Mixing the two is rejected.
#[derive(Debug, Clone)]
pub enum Element {
    /// A stage to be wrapped into the implicit window.
    Stage(Stage),
    /// An explicit window.
    Window(Window),
}

impl From<Stage> for Element {
    fn from(stage: Stage) -> Self {
        Self::Stage(stage)
    }
}

impl From<Window> for Element {
    fn from(window: Window) -> Self {
        Self::Window(window)
    }
}

/// Issues `Step N` names to unnamed windows, one sequence per engine.
///
/// Names already taken by explicitly named windows are skipped.
#[derive(Debug, Default)]
struct StepNames {
    issued: usize,
    taken: HashSet<String>,
}

impl StepNames {
    fn next_name(&mut self) -> String {
        loop {
            self.issued += 1;
            let name = format!("Step {}", self.issued);
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}

/// Normalize caller input into a window sequence.
pub(crate) fn collect_windows(
    elements: impl IntoIterator<Item = Element>,
) -> Result<Vec<Window>, TrackpipeError> {
    let mut stages = Vec::new();
    let mut windows = Vec::new();
    for element in elements {
        match element {
            Element::Stage(stage) => stages.push(stage),
            Element::Window(window) => windows.push(window),
        }
    }

    let mut names = StepNames::default();
    match (stages.is_empty(), windows.is_empty()) {
        (true, true) => Err(TrackpipeError::EmptyPipeline),
        (false, false) => Err(TrackpipeError::MixedElements),
        (false, true) => Ok(vec![Window::new(names.next_name(), stages)?]),
        (true, false) => {
            for window in windows.iter().filter(|w| !w.is_unnamed()) {
                if !names.taken.insert(window.name().to_string()) {
                    return Err(TrackpipeError::DuplicateWindow(window.name().to_string()));
                }
            }
            for window in windows.iter_mut().filter(|w| w.is_unnamed()) {
                window.assign_name(&names.next_name());
            }
            Ok(windows)
        }
    }
}

/// Linear pipeline engine.
///
/// Each running tick refreshes every window, finds the lowest stale
/// window `k` and redraws windows `k..` in order. Window `k` is fed the
/// source image when `k == 0` and the cached output of window `k - 1`
/// otherwise; windows before `k` are left alone.
///
/// ```rust
/// use trackpipe::headless::{ControlPanel, RecordingSurface, ScriptedInput};
/// use trackpipe::{
///     Engine, EngineConfig, Frontend, Operator, OperatorError, ParamValues, Pipeline,
///     RgbaImage, Stage, TickOutcome,
/// };
///
/// #[derive(Clone)]
/// struct Identity;
///
/// impl Operator for Identity {
///     fn transform(
///         &self,
///         image: &RgbaImage,
///         _params: &ParamValues<'_>,
///     ) -> Result<RgbaImage, OperatorError> {
///         Ok(image.clone())
///     }
/// }
///
/// let mut pipeline = Pipeline::new(
///     [Stage::new(Identity).into()],
///     Some(RgbaImage::new(4, 4)),
///     EngineConfig::default(),
/// )
/// .unwrap();
///
/// let (mut controls, mut surface, mut input) =
///     (ControlPanel::new(), RecordingSurface::new(), ScriptedInput::new());
/// let mut frontend = Frontend::new(&mut controls, &mut surface, &mut input);
///
/// let first = pipeline.tick(&mut frontend).unwrap();
/// assert_eq!(first, TickOutcome::Redrawn { from_window: 0, windows: 1 });
/// assert_eq!(pipeline.tick(&mut frontend).unwrap(), TickOutcome::Idle);
/// ```
#[derive(Debug)]
pub struct Pipeline {
    windows: Vec<Window>,
    source: Option<RgbaImage>,
    lifecycle: Lifecycle,
}

impl Pipeline {
    /// Build a pipeline over `elements`, fed from `source`.
    ///
    /// Without a source the first window receives an empty (0×0) image;
    /// its first operator is expected to generate one.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::EmptyPipeline`] for no elements,
    /// [`TrackpipeError::MixedElements`] for stages mixed with windows,
    /// [`TrackpipeError::DuplicateWindow`] for two windows with one name,
    /// [`TrackpipeError::DuplicateLabel`] if the implicit window repeats
    /// a label, and [`TrackpipeError::InvalidConfig`] for a bad config.
    pub fn new(
        elements: impl IntoIterator<Item = Element>,
        source: Option<RgbaImage>,
        config: EngineConfig,
    ) -> Result<Self, TrackpipeError> {
        let lifecycle = Lifecycle::new(config)?;
        let windows = collect_windows(elements)?;
        Ok(Self {
            windows,
            source,
            lifecycle,
        })
    }

    /// The windows, in execution order.
    #[must_use]
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// The window displayed as `name`, if any.
    #[must_use]
    pub fn window(&self, name: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.name() == name)
    }

    /// The image fed to the first window.
    #[must_use]
    pub const fn source(&self) -> Option<&RgbaImage> {
        self.source.as_ref()
    }

    /// The configuration the pipeline was built with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.lifecycle.config
    }

    /// Whether the pipeline has shut down.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.lifecycle.phase, Phase::Terminated(_))
    }

    fn initialize(&mut self, frontend: &mut Frontend<'_>) -> Result<TickOutcome, TrackpipeError> {
        for window in &self.windows {
            window.register(&mut *frontend.controls)?;
        }
        for window in &self.windows {
            frontend.surface.ensure_open(window.name());
        }
        info!(
            windows = self.windows.len(),
            stages = self.windows.iter().map(Window::len).sum::<usize>(),
            "pipeline started"
        );

        self.redraw_from(0, &mut *frontend.surface)?;
        self.lifecycle.phase = Phase::Running;
        Ok(TickOutcome::Redrawn {
            from_window: 0,
            windows: self.windows.len(),
        })
    }

    fn step(&mut self, frontend: &mut Frontend<'_>) -> Result<TickOutcome, TrackpipeError> {
        if let Some(reason) = self
            .lifecycle
            .poll(frontend, self.windows.iter().map(Window::name))
        {
            return Ok(self.lifecycle.terminate(frontend, reason));
        }

        // Every window refreshes every tick, even after the first stale one.
        let mut offset = None;
        for (index, window) in self.windows.iter_mut().enumerate() {
            let stale = window.stale_index(&*frontend.controls)?;
            if offset.is_none() && stale.is_some() {
                offset = Some(index);
            }
        }

        let Some(offset) = offset else {
            self.lifecycle.stats.idle_ticks += 1;
            trace!(tick = self.lifecycle.stats.ticks, "nothing stale");
            return Ok(TickOutcome::Idle);
        };

        let windows = self.windows.len() - offset;
        debug!(
            tick = self.lifecycle.stats.ticks,
            from_window = offset,
            windows,
            "redrawing stale suffix"
        );
        self.redraw_from(offset, &mut *frontend.surface)?;
        self.lifecycle.stats.redraw_ticks += 1;
        Ok(TickOutcome::Redrawn {
            from_window: offset,
            windows,
        })
    }

    /// Draw windows `offset..` in order, chaining outputs.
    fn redraw_from(
        &mut self,
        offset: usize,
        surface: &mut dyn Surface,
    ) -> Result<(), TrackpipeError> {
        let policy = self.lifecycle.config.on_transform_error;
        let empty = RgbaImage::new(0, 0);
        let (done, todo) = self.windows.split_at_mut(offset);

        let mut current = match done.last() {
            Some(previous) => previous.last_output(),
            None => self.source.as_ref(),
        }
        .unwrap_or(&empty);

        for window in todo {
            let report = window.draw(current, surface, policy)?;
            self.lifecycle.stats.record_draw(report);
            let window: &Window = window;
            current = window.last_output().unwrap_or(current);
        }
        Ok(())
    }
}

impl Engine for Pipeline {
    fn tick(&mut self, frontend: &mut Frontend<'_>) -> Result<TickOutcome, TrackpipeError> {
        match self.lifecycle.phase {
            Phase::Initializing => self.initialize(frontend),
            Phase::Running => self.step(frontend),
            Phase::Terminated(reason) => Ok(TickOutcome::Terminated(reason)),
        }
    }

    fn stats(&self) -> &EngineStats {
        &self.lifecycle.stats
    }
}
