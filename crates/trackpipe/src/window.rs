//! Windows: ordered stages sharing one control source and one output.

use std::collections::HashMap;

use tracing::warn;

use crate::diagnostics::DrawReport;
use crate::frontend::{ControlSource, Surface};
use crate::stage::Stage;
use crate::types::{FailurePolicy, RgbaImage, TrackpipeError};

/// An ordered group of stages drawn to one display surface.
///
/// A window is the unit of recompute: when any of its stages is stale
/// the whole window is redrawn from its first stage.
#[derive(Debug, Clone)]
pub struct Window {
    name: String,
    control_source: String,
    stages: Vec<Stage>,
    last_output: Option<RgbaImage>,
}

impl Window {
    /// A window displayed as `name` that reads its own controls.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::DuplicateLabel`] if two stages declare
    /// a parameter with the same label.
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Result<Self, TrackpipeError> {
        let name = name.into();
        check_duplicate_labels(&name, &stages)?;
        Ok(Self {
            control_source: name.clone(),
            name,
            stages,
            last_output: None,
        })
    }

    /// A window without a display name. The engine it is handed to names
    /// it `Step N` by its position among the unnamed windows.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn unnamed(stages: Vec<Stage>) -> Result<Self, TrackpipeError> {
        Self::new(String::new(), stages)
    }

    /// Read controls from another window's identity instead of this
    /// window's own.
    #[must_use]
    pub fn tracking(mut self, control_source: impl Into<String>) -> Self {
        self.control_source = control_source.into();
        self
    }

    /// Display identity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity the parameters are read from.
    #[must_use]
    pub fn control_source(&self) -> &str {
        &self.control_source
    }

    /// The stages, in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the window has no stages (draws pass the input through).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Image produced by the most recent [`draw`](Self::draw).
    #[must_use]
    pub const fn last_output(&self) -> Option<&RgbaImage> {
        self.last_output.as_ref()
    }

    /// Copy of this window's stage definitions with fresh parameters,
    /// displayed as `name` and reading controls from `control_source`.
    #[must_use]
    pub fn replicate(&self, name: impl Into<String>, control_source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            control_source: control_source.into(),
            stages: self.stages.iter().map(Stage::replicate).collect(),
            last_output: None,
        }
    }

    pub(crate) fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }

    /// Give an unnamed window its display name; a window that was not
    /// told to track another also reads controls under that name.
    pub(crate) fn assign_name(&mut self, name: &str) {
        if self.control_source.is_empty() {
            name.clone_into(&mut self.control_source);
        }
        name.clone_into(&mut self.name);
    }

    /// Display and read controls under `name`.
    pub(crate) fn retarget(&mut self, name: &str) {
        name.clone_into(&mut self.name);
        name.clone_into(&mut self.control_source);
    }

    /// Create a control slot for every parameter under this window's
    /// control source, then confirm each one reads back.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] if the control source
    /// does not expose a slot after registering it.
    pub fn register(&self, controls: &mut dyn ControlSource) -> Result<(), TrackpipeError> {
        for param in self.stages.iter().flat_map(Stage::params) {
            controls.register(
                param.label(),
                &self.control_source,
                param.raw_position(),
                param.spec().max_position(),
            );
        }
        self.verify_controls(controls)
    }

    /// Confirm every parameter is readable from the control source.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] for the first label the
    /// control source does not expose.
    pub fn verify_controls(&self, controls: &dyn ControlSource) -> Result<(), TrackpipeError> {
        match self
            .stages
            .iter()
            .flat_map(Stage::params)
            .find(|p| controls.read_position(p.label(), &self.control_source).is_none())
        {
            Some(param) => Err(TrackpipeError::MissingControl {
                label: param.label().to_string(),
                window: self.control_source.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Pull fresh positions for every stage's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] for an unregistered
    /// label.
    pub fn refresh(&mut self, controls: &dyn ControlSource) -> Result<(), TrackpipeError> {
        let source = &self.control_source;
        self.stages
            .iter_mut()
            .try_for_each(|stage| stage.refresh(controls, source))
    }

    /// Refresh every stage, then return the index of the first dirty
    /// one, or `None` if the window is clean.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] for an unregistered
    /// label.
    pub fn stale_index(
        &mut self,
        controls: &dyn ControlSource,
    ) -> Result<Option<usize>, TrackpipeError> {
        self.refresh(controls)?;
        Ok(self.stages.iter().position(Stage::is_dirty))
    }

    /// Apply every stage from the first, threading outputs, cache the
    /// final image and show it on `surface`.
    ///
    /// A failing stage passes its input through. Under
    /// [`FailurePolicy::PassThrough`] the failure is logged and the draw
    /// continues; under [`FailurePolicy::Propagate`] the draw stops.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::TransformFailed`] under
    /// [`FailurePolicy::Propagate`].
    pub fn draw(
        &mut self,
        input: &RgbaImage,
        surface: &mut dyn Surface,
        policy: FailurePolicy,
    ) -> Result<DrawReport, TrackpipeError> {
        let mut report = DrawReport::default();
        let mut current = input;
        for stage in &mut self.stages {
            report.applies += 1;
            if let Err(err) = stage.apply(current) {
                report.failures += 1;
                match policy {
                    FailurePolicy::PassThrough => warn!(
                        window = %self.name,
                        operator = stage.operator_name(),
                        error = %err,
                        "transform failed, passing input through",
                    ),
                    FailurePolicy::Propagate => {
                        return Err(TrackpipeError::TransformFailed {
                            window: self.name.clone(),
                            operator: stage.operator_name(),
                            source: err,
                        });
                    }
                }
            }
            let stage: &Stage = stage;
            current = stage.last_output().unwrap_or(current);
        }

        let output = current.clone();
        surface.show(&self.name, &output);
        self.last_output = Some(output);
        Ok(report)
    }
}

/// Reject stages that declare the same label twice in one window.
fn check_duplicate_labels(window: &str, stages: &[Stage]) -> Result<(), TrackpipeError> {
    let mut seen: HashMap<&str, &'static str> = HashMap::new();
    for stage in stages {
        for param in stage.params() {
            if let Some(first) = seen.insert(param.label(), stage.operator_name()) {
                return Err(TrackpipeError::DuplicateLabel {
                    label: param.label().to_string(),
                    window: window.to_string(),
                    first,
                    second: stage.operator_name(),
                });
            }
        }
    }
    Ok(())
}
