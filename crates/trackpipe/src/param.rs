//! Tunable parameters bound to control-surface slots.
//!
//! An operator type declares its parameters as a list of [`ParamSpec`]
//! templates. Each [`Stage`](crate::Stage) materializes its own
//! [`Param`] from every template, so two stages using the same operator
//! type never share values.

use std::fmt;
use std::sync::Arc;

use crate::frontend::ControlSource;
use crate::types::{OperatorError, TrackpipeError};

/// Mapping from a raw control position to the value an operator sees.
///
/// ```rust
/// # use std::sync::Arc;
/// # use trackpipe::Adjust;
/// let odd: Adjust = Arc::new(|x| if x % 2 == 0 { f64::from(x + 1) } else { f64::from(x) });
/// assert!((odd(4) - 5.0).abs() < f64::EPSILON);
/// ```
pub type Adjust = Arc<dyn Fn(i32) -> f64 + Send + Sync>;

/// Declarative template for one parameter.
///
/// Defaults match a plain 0..=100 slider starting at 1.
#[derive(Clone)]
pub struct ParamSpec {
    label: String,
    min: i32,
    max: i32,
    default: i32,
    adjust: Option<Adjust>,
}

impl ParamSpec {
    /// Default upper bound of the control slot.
    pub const DEFAULT_MAX: i32 = 100;
    /// Default starting position.
    pub const DEFAULT_POSITION: i32 = 1;

    /// Template for a parameter shown as `label` on the control surface.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            min: 0,
            max: Self::DEFAULT_MAX,
            default: Self::DEFAULT_POSITION,
            adjust: None,
        }
    }

    /// Lower bound applied to the computed value (not to the slot).
    #[must_use]
    pub const fn min(mut self, min: i32) -> Self {
        self.min = min;
        self
    }

    /// Highest position of the control slot.
    #[must_use]
    pub const fn max(mut self, max: i32) -> Self {
        self.max = max;
        self
    }

    /// Starting position of the control slot. Values outside `0..=max`
    /// are clamped when the parameter is materialized.
    #[must_use]
    pub const fn default_position(mut self, default: i32) -> Self {
        self.default = default;
        self
    }

    /// Map raw positions through `adjust` before clamping to `min`.
    #[must_use]
    pub fn adjust(mut self, adjust: impl Fn(i32) -> f64 + Send + Sync + 'static) -> Self {
        self.adjust = Some(Arc::new(adjust));
        self
    }

    /// The control-surface label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lower bound of the computed value.
    #[must_use]
    pub const fn min_value(&self) -> i32 {
        self.min
    }

    /// Highest slot position.
    #[must_use]
    pub const fn max_position(&self) -> i32 {
        self.max
    }

    /// Starting slot position, clamped to `0..=max`.
    #[must_use]
    pub fn default_raw(&self) -> i32 {
        self.default.clamp(0, self.max.max(0))
    }

    /// `max(min, adjust(raw))`, or `max(min, raw)` without an adjust.
    ///
    /// A NaN from `adjust` collapses to `min`.
    #[must_use]
    pub fn evaluate(&self, raw: i32) -> f64 {
        let value = self
            .adjust
            .as_ref()
            .map_or_else(|| f64::from(raw), |adjust| adjust(raw));
        value.max(f64::from(self.min))
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("label", &self.label)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("default", &self.default)
            .field("adjust", &self.adjust.is_some())
            .finish()
    }
}

/// A live parameter owned by one stage.
#[derive(Debug, Clone)]
pub struct Param {
    spec: ParamSpec,
    raw: i32,
    value: f64,
    dirty: bool,
}

impl Param {
    /// Materialize a parameter from its template.
    ///
    /// New parameters start dirty so the first draw always runs, whatever
    /// the control surface reports.
    #[must_use]
    pub fn new(spec: ParamSpec) -> Self {
        let raw = spec.default_raw();
        let value = spec.evaluate(raw);
        Self {
            spec,
            raw,
            value,
            dirty: true,
        }
    }

    /// The control-surface label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.spec.label
    }

    /// The template this parameter was built from.
    #[must_use]
    pub const fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    /// Last raw position read from the control source.
    #[must_use]
    pub const fn raw_position(&self) -> i32 {
        self.raw
    }

    /// Current value after adjust and clamping.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Whether the raw position changed since the owning stage last
    /// applied.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Pull the current raw position for this parameter.
    ///
    /// A changed position marks the parameter dirty. An unchanged one
    /// leaves the flag alone: only [`consume`](Self::consume) clears it.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] if `controls` has no
    /// slot for this label under `source`.
    pub fn refresh(
        &mut self,
        controls: &dyn ControlSource,
        source: &str,
    ) -> Result<(), TrackpipeError> {
        let raw = controls
            .read_position(self.label(), source)
            .ok_or_else(|| TrackpipeError::MissingControl {
                label: self.label().to_string(),
                window: source.to_string(),
            })?;
        if raw != self.raw {
            self.dirty = true;
            self.raw = raw;
            self.value = self.spec.evaluate(raw);
        }
        Ok(())
    }

    /// Mark the current value as consumed by the owning stage.
    pub(crate) const fn consume(&mut self) {
        self.dirty = false;
    }
}

/// Read-only view of a stage's parameter values, handed to operators.
#[derive(Debug, Clone, Copy)]
pub struct ParamValues<'a> {
    params: &'a [Param],
}

impl<'a> ParamValues<'a> {
    /// View over `params`.
    #[must_use]
    pub const fn new(params: &'a [Param]) -> Self {
        Self { params }
    }

    /// Value of the parameter labelled `label`, if declared.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.params
            .iter()
            .find(|p| p.label() == label)
            .map(Param::value)
    }

    /// Value of the parameter labelled `label`.
    ///
    /// # Errors
    ///
    /// Returns [`OperatorError::UnknownParameter`] if no such parameter
    /// was declared.
    pub fn value(&self, label: &str) -> Result<f64, OperatorError> {
        self.get(label)
            .ok_or_else(|| OperatorError::UnknownParameter(label.to_string()))
    }

    /// Value rounded to the nearest non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns [`OperatorError::UnknownParameter`] if no such parameter
    /// was declared.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn value_u32(&self, label: &str) -> Result<u32, OperatorError> {
        let value = self.value(label)?;
        Ok(value.round().clamp(0.0, f64::from(u32::MAX)) as u32)
    }
}
