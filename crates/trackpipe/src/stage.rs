//! A single operator instance with its own parameters and cached output.

use crate::frontend::ControlSource;
use crate::operator::Operator;
use crate::param::{Param, ParamValues};
use crate::types::{OperatorError, RgbaImage, TrackpipeError};

/// One operator at one position in a [`Window`](crate::Window).
///
/// The stage exclusively owns the operator and the parameters
/// materialized from its templates.
#[derive(Clone)]
pub struct Stage {
    operator: Box<dyn Operator>,
    params: Vec<Param>,
    last_output: Option<RgbaImage>,
}

impl Stage {
    /// Wrap `operator`, materializing a fresh [`Param`] per template.
    #[must_use]
    pub fn new(operator: impl Operator + 'static) -> Self {
        Self::from_boxed(Box::new(operator))
    }

    /// Wrap an already boxed operator.
    #[must_use]
    pub fn from_boxed(operator: Box<dyn Operator>) -> Self {
        let params = operator.params().into_iter().map(Param::new).collect();
        Self {
            operator,
            params,
            last_output: None,
        }
    }

    /// A new stage with a cloned operator and parameters rebuilt from
    /// its templates (dirty, at their defaults, no cached output).
    #[must_use]
    pub fn replicate(&self) -> Self {
        Self::from_boxed(self.operator.clone())
    }

    /// Type name of the wrapped operator.
    #[must_use]
    pub fn operator_name(&self) -> &'static str {
        self.operator.name()
    }

    /// The stage's parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// The parameter labelled `label`, if any.
    #[must_use]
    pub fn param(&self, label: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.label() == label)
    }

    /// Whether any parameter changed since the last [`apply`](Self::apply).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.params.iter().any(Param::is_dirty)
    }

    /// Image produced by the most recent [`apply`](Self::apply).
    #[must_use]
    pub const fn last_output(&self) -> Option<&RgbaImage> {
        self.last_output.as_ref()
    }

    /// Pull fresh raw positions for every parameter from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] for the first parameter
    /// whose label `controls` does not expose.
    pub fn refresh(
        &mut self,
        controls: &dyn ControlSource,
        source: &str,
    ) -> Result<(), TrackpipeError> {
        self.params
            .iter_mut()
            .try_for_each(|p| p.refresh(controls, source))
    }

    /// Recompute derived values, run the transform and consume every
    /// parameter.
    ///
    /// On failure the input is stored as this stage's output so the
    /// caller can pass it downstream; the error is returned for the
    /// caller's failure policy to decide on. Parameters are consumed
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns the operator's error from
    /// [`compute_derived`](Operator::compute_derived) or
    /// [`transform`](Operator::transform).
    pub fn apply(&mut self, input: &RgbaImage) -> Result<(), OperatorError> {
        let values = ParamValues::new(&self.params);
        let result = self
            .operator
            .compute_derived(&values)
            .and_then(|()| self.operator.transform(input, &values));

        for param in &mut self.params {
            param.consume();
        }

        match result {
            Ok(output) => {
                self.last_output = Some(output);
                Ok(())
            }
            Err(err) => {
                self.last_output = Some(input.clone());
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("operator", &self.operator_name())
            .field("params", &self.params)
            .field("has_output", &self.last_output.is_some())
            .finish()
    }
}
