//! The operator capability supplied by callers.
//!
//! An [`Operator`] is an opaque image transform with declared
//! parameters. The engine never looks inside: it materializes the
//! declared [`ParamSpec`]s, hands their current values back through
//! [`ParamValues`], and threads images through
//! [`transform`](Operator::transform).
//!
//! ```rust
//! use trackpipe::{Operator, OperatorError, ParamSpec, ParamValues, RgbaImage};
//!
//! #[derive(Clone)]
//! struct Brighten;
//!
//! impl Operator for Brighten {
//!     fn params(&self) -> Vec<ParamSpec> {
//!         vec![ParamSpec::new("amount").max(255).default_position(16)]
//!     }
//!
//!     fn transform(
//!         &self,
//!         image: &RgbaImage,
//!         params: &ParamValues<'_>,
//!     ) -> Result<RgbaImage, OperatorError> {
//!         let amount = u8::try_from(params.value_u32("amount")?).unwrap_or(u8::MAX);
//!         let mut out = image.clone();
//!         for px in out.pixels_mut() {
//!             for c in &mut px.0[..3] {
//!                 *c = c.saturating_add(amount);
//!             }
//!         }
//!         Ok(out)
//!     }
//! }
//! ```

use crate::param::{ParamSpec, ParamValues};
use crate::types::{OperatorError, RgbaImage};

/// A caller-supplied image transform with tunable parameters.
///
/// Operators must be `Clone` (via the blanket [`OperatorClone`] impl) so
/// the fan-out engine can give every image its own instance with its own
/// derived state.
pub trait Operator: OperatorClone {
    /// Type name used in error messages and logs.
    ///
    /// Defaults to the last path segment of the Rust type name.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Parameter templates, in control-surface order.
    ///
    /// Must return the same list every time it is called.
    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Recompute operator-private derived values from the current
    /// parameter values. Runs before every [`transform`](Self::transform).
    ///
    /// # Errors
    ///
    /// A failure here is handled exactly like a transform failure.
    fn compute_derived(&mut self, params: &ParamValues<'_>) -> Result<(), OperatorError> {
        let _ = params;
        Ok(())
    }

    /// Produce the output image for `image`.
    ///
    /// # Errors
    ///
    /// Returns an [`OperatorError`] when the current parameter values
    /// cannot be applied to this input.
    fn transform(
        &self,
        image: &RgbaImage,
        params: &ParamValues<'_>,
    ) -> Result<RgbaImage, OperatorError>;
}

/// Object-safe cloning for boxed operators.
///
/// Implemented automatically for every `Operator + Clone`.
pub trait OperatorClone {
    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn Operator>;
}

impl<T: Operator + Clone + 'static> OperatorClone for T {
    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Operator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// `"my_crate::ops::Blur"` -> `"Blur"`.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
