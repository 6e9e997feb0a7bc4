//! Shared types: errors, engine configuration and the image type.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so operator crates can name the pipeline's
/// image type without depending on `image` directly.
pub use image::RgbaImage;

/// What the engine does when an operator's transform fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Log the failure, substitute the stage's input as its output and
    /// keep going. An interactive session stays live when a transient
    /// parameter combination is invalid.
    #[default]
    PassThrough,
    /// Abort the current tick with [`TrackpipeError::TransformFailed`].
    Propagate,
}

/// Configuration shared by both engines.
///
/// Every field has a default, so a partial JSON object such as
/// `{"max_ticks": 10}` deserializes into a complete config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key code that cancels the run when returned by the key input.
    pub cancel_key: u32,

    /// Recovery policy for failing transforms.
    pub on_transform_error: FailurePolicy,

    /// Stop after this many running ticks. `None` runs until the cancel
    /// key is pressed or every surface has been closed.
    pub max_ticks: Option<u64>,
}

impl EngineConfig {
    /// Escape.
    pub const DEFAULT_CANCEL_KEY: u32 = 27;

    /// Check the config for values the engine cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::InvalidConfig`] if `cancel_key` is zero
    /// (indistinguishable from "no key") or `max_ticks` is `Some(0)`.
    pub fn validate(&self) -> Result<(), TrackpipeError> {
        if self.cancel_key == 0 {
            return Err(TrackpipeError::InvalidConfig(
                "cancel_key must be non-zero".to_string(),
            ));
        }
        if self.max_ticks == Some(0) {
            return Err(TrackpipeError::InvalidConfig(
                "max_ticks must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cancel_key: Self::DEFAULT_CANCEL_KEY,
            on_transform_error: FailurePolicy::default(),
            max_ticks: None,
        }
    }
}

/// Error returned by an [`Operator`](crate::Operator) when it cannot
/// produce an output for the current parameter values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperatorError {
    /// The operator looked up a parameter it never declared.
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    /// A parameter value is outside what the operator can use.
    #[error("invalid value for parameter `{label}`: {reason}")]
    InvalidParameter {
        /// Label of the offending parameter.
        label: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// The input image has no pixels.
    #[error("input image is empty")]
    EmptyImage,

    /// Any other operator-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Errors raised while building or running an engine.
#[derive(Debug, thiserror::Error)]
pub enum TrackpipeError {
    /// Bare stages and windows were supplied together.
    #[error("cannot mix bare stages and windows in one pipeline")]
    MixedElements,

    /// No stages or windows were supplied.
    #[error("pipeline has no stages")]
    EmptyPipeline,

    /// Two stages in one window declare the same parameter label.
    #[error(
        "param `{label}` is defined twice in window `{window}` in operators `{second}` and \
         `{first}`; rename one of them"
    )]
    DuplicateLabel {
        /// The colliding label.
        label: String,
        /// Name of the window holding both stages.
        window: String,
        /// Operator type that declared the label first.
        first: &'static str,
        /// Operator type that declared it again.
        second: &'static str,
    },

    /// Two windows in one pipeline have the same display name.
    #[error("window `{0}` is defined twice; window names must be unique")]
    DuplicateWindow(String),

    /// Fan-out was given more than one window definition.
    #[error("fan-out needs exactly one window, got {0}")]
    TooManyWindows(usize),

    /// Fan-out was given no images.
    #[error("fan-out needs at least one image")]
    NoImages,

    /// A source image path does not exist.
    #[error("file {} not found", .0.display())]
    MissingImage(PathBuf),

    /// A source image could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A parameter's label is not readable from the control source.
    #[error("control `{label}` is not registered for window `{window}`")]
    MissingControl {
        /// Parameter label.
        label: String,
        /// Control-source identity that was queried.
        window: String,
    },

    /// An operator failed under [`FailurePolicy::Propagate`].
    #[error("operator `{operator}` in window `{window}` failed: {source}")]
    TransformFailed {
        /// Window containing the failing stage.
        window: String,
        /// Operator type name.
        operator: &'static str,
        /// The operator's own error.
        #[source]
        source: OperatorError,
    },

    /// Engine configuration is invalid.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}
