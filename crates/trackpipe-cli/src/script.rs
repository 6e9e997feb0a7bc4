//! Scripted user input: control moves and key presses scheduled by tick.
//!
//! Tick 0 is the engine's initializing call, which registers the
//! controls, so scheduled events start at tick 1.
//!
//! ```json
//! {
//!   "moves": [{ "tick": 2, "window": "Step 1", "label": "theta", "position": 45 }],
//!   "keys": [{ "tick": 5, "key": 27 }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use trackpipe::TrackpipeError;
use trackpipe::headless::{ControlPanel, ScriptedInput};

use crate::error::CliError;

/// Move the slider `label` of `window` to `position` before `tick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlMove {
    pub tick: u64,
    pub window: String,
    pub label: String,
    pub position: i32,
}

/// Press `key` before `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyPress {
    pub tick: u64,
    pub key: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub moves: Vec<ControlMove>,
    #[serde(default)]
    pub keys: Vec<KeyPress>,
}

impl Script {
    /// Parse and validate a JSON script.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Json`] for malformed JSON and
    /// [`CliError::InvalidScript`] for events scheduled at tick 0.
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        let script: Self = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    /// Read and parse a script file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), CliError> {
        let mut ticks = self
            .moves
            .iter()
            .map(|m| m.tick)
            .chain(self.keys.iter().map(|k| k.tick));
        if ticks.any(|tick| tick == 0) {
            return Err(CliError::InvalidScript(
                "events cannot be scheduled at tick 0; controls are registered then".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply every event scheduled for `tick`, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] for a move naming a
    /// slider the engine never registered.
    pub fn apply(
        &self,
        tick: u64,
        controls: &mut ControlPanel,
        input: &mut ScriptedInput,
    ) -> Result<(), TrackpipeError> {
        for m in self.moves.iter().filter(|m| m.tick == tick) {
            tracing::debug!(tick, window = %m.window, label = %m.label, position = m.position, "move");
            controls.set_position(&m.label, &m.window, m.position)?;
        }
        for k in self.keys.iter().filter(|k| k.tick == tick) {
            tracing::debug!(tick, key = k.key, "key press");
            input.press(k.key);
        }
        Ok(())
    }
}
