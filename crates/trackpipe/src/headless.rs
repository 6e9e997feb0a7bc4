//! In-memory frontends for tests, scripted runs and batch rendering.
//!
//! [`ControlPanel`] stands in for a trackbar panel, [`RecordingSurface`]
//! for a set of display windows, and [`ScriptedInput`] for the keyboard.
//! Each also exposes the user side of the interaction (moving a slider,
//! closing a window, pressing a key) so a session can be replayed
//! without a display.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::frontend::{ControlSource, KeyInput, Surface};
use crate::types::{RgbaImage, TrackpipeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    position: i32,
    max: i32,
}

/// Control source backed by a map of slider slots.
#[derive(Debug, Default, Clone)]
pub struct ControlPanel {
    windows: HashMap<String, HashMap<String, Slot>>,
}

impl ControlPanel {
    /// Empty panel with no slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a slider the way a user would, clamped to `0..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] if no slot exists for
    /// `label` under `window`.
    pub fn set_position(
        &mut self,
        label: &str,
        window: &str,
        position: i32,
    ) -> Result<(), TrackpipeError> {
        let slot = self
            .windows
            .get_mut(window)
            .and_then(|slots| slots.get_mut(label))
            .ok_or_else(|| TrackpipeError::MissingControl {
                label: label.to_string(),
                window: window.to_string(),
            })?;
        slot.position = position.clamp(0, slot.max.max(0));
        Ok(())
    }

    /// Upper bound of the slot, if registered.
    #[must_use]
    pub fn max_position(&self, label: &str, window: &str) -> Option<i32> {
        self.slot(label, window).map(|s| s.max)
    }

    /// Labels registered under `window`, sorted.
    #[must_use]
    pub fn labels(&self, window: &str) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .windows
            .get(window)
            .map(|slots| slots.keys().map(String::as_str).collect())
            .unwrap_or_default();
        labels.sort_unstable();
        labels
    }

    /// Total number of registered slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.values().map(HashMap::len).sum()
    }

    /// Whether no slot has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, label: &str, window: &str) -> Option<&Slot> {
        self.windows.get(window).and_then(|slots| slots.get(label))
    }
}

impl ControlSource for ControlPanel {
    fn register(&mut self, label: &str, window: &str, initial: i32, max: i32) {
        let slot = Slot {
            position: initial.clamp(0, max.max(0)),
            max,
        };
        self.windows
            .entry(window.to_string())
            .or_default()
            .insert(label.to_string(), slot);
    }

    fn read_position(&self, label: &str, window: &str) -> Option<i32> {
        self.slot(label, window).map(|s| s.position)
    }
}

#[derive(Debug, Clone, Default)]
struct Shown {
    visible: bool,
    image: Option<RgbaImage>,
    shows: usize,
}

/// Surface that keeps the last image shown per identity.
///
/// Closing everything keeps the recorded images, so a batch run can
/// write them out after the engine has shut down.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    surfaces: BTreeMap<String, Shown>,
    released: bool,
}

impl RecordingSurface {
    /// Surface set with nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close one surface, as if the user clicked its close button.
    pub fn close(&mut self, identity: &str) {
        if let Some(shown) = self.surfaces.get_mut(identity) {
            shown.visible = false;
        }
    }

    /// Last image shown under `identity`.
    #[must_use]
    pub fn last_image(&self, identity: &str) -> Option<&RgbaImage> {
        self.surfaces.get(identity).and_then(|s| s.image.as_ref())
    }

    /// How many times an image was shown under `identity`.
    #[must_use]
    pub fn show_count(&self, identity: &str) -> usize {
        self.surfaces.get(identity).map_or(0, |s| s.shows)
    }

    /// Every identity ever opened, sorted.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.surfaces.keys().map(String::as_str)
    }

    /// Whether [`close_all`](Surface::close_all) has been called.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }
}

impl Surface for RecordingSurface {
    fn ensure_open(&mut self, identity: &str) {
        let shown = self.surfaces.entry(identity.to_string()).or_default();
        shown.visible = true;
        self.released = false;
    }

    fn show(&mut self, identity: &str, image: &RgbaImage) {
        let shown = self.surfaces.entry(identity.to_string()).or_default();
        shown.image = Some(image.clone());
        shown.shows += 1;
    }

    fn is_visible(&self, identity: &str) -> bool {
        self.surfaces.get(identity).is_some_and(|s| s.visible)
    }

    fn close_all(&mut self) {
        for shown in self.surfaces.values_mut() {
            shown.visible = false;
        }
        self.released = true;
    }
}

/// Key input fed from a queue; each poll takes at most one key.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    queue: VecDeque<u32>,
}

impl ScriptedInput {
    /// Input with no pending keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a key press for a later poll.
    pub fn press(&mut self, key: u32) {
        self.queue.push_back(key);
    }

    /// Number of presses not yet polled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl KeyInput for ScriptedInput {
    fn poll_key(&mut self) -> Option<u32> {
        self.queue.pop_front()
    }
}
