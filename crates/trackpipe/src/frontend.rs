//! Interfaces to the outside world: control surface, rendering surface
//! and key input.
//!
//! The engine reads control positions, pushes images to surfaces and
//! polls for a cancel key. It never writes control positions back;
//! registration is the only mutation it performs on a control source.

use crate::types::RgbaImage;

/// Source of integer control positions, keyed by parameter label and
/// window identity.
pub trait ControlSource {
    /// Create a slot for `label` under `window`, starting at `initial`
    /// and ranging over `0..=max`.
    fn register(&mut self, label: &str, window: &str, initial: i32, max: i32);

    /// Current position of the slot, or `None` if it was never
    /// registered.
    fn read_position(&self, label: &str, window: &str) -> Option<i32>;
}

/// Display sink for window images, keyed by display identity.
pub trait Surface {
    /// Create the surface for `identity` if it does not exist yet.
    fn ensure_open(&mut self, identity: &str);

    /// Replace the image displayed for `identity`.
    fn show(&mut self, identity: &str, image: &RgbaImage);

    /// Whether the surface for `identity` is still open and visible.
    fn is_visible(&self, identity: &str) -> bool;

    /// Release every surface.
    fn close_all(&mut self);
}

/// Per-tick key poll. This is the loop's only suspension point: an
/// interactive implementation may wait a few milliseconds for input.
pub trait KeyInput {
    /// The key pressed since the last poll, if any.
    fn poll_key(&mut self) -> Option<u32>;
}

/// The three collaborators an engine talks to during a tick.
pub struct Frontend<'a> {
    /// Where parameter positions are read from.
    pub controls: &'a mut dyn ControlSource,
    /// Where window images are shown.
    pub surface: &'a mut dyn Surface,
    /// Where the cancel key comes from.
    pub input: &'a mut dyn KeyInput,
}

impl<'a> Frontend<'a> {
    /// Bundle the collaborators for one or more ticks.
    pub fn new(
        controls: &'a mut dyn ControlSource,
        surface: &'a mut dyn Surface,
        input: &'a mut dyn KeyInput,
    ) -> Self {
        Self {
            controls,
            surface,
            input,
        }
    }
}
