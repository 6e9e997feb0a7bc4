//! Tick outcomes and run statistics.
//!
//! Every engine keeps an [`EngineStats`] tally that callers can read at
//! any time or serialize at the end of a run. The counters make the
//! engine's central promise observable: an unchanged tick performs zero
//! stage applies, and a changed tick redraws only the stale suffix.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Why an engine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The configured cancel key was pressed.
    Cancelled,
    /// Every surface the engine draws to has been closed.
    SurfacesClosed,
    /// [`EngineConfig::max_ticks`](crate::EngineConfig::max_ticks) was
    /// reached.
    TickLimit,
}

/// Result of one engine tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was stale; no stage ran.
    Idle,
    /// Windows `from_window..from_window + windows` were redrawn.
    Redrawn {
        /// Index of the first redrawn window.
        from_window: usize,
        /// Number of windows redrawn.
        windows: usize,
    },
    /// The engine has shut down; further ticks return the same value.
    Terminated(TerminationReason),
}

/// Work done by one window draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawReport {
    /// Stages applied.
    pub applies: usize,
    /// Applies whose operator failed.
    pub failures: usize,
}

/// Running totals for one engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Running ticks (the initial draw is not a tick).
    pub ticks: u64,
    /// Ticks that found nothing stale.
    pub idle_ticks: u64,
    /// Ticks that redrew at least one window.
    pub redraw_ticks: u64,
    /// Window draws, including the initial draw.
    pub window_draws: u64,
    /// Stage applies, including the initial draw.
    pub stage_applies: u64,
    /// Applies whose operator failed.
    pub transform_failures: u64,
}

impl EngineStats {
    /// Fold one window draw into the totals.
    pub fn record_draw(&mut self, report: DrawReport) {
        self.window_draws += 1;
        self.stage_applies += report.applies as u64;
        self.transform_failures += report.failures as u64;
    }

    /// Human-readable multi-line summary.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "ticks:              {}", self.ticks);
        let _ = writeln!(out, "  idle:             {}", self.idle_ticks);
        let _ = writeln!(out, "  redraw:           {}", self.redraw_ticks);
        let _ = writeln!(out, "window draws:       {}", self.window_draws);
        let _ = writeln!(out, "stage applies:      {}", self.stage_applies);
        let _ = write!(out, "transform failures: {}", self.transform_failures);
        out
    }
}
