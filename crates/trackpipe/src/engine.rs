//! The tick-driven engine interface and the lifecycle both engines share.

use tracing::info;

use crate::diagnostics::{EngineStats, TerminationReason, TickOutcome};
use crate::frontend::Frontend;
use crate::types::{EngineConfig, TrackpipeError};

/// A poll-driven pipeline engine.
///
/// Engines move through `Initializing → Running → Terminated`. The first
/// [`tick`](Self::tick) registers every parameter with the control
/// source, opens the surfaces and performs the initial full draw. Every
/// later tick polls for cancellation, refreshes parameters and redraws
/// whatever went stale.
pub trait Engine {
    /// Advance the engine by one tick.
    ///
    /// Once terminated, every further call returns the same
    /// [`TickOutcome::Terminated`] without touching the frontend.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::MissingControl`] if a parameter cannot be
    /// read back from the control source, or
    /// [`TrackpipeError::TransformFailed`] under
    /// [`FailurePolicy::Propagate`](crate::FailurePolicy::Propagate).
    fn tick(&mut self, frontend: &mut Frontend<'_>) -> Result<TickOutcome, TrackpipeError>;

    /// Totals accumulated so far.
    fn stats(&self) -> &EngineStats;

    /// Tick until the engine terminates.
    ///
    /// Surfaces are released on every exit path, including errors.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`tick`](Self::tick).
    fn run(&mut self, frontend: &mut Frontend<'_>) -> Result<TerminationReason, TrackpipeError> {
        loop {
            match self.tick(frontend) {
                Ok(TickOutcome::Terminated(reason)) => return Ok(reason),
                Ok(TickOutcome::Idle | TickOutcome::Redrawn { .. }) => {}
                Err(err) => {
                    frontend.surface.close_all();
                    return Err(err);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Initializing,
    Running,
    Terminated(TerminationReason),
}

/// Config, phase and counters shared by [`Pipeline`](crate::Pipeline)
/// and [`FanOut`](crate::FanOut).
#[derive(Debug)]
pub(crate) struct Lifecycle {
    pub(crate) config: EngineConfig,
    pub(crate) phase: Phase,
    pub(crate) stats: EngineStats,
}

impl Lifecycle {
    pub(crate) fn new(config: EngineConfig) -> Result<Self, TrackpipeError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: Phase::Initializing,
            stats: EngineStats::default(),
        })
    }

    /// Start-of-tick checks: tick limit, cancel key, closed surfaces.
    ///
    /// Counts the tick only when the engine keeps running.
    pub(crate) fn poll<'n>(
        &mut self,
        frontend: &mut Frontend<'_>,
        mut identities: impl Iterator<Item = &'n str>,
    ) -> Option<TerminationReason> {
        if self
            .config
            .max_ticks
            .is_some_and(|limit| self.stats.ticks >= limit)
        {
            return Some(TerminationReason::TickLimit);
        }
        if frontend.input.poll_key() == Some(self.config.cancel_key) {
            return Some(TerminationReason::Cancelled);
        }
        if !identities.any(|identity| frontend.surface.is_visible(identity)) {
            return Some(TerminationReason::SurfacesClosed);
        }
        self.stats.ticks += 1;
        None
    }

    pub(crate) fn terminate(
        &mut self,
        frontend: &mut Frontend<'_>,
        reason: TerminationReason,
    ) -> TickOutcome {
        frontend.surface.close_all();
        self.phase = Phase::Terminated(reason);
        info!(
            ?reason,
            ticks = self.stats.ticks,
            stage_applies = self.stats.stage_applies,
            "engine terminated"
        );
        TickOutcome::Terminated(reason)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frontend::Surface;
    use crate::headless::{ControlPanel, RecordingSurface, ScriptedInput};

    fn lifecycle(max_ticks: Option<u64>) -> Lifecycle {
        Lifecycle::new(EngineConfig {
            max_ticks,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            cancel_key: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Lifecycle::new(config),
            Err(TrackpipeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn poll_counts_running_ticks() {
        let mut life = lifecycle(None);
        let mut controls = ControlPanel::new();
        let mut surface = RecordingSurface::new();
        let mut input = ScriptedInput::new();
        surface.ensure_open("w");
        let mut frontend = Frontend::new(&mut controls, &mut surface, &mut input);

        assert_eq!(life.poll(&mut frontend, ["w"].into_iter()), None);
        assert_eq!(life.poll(&mut frontend, ["w"].into_iter()), None);
        assert_eq!(life.stats.ticks, 2);
    }

    #[test]
    fn poll_stops_at_tick_limit() {
        let mut life = lifecycle(Some(1));
        let mut controls = ControlPanel::new();
        let mut surface = RecordingSurface::new();
        let mut input = ScriptedInput::new();
        surface.ensure_open("w");
        let mut frontend = Frontend::new(&mut controls, &mut surface, &mut input);

        assert_eq!(life.poll(&mut frontend, ["w"].into_iter()), None);
        assert_eq!(
            life.poll(&mut frontend, ["w"].into_iter()),
            Some(TerminationReason::TickLimit)
        );
        assert_eq!(life.stats.ticks, 1);
    }

    #[test]
    fn cancel_key_wins_over_other_keys() {
        let mut life = lifecycle(None);
        let mut controls = ControlPanel::new();
        let mut surface = RecordingSurface::new();
        let mut input = ScriptedInput::new();
        input.press(32);
        input.press(EngineConfig::DEFAULT_CANCEL_KEY);
        surface.ensure_open("w");
        let mut frontend = Frontend::new(&mut controls, &mut surface, &mut input);

        assert_eq!(life.poll(&mut frontend, ["w"].into_iter()), None);
        assert_eq!(
            life.poll(&mut frontend, ["w"].into_iter()),
            Some(TerminationReason::Cancelled)
        );
    }

    #[test]
    fn all_surfaces_closed_terminates() {
        let mut life = lifecycle(None);
        let mut controls = ControlPanel::new();
        let mut surface = RecordingSurface::new();
        let mut input = ScriptedInput::new();
        surface.ensure_open("a");
        surface.ensure_open("b");
        surface.close("a");
        let mut frontend = Frontend::new(&mut controls, &mut surface, &mut input);

        assert_eq!(life.poll(&mut frontend, ["a", "b"].into_iter()), None);
        frontend.surface.close_all();
        assert_eq!(
            life.poll(&mut frontend, ["a", "b"].into_iter()),
            Some(TerminationReason::SurfacesClosed)
        );
    }

    #[test]
    fn terminate_releases_surfaces() {
        let mut life = lifecycle(None);
        let mut controls = ControlPanel::new();
        let mut surface = RecordingSurface::new();
        let mut input = ScriptedInput::new();
        surface.ensure_open("w");
        {
            let mut frontend = Frontend::new(&mut controls, &mut surface, &mut input);
            let outcome = life.terminate(&mut frontend, TerminationReason::Cancelled);
            assert_eq!(
                outcome,
                TickOutcome::Terminated(TerminationReason::Cancelled)
            );
        }
        assert!(surface.is_released());
        assert_eq!(life.phase, Phase::Terminated(TerminationReason::Cancelled));
    }
}
