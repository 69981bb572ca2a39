//! Shared mutable context threaded through every window state handler.
//!
//! `WindowContext` is the blackboard the state functions read from and
//! write to: the pending impact, the countdown, the input being
//! processed and the output commands for the tick source and the
//! sensory alert.

use crate::model::ImpactEvent;

// ---------------------------------------------------------------------------
// Inputs (written by the window façade before each step)
// ---------------------------------------------------------------------------

/// The stimulus handed to `on_update` for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowInput {
    /// Nothing new; re-evaluate only.
    #[default]
    None,
    /// One countdown period elapsed.
    Tick,
    /// Wearer pressed "I'm safe".
    Cancel,
    /// Wearer pressed "Send help now".
    Escalate,
    /// Window closed from outside (navigation away, shutdown).
    Dismiss,
}

// ---------------------------------------------------------------------------
// Output commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// What the tick source and sensory alert should be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowOutputs {
    pub ticker_on: bool,
    pub alert_on: bool,
    /// Set on (re)arm: restart both sources from scratch.
    pub restart: bool,
}

impl WindowOutputs {
    /// Everything stopped.
    pub fn all_off() -> Self {
        Self::default()
    }
}

/// Terminal result of one arming.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    /// Wearer cancelled; the event is discarded.
    Cancelled,
    /// Closed externally; the event is discarded.
    Dismissed,
    /// Countdown reached zero; escalate.
    Expired(ImpactEvent),
    /// Wearer asked for help immediately; escalate.
    Escalated(ImpactEvent),
}

impl WindowOutcome {
    /// The event to dispatch, if this outcome escalates.
    pub fn dispatch_event(&self) -> Option<&ImpactEvent> {
        match self {
            Self::Expired(ev) | Self::Escalated(ev) => Some(ev),
            Self::Cancelled | Self::Dismissed => None,
        }
    }
}

// ---------------------------------------------------------------------------
// WindowContext
// ---------------------------------------------------------------------------

pub struct WindowContext {
    /// Configured window length in ticks.
    pub duration_ticks: u32,
    /// Ticks left before expiry.
    pub remaining: u32,
    /// Impact awaiting a decision.
    pub pending: Option<ImpactEvent>,
    /// Input for the current step.
    pub input: WindowInput,
    /// Commands for the tick source and alert.
    pub outputs: WindowOutputs,
    /// Terminal result, taken exactly once by the façade.
    pub outcome: Option<WindowOutcome>,
    /// Set by the first terminal state entered in this arming.
    pub fired: bool,
}

impl WindowContext {
    pub fn new(duration_ticks: u32) -> Self {
        Self {
            duration_ticks,
            remaining: duration_ticks,
            pending: None,
            input: WindowInput::None,
            outputs: WindowOutputs::all_off(),
            outcome: None,
            fired: false,
        }
    }

    /// Record the terminal outcome unless one already fired.
    ///
    /// Returns `false` when a terminal action already ran for this arming.
    pub fn fire(&mut self, outcome: WindowOutcome) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        self.outcome = Some(outcome);
        true
    }

    /// Stop every source the window owns.
    pub fn teardown(&mut self) {
        self.outputs = WindowOutputs::all_off();
    }
}
