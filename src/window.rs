//! Confirmation window controller.
//!
//! Thin façade over the [`fsm`](crate::fsm) engine: translates external
//! calls into [`WindowInput`]s, steps the state table, and applies the
//! resulting output commands to the tick source and the sensory alert.
//!
//! ```text
//!  arm(ev) ─┐
//!  tick()  ─┤                ┌──────────────┐   outputs   ┌────────────┐
//!  cancel()─┼─▶ WindowInput ─▶│ Fsm + ctx    │────────────▶│ TickSource │
//!  escalate()                 │ (states.rs)  │             │ HapticPort │
//!  dismiss()┘                 └──────┬───────┘             └────────────┘
//!                                    │ outcome (exactly once)
//!                                    ▼
//!                              take_outcome()
//! ```

use core::time::Duration;

use log::{debug, info};

use crate::app::ports::{HapticPort, TickSource};
use crate::config::{GuardConfig, HapticPattern};
use crate::fsm::context::{WindowContext, WindowInput, WindowOutcome};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::model::ImpactEvent;

pub struct ConfirmationWindow {
    fsm: Fsm,
    ctx: WindowContext,
    tick_period: Duration,
    alert_pattern: HapticPattern,
    /// Whether we last told the haptics port to run.
    alert_running: bool,
    /// Armed, but the alert waits for the impact pulse.
    alert_deferred: bool,
}

impl ConfirmationWindow {
    pub fn new(config: &GuardConfig) -> Self {
        let mut ctx = WindowContext::new(config.countdown_secs);
        let mut fsm = Fsm::new(build_state_table(), StateId::Idle);
        fsm.start(&mut ctx);
        Self {
            fsm,
            ctx,
            tick_period: Duration::from_millis(u64::from(config.tick_interval_ms)),
            alert_pattern: config.alert_pattern_ms.clone(),
            alert_running: false,
            alert_deferred: false,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_armed(&self) -> bool {
        self.state() == StateId::Armed
    }

    /// Countdown ticks left (meaningful while armed).
    pub fn remaining(&self) -> u32 {
        self.ctx.remaining
    }

    pub fn pending_event(&self) -> Option<&ImpactEvent> {
        self.ctx.pending.as_ref()
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Open the window for `event`.  Re-arming an armed window replaces
    /// the pending event and restarts countdown and alert.
    pub fn arm(&mut self, event: ImpactEvent) {
        self.ctx.pending = Some(event);
        self.ctx.outcome = None;
        if self.is_armed() {
            info!("WINDOW: re-armed, countdown reset");
            self.fsm.reenter(&mut self.ctx);
        } else {
            self.fsm.force_transition(StateId::Armed, &mut self.ctx);
        }
    }

    pub fn tick(&mut self) {
        self.feed(WindowInput::Tick);
    }

    pub fn cancel(&mut self) {
        self.feed(WindowInput::Cancel);
    }

    pub fn escalate(&mut self) {
        self.feed(WindowInput::Escalate);
    }

    pub fn dismiss(&mut self) {
        self.feed(WindowInput::Dismiss);
    }

    fn feed(&mut self, input: WindowInput) {
        self.ctx.input = input;
        self.fsm.step(&mut self.ctx);
        self.ctx.input = WindowInput::None;
    }

    /// The terminal result of the current arming.  Yields `Some` at most
    /// once per arming.
    pub fn take_outcome(&mut self) -> Option<WindowOutcome> {
        self.ctx.outcome.take()
    }

    // ── Outputs ───────────────────────────────────────────────

    /// Bring the tick source and alert in line with the window state.
    pub fn apply(
        &mut self,
        ticker: &mut dyn TickSource,
        haptics: Option<&mut (dyn HapticPort + '_)>,
    ) {
        let out = self.ctx.outputs;

        if out.restart {
            ticker.stop();
            ticker.start(self.tick_period);
            debug!("WINDOW: tick source (re)started at {:?}", self.tick_period);
        } else if !out.ticker_on && ticker.is_running() {
            ticker.stop();
            debug!("WINDOW: tick source stopped");
        }

        match haptics {
            Some(h) => {
                if out.restart || (self.alert_deferred && out.alert_on) {
                    h.stop();
                    h.start(&self.alert_pattern, true);
                    self.alert_running = true;
                } else if !out.alert_on && (self.alert_running || self.alert_deferred) {
                    h.stop();
                    self.alert_running = false;
                }
                self.alert_deferred = false;
            }
            None => self.alert_running = out.alert_on,
        }

        self.ctx.outputs.restart = false;
    }

    /// [`apply`](Self::apply) without touching the haptics: a one-shot
    /// pulse already playing is left to finish.  The repeating alert
    /// starts on the next `apply` that carries haptics while still armed,
    /// i.e. at the first tick.
    pub fn apply_deferring_alert(&mut self, ticker: &mut dyn TickSource) {
        let defer = self.ctx.outputs.restart && self.ctx.outputs.alert_on;
        self.apply(ticker, None);
        if defer {
            self.alert_running = false;
            self.alert_deferred = true;
        }
    }
}
