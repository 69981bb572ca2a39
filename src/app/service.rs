//! Application service: the hexagonal core.
//!
//! [`GuardService`] owns the link manager, the confirmation window and
//! the dispatch orchestrator.  It exposes a clean, platform-agnostic API.
//! All I/O flows through the [`Platform`] bundle injected at call sites,
//! making the entire service testable with mock adapters.
//!
//! ```text
//!  RadioPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  TickSource ─▶ │         GuardService          │
//!                │ Link · Window · Dispatch      │
//!  HapticPort ◀─ └──────────────────────────────┘ ──▶ Store / Phone
//! ```
//!
//! Single-threaded and event-driven: [`poll`](GuardService::poll) drains
//! the inbound queue, then crash frames, then elapsed ticks; commands
//! from the UI act immediately.

use core::time::Duration;

use log::{debug, info, warn};

use crate::config::GuardConfig;
use crate::dispatch::Dispatcher;
use crate::error::LinkError;
use crate::events::{Event, EventQueue};
use crate::fsm::StateId;
use crate::fsm::context::WindowOutcome;
use crate::link::{LinkManager, LinkState};
use crate::model::{DispatchResult, ImpactEvent};
use crate::window::ConfirmationWindow;

use super::commands::AppCommand;
use super::events::{AppEvent, status};
use super::ports::{EventSink, Platform};

// ───────────────────────────────────────────────────────────────
// GuardService
// ───────────────────────────────────────────────────────────────

pub struct GuardService {
    config: GuardConfig,
    link: LinkManager,
    window: ConfirmationWindow,
    dispatcher: Dispatcher,
    queue: EventQueue,
    dispatching: bool,
    dispatch_count: u32,
    last_result: Option<DispatchResult>,
}

impl GuardService {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            link: LinkManager::new(&config),
            window: ConfirmationWindow::new(&config),
            dispatcher: Dispatcher::new(&config),
            queue: EventQueue::new(),
            dispatching: false,
            dispatch_count: 0,
            last_result: None,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        let demo_mode = self.link.is_demo_mode();
        sink.emit(&AppEvent::Started { demo_mode });
        if demo_mode {
            sink.emit(&AppEvent::Status(status::DEMO));
        }
        info!(
            "GuardService started ({}s window, demo {})",
            self.config.countdown_secs, demo_mode
        );
    }

    /// Close any open window without dispatching and drop the link.
    pub fn shutdown(&mut self, p: &mut Platform<'_>, sink: &mut impl EventSink) {
        if self.window.is_armed() {
            self.window.dismiss();
            // A dismissal never dispatches.
            let _ = self.settle(p, sink);
        }
        p.ticker.stop();
        if let Some(h) = p.haptics.as_deref_mut() {
            h.stop();
        }
        let from = self.link.state();
        self.link.disconnect(&mut *p.radio);
        self.emit_link_change(from, sink);
        self.queue.take_matching(|_| true);
        info!("GuardService shut down");
    }

    // ── Per-poll orchestration ────────────────────────────────

    /// Move submitted events, crash frames and elapsed ticks through the
    /// controller, in that order.
    ///
    /// Crash frames and ticks bypass the bounded queue: a flood of frames
    /// must not crowd out the countdown, and every elapsed period counts.
    ///
    /// Returns the dispatch summary when a window escalated during this poll.
    pub fn poll(
        &mut self,
        p: &mut Platform<'_>,
        sink: &mut impl EventSink,
    ) -> Option<DispatchResult> {
        let mut result = None;
        while let Some(ev) = self.queue.pop() {
            if let Some(r) = self.process(ev, p, sink) {
                result = Some(r);
            }
        }

        let now = p.clock.now_ms();
        for ev in self.link.poll(&mut *p.radio, now) {
            self.on_impact(ev, p, sink);
        }

        let due = p.ticker.take_due();
        for _ in 0..due {
            if !self.window.is_armed() {
                break;
            }
            if let Some(r) = self.process(Event::Tick, p, sink) {
                result = Some(r);
            }
        }
        result
    }

    /// Enqueue an event from an external producer; handled on the next
    /// [`poll`](Self::poll).  Returns `false` if the queue is full.
    pub fn submit(&mut self, event: Event) -> bool {
        self.queue.push(event)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Window commands act immediately.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        p: &mut Platform<'_>,
        sink: &mut impl EventSink,
    ) -> Option<DispatchResult> {
        match cmd {
            AppCommand::StartScan { timeout } => {
                self.start_scan(timeout, p, sink);
                None
            }
            AppCommand::Disconnect => {
                let from = self.link.state();
                self.link.disconnect(&mut *p.radio);
                self.emit_link_change(from, sink);
                sink.emit(&AppEvent::Status(status::DISCONNECTED));
                None
            }
            AppCommand::SetDemoMode(enabled) => {
                let from = self.link.state();
                self.link.set_demo_mode(enabled, &mut *p.radio);
                self.emit_link_change(from, sink);
                if enabled {
                    sink.emit(&AppEvent::Status(status::DEMO));
                }
                None
            }
            AppCommand::SimulateImpact => {
                match self.link.simulate_impact(p.clock.now_ms()) {
                    Ok(ev) => self.on_impact(ev, p, sink),
                    Err(e) => warn!("Simulated impact rejected: {}", e),
                }
                None
            }
            AppCommand::Cancel => self.process(Event::Cancel, p, sink),
            AppCommand::SendNow => self.process(Event::SendNow, p, sink),
            AppCommand::Dismiss => self.process(Event::Dismiss, p, sink),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn window_state(&self) -> StateId {
        self.window.state()
    }

    /// Countdown seconds left while the window is open.
    pub fn remaining(&self) -> Option<u32> {
        self.window.is_armed().then(|| self.window.remaining())
    }

    pub fn is_demo_mode(&self) -> bool {
        self.link.is_demo_mode()
    }

    pub fn dispatch_count(&self) -> u32 {
        self.dispatch_count
    }

    pub fn last_result(&self) -> Option<&DispatchResult> {
        self.last_result.as_ref()
    }

    pub fn dropped_frames(&self) -> u32 {
        self.link.dropped_frames()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn start_scan(
        &mut self,
        timeout: Option<Duration>,
        p: &mut Platform<'_>,
        sink: &mut impl EventSink,
    ) {
        let timeout =
            timeout.unwrap_or(Duration::from_millis(u64::from(self.config.scan_timeout_ms)));
        let from = self.link.state();
        if !self.link.is_demo_mode() {
            sink.emit(&AppEvent::Status(status::SCANNING));
        }

        let line = match self.link.start_scan(&mut *p.radio, timeout) {
            Ok(true) if self.link.is_demo_mode() => status::DEMO,
            Ok(true) => status::CONNECTED,
            Ok(false) => status::NOT_FOUND,
            Err(LinkError::PermissionDenied) => status::PERMISSION_DENIED,
            Err(e) => {
                warn!("Scan failed: {}", e);
                status::LINK_UNAVAILABLE
            }
        };
        self.emit_link_change(from, sink);
        sink.emit(&AppEvent::Status(line));
    }

    fn process(
        &mut self,
        event: Event,
        p: &mut Platform<'_>,
        sink: &mut impl EventSink,
    ) -> Option<DispatchResult> {
        match event {
            Event::Impact(ev) => {
                self.on_impact(ev, p, sink);
                None
            }
            Event::Tick => {
                if !self.window.is_armed() {
                    debug!("Stray tick with window closed");
                    return None;
                }
                self.window.tick();
                if self.window.is_armed() {
                    sink.emit(&AppEvent::CountdownTick {
                        remaining: self.window.remaining(),
                    });
                }
                self.settle(p, sink)
            }
            Event::Cancel => {
                self.window.cancel();
                self.settle(p, sink)
            }
            Event::SendNow => {
                self.window.escalate();
                self.settle(p, sink)
            }
            Event::Dismiss => {
                self.window.dismiss();
                self.settle(p, sink)
            }
        }
    }

    fn on_impact(&mut self, ev: ImpactEvent, p: &mut Platform<'_>, sink: &mut impl EventSink) {
        if self.window.is_armed() || self.dispatching {
            warn!(
                "Impact from {} ignored: previous one still in progress",
                ev.device_id
            );
            sink.emit(&AppEvent::ImpactIgnored {
                device_id: ev.device_id,
            });
            return;
        }

        info!(
            "Impact from {} ({:.2} g), opening confirmation window",
            ev.device_id, ev.impact_magnitude_g
        );
        sink.emit(&AppEvent::ImpactDetected(ev.clone()));
        sink.emit(&AppEvent::Status(status::IMPACT));

        self.window.arm(ev);
        // The repeating alert waits for the first tick so the pulse plays out.
        match p.haptics.as_deref_mut() {
            Some(h) => {
                h.start(&self.config.impact_pattern_ms, false);
                self.window.apply_deferring_alert(&mut *p.ticker);
            }
            None => self.window.apply(&mut *p.ticker, None),
        }
        sink.emit(&AppEvent::CountdownArmed {
            seconds: self.window.remaining(),
        });
    }

    /// Apply window outputs and act on a terminal outcome, if any.
    fn settle(&mut self, p: &mut Platform<'_>, sink: &mut impl EventSink) -> Option<DispatchResult> {
        self.window.apply(&mut *p.ticker, p.haptics.as_deref_mut());
        let outcome = self.window.take_outcome()?;

        // Ticks queued behind the terminal input belong to a closed window.
        self.queue.take_matching(|e| *e == Event::Tick);
        sink.emit(&AppEvent::WindowClosed(outcome.clone()));

        match outcome {
            WindowOutcome::Cancelled => {
                sink.emit(&AppEvent::Status(status::CANCELLED));
                None
            }
            WindowOutcome::Dismissed => None,
            WindowOutcome::Expired(ev) | WindowOutcome::Escalated(ev) => {
                Some(self.dispatch(&ev, p, sink))
            }
        }
    }

    fn dispatch(
        &mut self,
        ev: &ImpactEvent,
        p: &mut Platform<'_>,
        sink: &mut impl EventSink,
    ) -> DispatchResult {
        self.dispatching = true;
        sink.emit(&AppEvent::Status(status::SENDING));

        let result = self.dispatcher.run(ev, p);

        // Frames that piled up while dispatching belong to the same incident.
        for late in self.queue.take_matching(|e| matches!(e, Event::Impact(_))) {
            if let Event::Impact(late) = late {
                self.on_impact(late, p, sink);
            }
        }
        for late in self.link.poll(&mut *p.radio, p.clock.now_ms()) {
            self.on_impact(late, p, sink);
        }
        self.dispatching = false;

        self.dispatch_count = self.dispatch_count.saturating_add(1);
        self.last_result = Some(result.clone());
        sink.emit(&AppEvent::DispatchCompleted(result.clone()));
        sink.emit(&AppEvent::Status(status::SENT));
        result
    }

    fn emit_link_change(&self, from: LinkState, sink: &mut impl EventSink) {
        let to = self.link.state();
        if to != from {
            sink.emit(&AppEvent::LinkStateChanged { from, to });
        }
    }
}
