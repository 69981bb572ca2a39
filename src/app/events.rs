//! Outbound application events.
//!
//! The [`GuardService`](super::service::GuardService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log lines, a UI, a test recorder.

use crate::fsm::context::WindowOutcome;
use crate::link::LinkState;
use crate::model::{DispatchResult, ImpactEvent};

/// User-facing status strings.
pub mod status {
    pub const SCANNING: &str = "Scanning...";
    pub const CONNECTED: &str = "Helmet connected";
    pub const NOT_FOUND: &str = "No helmet found";
    pub const PERMISSION_DENIED: &str = "Bluetooth permissions denied";
    pub const LINK_UNAVAILABLE: &str = "Bluetooth unavailable";
    pub const IMPACT: &str = "Impact detected!";
    pub const CANCELLED: &str = "Cancelled";
    pub const SENDING: &str = "Sending emergency alert...";
    pub const SENT: &str = "Alert sent";
    pub const DISCONNECTED: &str = "Disconnected";
    pub const DEMO: &str = "Demo Mode active";
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Started { demo_mode: bool },

    /// The peripheral link moved between states.
    LinkStateChanged { from: LinkState, to: LinkState },

    /// A crash frame opened the confirmation window.
    ImpactDetected(ImpactEvent),

    /// A crash frame arrived while a window or dispatch was in flight.
    ImpactIgnored { device_id: String },

    /// The confirmation window opened.
    CountdownArmed { seconds: u32 },

    /// One countdown period elapsed.
    CountdownTick { remaining: u32 },

    /// The confirmation window reached a terminal state.
    WindowClosed(WindowOutcome),

    /// Dispatch finished; carries the summary for the UI.
    DispatchCompleted(DispatchResult),

    /// Human-readable status line.
    Status(&'static str),
}
