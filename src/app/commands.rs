//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (UI buttons,
//! CLI, test harness) that the [`GuardService`](super::service::GuardService)
//! interprets and acts upon.

use core::time::Duration;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Discover and connect to the wearable.  `None` uses the configured
    /// scan timeout.
    StartScan { timeout: Option<Duration> },

    /// Drop the wearable link.
    Disconnect,

    /// Toggle the synthetic path.
    SetDemoMode(bool),

    /// Inject the canonical demo impact (demo mode only).
    SimulateImpact,

    /// Wearer pressed "I'm safe".
    Cancel,

    /// Wearer pressed "Send help now".
    SendNow,

    /// The confirmation UI was closed without a decision.
    Dismiss,
}
