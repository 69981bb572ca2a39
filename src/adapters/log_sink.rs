//! Log-based event sink and console logger.
//!
//! [`LogEventSink`] implements [`EventSink`] by writing structured
//! application events through the `log` facade.  A UI adapter would
//! implement the same trait.  [`install_console_logger`] sets up the
//! `tracing-subscriber` console output the host binary uses.

use log::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::fsm::context::WindowOutcome;

/// Environment variable holding the log level filter.
pub const LOG_LEVEL_ENV: &str = "IMPACTGUARD_LOG";

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { demo_mode } => {
                info!("START | demo_mode={}", demo_mode);
            }
            AppEvent::LinkStateChanged { from, to } => {
                info!("LINK | {:?} -> {:?}", from, to);
            }
            AppEvent::ImpactDetected(ev) => {
                info!(
                    "IMPACT | device={} | {:.2} g | accel=({:.2},{:.2},{:.2})",
                    ev.device_id, ev.impact_magnitude_g, ev.accel.x, ev.accel.y, ev.accel.z
                );
            }
            AppEvent::ImpactIgnored { device_id } => {
                warn!("IMPACT | ignored from {} (window or dispatch in flight)", device_id);
            }
            AppEvent::CountdownArmed { seconds } => {
                info!("WINDOW | armed, {}s to cancel", seconds);
            }
            AppEvent::CountdownTick { remaining } => {
                info!("WINDOW | {}s", remaining);
            }
            AppEvent::WindowClosed(outcome) => {
                let what = match outcome {
                    WindowOutcome::Cancelled => "cancelled",
                    WindowOutcome::Dismissed => "dismissed",
                    WindowOutcome::Expired(_) => "expired",
                    WindowOutcome::Escalated(_) => "escalated",
                };
                info!("WINDOW | closed: {}", what);
            }
            AppEvent::DispatchCompleted(result) => {
                info!(
                    "DISPATCH | {} | record={} | at={}",
                    result,
                    result.accident_record_id.as_deref().unwrap_or("-"),
                    result
                        .coordinate
                        .map_or_else(|| "-".to_owned(), |c| c.to_string())
                );
            }
            AppEvent::Status(line) => {
                info!("STATUS | {}", line);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Console logger
// ───────────────────────────────────────────────────────────────

/// Filter for a [`LOG_LEVEL_ENV`] value, `info` when unset or unparsable.
pub fn console_filter(value: Option<&str>) -> EnvFilter {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber writing to stderr.  `log` records from
/// the library are bridged into it.
pub fn install_console_logger() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = console_filter(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
}
