//! System configuration parameters
//!
//! All tunable parameters for the impact guard.  Behaviour that used to
//! differ between builds of the companion app (vibration pattern, UUIDs,
//! demo shortcut, empty-number handling) is expressed here as data.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of on/off segments in a haptic pattern.
pub const MAX_PATTERN_SEGMENTS: usize = 8;

/// Alternating on/off durations in milliseconds.
pub type HapticPattern = heapless::Vec<u32, MAX_PATTERN_SEGMENTS>;

/// Build a pattern from a slice, truncating past [`MAX_PATTERN_SEGMENTS`].
pub fn pattern(ms: &[u32]) -> HapticPattern {
    ms.iter().copied().take(MAX_PATTERN_SEGMENTS).collect()
}

/// What step 3 of the dispatch does when no emergency number is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoNumberPolicy {
    /// Do nothing; the call is reported as not placed.
    Skip,
    /// Open the platform dialer with an empty number.
    OpenEmptyDialer,
}

/// How notification payloads are wrapped by the radio stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameEncoding {
    /// Base64 text carrying UTF-8 JSON.
    Base64,
    /// UTF-8 JSON bytes as-is.
    Raw,
}

/// Core configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    // --- Confirmation window ---
    /// Seconds the wearer has to cancel before escalation
    pub countdown_secs: u32,
    /// Countdown tick period (milliseconds)
    pub tick_interval_ms: u32,
    /// Continuous vibration while the window is open (repeats)
    pub alert_pattern_ms: HapticPattern,
    /// One-shot pulse when an impact is first detected
    pub impact_pattern_ms: HapticPattern,

    // --- Peripheral link ---
    /// Default discovery timeout (milliseconds)
    pub scan_timeout_ms: u32,
    /// Advertised name prefix of the wearable
    pub device_name_prefix: String,
    /// Telemetry service identifier
    pub service_uuid: String,
    /// Telemetry notify characteristic identifier
    pub notify_characteristic_uuid: String,
    /// Payload wrapping used by the radio stack
    pub frame_encoding: FrameEncoding,
    /// Payloads larger than this are dropped
    pub max_frame_bytes: usize,
    /// Skip discovery and allow synthetic impacts
    pub demo_mode: bool,

    // --- Dispatch ---
    /// Location lookup bound (milliseconds)
    pub location_timeout_ms: u32,
    /// Bound for persistence, telephony and fan-out calls (milliseconds)
    pub step_timeout_ms: u32,
    /// Peer notification radius (km)
    pub nearby_radius_km: f64,
    /// Behaviour when no emergency number is configured
    pub no_number_policy: NoNumberPolicy,
    /// Speak the escalation notice when an announcer is present
    pub announce: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            // Confirmation window
            countdown_secs: 30,
            tick_interval_ms: 1000, // 1 Hz
            alert_pattern_ms: pattern(&[400, 600]),
            impact_pattern_ms: pattern(&[300, 200, 300]),

            // Peripheral link
            scan_timeout_ms: 10_000,
            device_name_prefix: "AvRak_Helmet_".into(),
            service_uuid: "180a".into(),
            notify_characteristic_uuid: "2a57".into(),
            frame_encoding: FrameEncoding::Base64,
            max_frame_bytes: 512,
            demo_mode: false,

            // Dispatch
            location_timeout_ms: 10_000,
            step_timeout_ms: 8_000,
            nearby_radius_km: 1.5,
            no_number_policy: NoNumberPolicy::Skip,
            announce: true,
        }
    }
}

impl GuardConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed JSON config"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<()> {
        if !(1..=600).contains(&self.countdown_secs) {
            return Err(Error::Config("countdown_secs must be 1–600"));
        }
        if !(10..=10_000).contains(&self.tick_interval_ms) {
            return Err(Error::Config("tick_interval_ms must be 10–10000"));
        }
        if self.alert_pattern_ms.is_empty() || self.impact_pattern_ms.is_empty() {
            return Err(Error::Config("haptic patterns must not be empty"));
        }
        if self
            .alert_pattern_ms
            .iter()
            .chain(self.impact_pattern_ms.iter())
            .any(|&ms| ms == 0 || ms > 10_000)
        {
            return Err(Error::Config("haptic segments must be 1–10000 ms"));
        }
        if self.scan_timeout_ms == 0 {
            return Err(Error::Config("scan_timeout_ms must be > 0"));
        }
        if self.device_name_prefix.is_empty() && self.service_uuid.is_empty() {
            return Err(Error::Config("scan needs a name prefix or a service id"));
        }
        if self.service_uuid.is_empty() || self.notify_characteristic_uuid.is_empty() {
            return Err(Error::Config("telemetry service/characteristic required"));
        }
        if !(16..=4096).contains(&self.max_frame_bytes) {
            return Err(Error::Config("max_frame_bytes must be 16–4096"));
        }
        if !(1..=60_000).contains(&self.location_timeout_ms) {
            return Err(Error::Config("location_timeout_ms must be 1–60000"));
        }
        if !(1..=60_000).contains(&self.step_timeout_ms) {
            return Err(Error::Config("step_timeout_ms must be 1–60000"));
        }
        if !(self.nearby_radius_km > 0.0 && self.nearby_radius_km <= 50.0) {
            return Err(Error::Config("nearby_radius_km must be in (0, 50]"));
        }
        Ok(())
    }
}
