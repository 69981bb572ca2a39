//! Telemetry frame decoding.
//!
//! Wire format (one BLE notification = one frame):
//! ```text
//! ┌──────────────────────────────┐
//! │ base64 text (or raw bytes)   │  ← FrameEncoding
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │ UTF-8 JSON object            │  {"type":"impact","crash":1,"gz":3.5,...}
//! └──────────────────────────────┘
//! ```
//!
//! Field names are a contract with the helmet firmware.  Both the
//! original flat layout (`id`, `gx/gy/gz`, `crash`, `ts`) and the nested
//! layout (`device_id`, `accel{}`, `gyro{}`, `impact_magnitude_g`) are
//! accepted.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::config::FrameEncoding;
use crate::error::DecodeError;
use crate::model::{ImpactEvent, Vector3};

/// Crash flag as sent by different firmware revisions.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum CrashFlag {
    Bool(bool),
    Int(i64),
}

impl CrashFlag {
    fn is_set(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(n) => n != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct AxisTriple {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    z: f32,
}

impl From<AxisTriple> for Vector3 {
    fn from(t: AxisTriple) -> Self {
        Vector3::new(t.x, t.y, t.z)
    }
}

/// Decoded JSON frame, before classification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    crash: Option<CrashFlag>,
    device_id: Option<String>,
    id: Option<String>,
    ts: Option<i64>,
    accel: Option<AxisTriple>,
    gyro: Option<AxisTriple>,
    gx: Option<f32>,
    gy: Option<f32>,
    gz: Option<f32>,
    impact_magnitude_g: Option<f32>,
}

impl TelemetryFrame {
    /// Whether this frame reports a crash.
    ///
    /// A `type` tag, when present, decides: only `impact`/`crash` qualify,
    /// and an explicit zero crash flag still vetoes.  Untagged frames
    /// fall back to the crash flag alone.
    pub fn is_impact(&self) -> bool {
        match self.kind.as_deref() {
            Some(tag) => {
                let tagged = tag.eq_ignore_ascii_case("impact") || tag.eq_ignore_ascii_case("crash");
                tagged && self.crash.is_none_or(CrashFlag::is_set)
            }
            None => self.crash.is_some_and(CrashFlag::is_set),
        }
    }

    /// Build an [`ImpactEvent`], filling gaps from link context.
    pub fn into_event(self, fallback_device_id: Option<&str>, now_ms: i64) -> ImpactEvent {
        let accel = match self.accel {
            Some(a) => a.into(),
            None => Vector3::new(
                self.gx.unwrap_or(0.0),
                self.gy.unwrap_or(0.0),
                self.gz.unwrap_or(0.0),
            ),
        };
        let gyro = self.gyro.map(Vector3::from).unwrap_or_default();
        let device_id = self
            .device_id
            .filter(|s| !s.is_empty())
            .or(self.id.filter(|s| !s.is_empty()))
            .or_else(|| fallback_device_id.map(str::to_owned))
            .unwrap_or_else(|| "unknown".to_owned());

        ImpactEvent {
            device_id,
            timestamp_ms: self.ts.unwrap_or(now_ms),
            accel,
            gyro,
            impact_magnitude_g: self
                .impact_magnitude_g
                .unwrap_or_else(|| accel.magnitude()),
            crash_flag: true,
        }
    }
}

/// Unwrap and parse one notification payload.
pub fn decode_frame(
    payload: &[u8],
    encoding: FrameEncoding,
    max_bytes: usize,
) -> Result<TelemetryFrame, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    if payload.len() > max_bytes {
        return Err(DecodeError::TooLarge);
    }

    let bytes = match encoding {
        FrameEncoding::Base64 => {
            let trimmed = payload.trim_ascii();
            BASE64.decode(trimmed).map_err(|_| DecodeError::Base64)?
        }
        FrameEncoding::Raw => payload.to_vec(),
    };
    let text = core::str::from_utf8(&bytes).map_err(|_| DecodeError::Utf8)?;
    serde_json::from_str(text).map_err(|_| DecodeError::Json)
}

/// Decode a payload and return an event only for crash frames.
///
/// `Ok(None)` means a well-formed non-crash frame (ordinary telemetry).
pub fn decode_impact(
    payload: &[u8],
    encoding: FrameEncoding,
    max_bytes: usize,
    fallback_device_id: Option<&str>,
    now_ms: i64,
) -> Result<Option<ImpactEvent>, DecodeError> {
    let frame = decode_frame(payload, encoding, max_bytes)?;
    if !frame.is_impact() {
        return Ok(None);
    }
    Ok(Some(frame.into_event(fallback_device_id, now_ms)))
}

/// Wrap a JSON text the way the helmet firmware does (test/demo helper).
pub fn encode_base64(json: &str) -> String {
    BASE64.encode(json.as_bytes())
}
