//! Peripheral link manager.
//!
//! Owns the lifecycle of one wireless connection to the wearable and
//! turns its notification stream into [`ImpactEvent`]s.
//!
//! ```text
//!  IDLE ──start_scan──▶ SCANNING ──[match]──▶ CONNECTING ──[subscribed]──▶ MONITORING
//!   ▲                      │                       │                           │
//!   └──[timeout / stop]────┘◀──[connect failed]────┘◀────────[disconnect]──────┘
//! ```
//!
//! Every exit path leaves the manager in `Idle`.  Frame decoding errors
//! are logged and dropped; they never leave this module.

pub mod frame;

use core::time::Duration;
use std::time::Instant;

use log::{debug, info, warn};

use crate::app::ports::{
    PeripheralRef, RadioError, RadioPort, ScanFilter, SubscriptionHandle,
};
use crate::config::GuardConfig;
use crate::error::LinkError;
use crate::model::{ImpactEvent, Vector3};

/// Upper bound on one advertisement wait inside the scan loop.
const SCAN_POLL_SLICE: Duration = Duration::from_millis(50);

/// Device id carried by synthetic impacts.
pub const DEMO_DEVICE_ID: &str = "DEMO_HELMET_001";

// ───────────────────────────────────────────────────────────────
// Link state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Scanning,
    Connecting,
    Monitoring,
}

/// Transient connection state; exists only while connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConnection {
    pub peripheral: PeripheralRef,
    pub state: LinkState,
    pub subscription: Option<SubscriptionHandle>,
}

impl DeviceConnection {
    pub fn device_id(&self) -> &str {
        &self.peripheral.id
    }
}

// ───────────────────────────────────────────────────────────────
// Link manager
// ───────────────────────────────────────────────────────────────

pub struct LinkManager {
    state: LinkState,
    connection: Option<DeviceConnection>,
    filter: ScanFilter,
    service_uuid: String,
    characteristic_uuid: String,
    encoding: crate::config::FrameEncoding,
    max_frame_bytes: usize,
    demo_mode: bool,
    /// Frames dropped as malformed since construction.
    dropped_frames: u32,
}

impl LinkManager {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            state: LinkState::Idle,
            connection: None,
            filter: ScanFilter {
                name_prefix: config.device_name_prefix.clone(),
                service_id: config.service_uuid.clone(),
            },
            service_uuid: config.service_uuid.clone(),
            characteristic_uuid: config.notify_characteristic_uuid.clone(),
            encoding: config.frame_encoding,
            max_frame_bytes: config.max_frame_bytes,
            demo_mode: config.demo_mode,
            dropped_frames: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn connection(&self) -> Option<&DeviceConnection> {
        self.connection.as_ref()
    }

    pub fn is_demo_mode(&self) -> bool {
        self.demo_mode
    }

    pub fn dropped_frames(&self) -> u32 {
        self.dropped_frames
    }

    /// Toggle demo mode.  Turning it on tears down any live link.
    pub fn set_demo_mode(&mut self, enabled: bool, radio: &mut dyn RadioPort) {
        if enabled && self.state != LinkState::Idle {
            self.disconnect(radio);
        }
        self.demo_mode = enabled;
        info!("LINK: demo mode {}", if enabled { "on" } else { "off" });
    }

    // ── Discovery ─────────────────────────────────────────────

    /// Discover the wearable and bring it to `Monitoring`.
    ///
    /// `Ok(true)` when monitoring before `timeout`, `Ok(false)` on timeout
    /// or a failed connect to the matched device.
    pub fn start_scan(
        &mut self,
        radio: &mut dyn RadioPort,
        timeout: Duration,
    ) -> Result<bool, LinkError> {
        if self.demo_mode {
            info!("LINK: demo mode, skipping scan");
            return Ok(true);
        }
        if self.state == LinkState::Monitoring {
            info!("LINK: already monitoring");
            return Ok(true);
        }
        if self.state != LinkState::Idle {
            self.disconnect(radio);
        }

        radio.init().map_err(|e| {
            warn!("LINK: radio init failed ({:?})", e);
            LinkError::LinkUnavailable
        })?;
        if !radio.permissions_granted() {
            warn!("LINK: scan/connect permissions not granted");
            return Err(LinkError::PermissionDenied);
        }
        if let Err(e) = radio.start_scan(&self.filter) {
            warn!("LINK: scan failed to start ({:?})", e);
            return Ok(false);
        }

        self.state = LinkState::Scanning;
        info!(
            "LINK: scanning for '{}*' / service {} ({} ms)",
            self.filter.name_prefix,
            self.filter.service_id,
            timeout.as_millis()
        );

        let deadline = Instant::now() + timeout;
        let found = loop {
            let now = Instant::now();
            if now >= deadline {
                break None;
            }
            let wait = (deadline - now).min(SCAN_POLL_SLICE);
            if let Some(adv) = radio.next_advertisement(wait) {
                if self.filter.matches(&adv) {
                    break Some(adv);
                }
                debug!("LINK: ignoring advertisement from {}", adv.peripheral.id);
            }
        };
        radio.stop_scan();

        let Some(adv) = found else {
            info!("LINK: scan timed out, no helmet found");
            self.state = LinkState::Idle;
            return Ok(false);
        };

        info!(
            "LINK: helmet found {:?} ({}, rssi {})",
            adv.peripheral.name, adv.peripheral.id, adv.rssi
        );
        match self.connect(radio, adv.peripheral) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("LINK: {}", e);
                Ok(false)
            }
        }
    }

    // ── Connection ────────────────────────────────────────────

    /// Connect, discover services and subscribe to telemetry.
    ///
    /// On any lower-layer error the partial link is torn down and the
    /// manager returns to `Idle`.
    pub fn connect(
        &mut self,
        radio: &mut dyn RadioPort,
        peripheral: PeripheralRef,
    ) -> Result<(), LinkError> {
        if self.demo_mode {
            info!("LINK: demo mode, skipping connect");
            return Ok(());
        }
        if self.state != LinkState::Idle && self.state != LinkState::Scanning {
            self.disconnect(radio);
        }

        self.state = LinkState::Connecting;
        self.connection = Some(DeviceConnection {
            peripheral: peripheral.clone(),
            state: LinkState::Connecting,
            subscription: None,
        });

        match self.establish(radio, &peripheral) {
            Ok(handle) => {
                self.state = LinkState::Monitoring;
                if let Some(conn) = self.connection.as_mut() {
                    conn.state = LinkState::Monitoring;
                    conn.subscription = Some(handle);
                }
                info!("LINK: monitoring {} ({:?})", peripheral.id, peripheral.name);
                Ok(())
            }
            Err(e) => {
                warn!("LINK: connect to {} failed ({:?})", peripheral.id, e);
                self.disconnect(radio);
                Err(LinkError::ConnectionFailed)
            }
        }
    }

    fn establish(
        &self,
        radio: &mut dyn RadioPort,
        peripheral: &PeripheralRef,
    ) -> Result<SubscriptionHandle, RadioError> {
        radio.connect(peripheral)?;
        radio.discover()?;
        radio.subscribe(&self.service_uuid, &self.characteristic_uuid)
    }

    /// Release subscription and connection.  Idempotent and safe from
    /// any state; failures along the way are logged and ignored.
    pub fn disconnect(&mut self, radio: &mut dyn RadioPort) {
        if self.state == LinkState::Scanning {
            radio.stop_scan();
        }
        if let Some(conn) = self.connection.take() {
            if let Some(handle) = conn.subscription {
                if let Err(e) = radio.unsubscribe(handle) {
                    debug!("LINK: unsubscribe failed ({:?}), continuing", e);
                }
            }
            if let Err(e) = radio.disconnect(&conn.peripheral) {
                debug!("LINK: disconnect failed ({:?}), continuing", e);
            }
            info!("LINK: disconnected from {}", conn.peripheral.id);
        }
        self.state = LinkState::Idle;
    }

    // ── Notifications ─────────────────────────────────────────

    /// Drain buffered notifications and return the crash frames.
    ///
    /// Telemetry frames and malformed payloads produce nothing.
    pub fn poll(&mut self, radio: &mut dyn RadioPort, now_ms: i64) -> Vec<ImpactEvent> {
        let mut impacts = Vec::new();
        if self.state != LinkState::Monitoring {
            return impacts;
        }
        let active = self.connection.as_ref().and_then(|c| c.subscription);

        while let Some(note) = radio.next_notification() {
            if Some(note.subscription) != active {
                debug!("LINK: notification for stale subscription {:?}", note.subscription);
                continue;
            }
            if let Some(ev) = self.on_frame(&note.payload, now_ms) {
                impacts.push(ev);
            }
        }
        impacts
    }

    /// Decode a single frame.  Never fails: errors are counted and dropped.
    pub fn on_frame(&mut self, payload: &[u8], now_ms: i64) -> Option<ImpactEvent> {
        let fallback = self.connection.as_ref().map(DeviceConnection::device_id);
        match frame::decode_impact(
            payload,
            self.encoding,
            self.max_frame_bytes,
            fallback,
            now_ms,
        ) {
            Ok(Some(ev)) => {
                info!(
                    "LINK: crash frame from {} ({:.2} g)",
                    ev.device_id, ev.impact_magnitude_g
                );
                Some(ev)
            }
            Ok(None) => {
                debug!("LINK: telemetry frame ({} bytes)", payload.len());
                None
            }
            Err(e) => {
                self.dropped_frames = self.dropped_frames.saturating_add(1);
                warn!("LINK: dropped malformed frame: {}", e);
                None
            }
        }
    }

    // ── Demo path ─────────────────────────────────────────────

    /// Build the canonical synthetic impact (demo mode only).
    pub fn simulate_impact(&self, now_ms: i64) -> Result<ImpactEvent, LinkError> {
        if !self.demo_mode {
            return Err(LinkError::NotInDemoMode);
        }
        let accel = Vector3::new(0.4, 0.2, 3.5);
        let ev = ImpactEvent {
            device_id: DEMO_DEVICE_ID.to_owned(),
            timestamp_ms: now_ms,
            accel,
            gyro: Vector3::default(),
            impact_magnitude_g: accel.magnitude(),
            crash_flag: true,
        };
        info!("LINK: demo impact injected ({:.2} g)", ev.impact_magnitude_g);
        Ok(ev)
    }
}
