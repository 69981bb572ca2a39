//! Mock platform for integration tests.
//!
//! Every port records what it was asked to do so tests can assert on the
//! full call history.  Each collaborator can be told to fail (or panic)
//! to exercise the dispatch step isolation.

#![allow(dead_code)]

use core::time::Duration;
use std::collections::HashMap;

use impactguard::adapters::radio::SimRadio;
use impactguard::app::events::AppEvent;
use impactguard::app::ports::{
    AnnouncerPort, ClockPort, EventSink, HapticPort, KEY_EMERGENCY_NUMBER, KEY_USER_NAME,
    LocationPort, PersistencePort, Platform, SettingsPort, TelephonyPort, TickSource,
};
use impactguard::config::HapticPattern;
use impactguard::error::ProviderError;
use impactguard::model::{AlertRecord, Coordinate, ImpactEvent, UserDirectoryEntry, Vector3};

pub const HELMET_ID: &str = "C4:DE:E2:10:42:01";
pub const HELMET_NAME: &str = "AvRak_Helmet_01";
pub const CRASH_SITE: Coordinate = Coordinate::new(12.9716, 77.5946);
pub const NOW_MS: i64 = 1_700_000_000_000;

// ── Tick source ───────────────────────────────────────────────

/// Ticks only when the test says so.
#[derive(Debug, Default)]
pub struct ManualTicker {
    pub running: bool,
    pub period: Option<Duration>,
    pub starts: u32,
    pending: u32,
}

impl ManualTicker {
    /// Let `n` periods elapse.  Lost when the ticker is stopped.
    pub fn fire(&mut self, n: u32) {
        if self.running {
            self.pending += n;
        }
    }
}

impl TickSource for ManualTicker {
    fn start(&mut self, period: Duration) {
        self.running = true;
        self.period = Some(period);
        self.starts += 1;
        self.pending = 0;
    }

    fn stop(&mut self) {
        self.running = false;
        self.pending = 0;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn take_due(&mut self) -> u32 {
        core::mem::take(&mut self.pending)
    }
}

// ── Haptics ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HapticCall {
    Start { pattern: Vec<u32>, repeat: bool },
    Stop,
}

#[derive(Debug, Default)]
pub struct MockHaptics {
    pub calls: Vec<HapticCall>,
}

impl MockHaptics {
    /// Whether a repeating pattern is running after the last call.
    pub fn alert_running(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HapticCall::Start { repeat, .. } => Some(*repeat),
                HapticCall::Stop => Some(false),
            })
            .unwrap_or(false)
    }
}

impl HapticPort for MockHaptics {
    fn start(&mut self, pattern: &HapticPattern, repeat: bool) {
        self.calls.push(HapticCall::Start {
            pattern: pattern.iter().copied().collect(),
            repeat,
        });
    }

    fn stop(&mut self) {
        self.calls.push(HapticCall::Stop);
    }
}

// ── Announcer ─────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockAnnouncer {
    pub spoken: Vec<String>,
    pub fails: bool,
}

impl AnnouncerPort for MockAnnouncer {
    fn speak(&mut self, text: &str) -> Result<(), ProviderError> {
        if self.fails {
            return Err(ProviderError::Unavailable);
        }
        self.spoken.push(text.to_owned());
        Ok(())
    }
}

// ── Location ──────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockLocation {
    pub fix: Result<Coordinate, ProviderError>,
    pub panics: bool,
    pub requests: Vec<(bool, Duration)>,
}

impl MockLocation {
    pub fn at(c: Coordinate) -> Self {
        Self {
            fix: Ok(c),
            panics: false,
            requests: Vec::new(),
        }
    }
}

impl LocationPort for MockLocation {
    fn current_coordinate(
        &mut self,
        high_accuracy: bool,
        timeout: Duration,
    ) -> Result<Coordinate, ProviderError> {
        self.requests.push((high_accuracy, timeout));
        if self.panics {
            panic!("location provider crashed");
        }
        self.fix
    }
}

// ── Persistence ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockStore {
    pub accidents: Vec<(ImpactEvent, Option<Coordinate>, i64)>,
    pub alerts: Vec<AlertRecord>,
    pub users: Vec<UserDirectoryEntry>,
    pub accident_fails: bool,
    pub directory_fails: bool,
    /// Alert writes for this recipient fail.
    pub alert_fails_for: Option<String>,
    /// Alert writes for this recipient panic.
    pub alert_panics_for: Option<String>,
}

impl MockStore {
    pub fn add_user(&mut self, id: &str, at: Option<Coordinate>) {
        self.users.push(UserDirectoryEntry {
            user_id: id.to_owned(),
            name: format!("User {id}"),
            emergency_contact_number: "108".to_owned(),
            last_known_location: at,
        });
    }

    pub fn alerted(&self) -> Vec<&str> {
        self.alerts
            .iter()
            .map(|a| a.recipient_user_id.as_str())
            .collect()
    }
}

impl PersistencePort for MockStore {
    fn create_accident_record(
        &mut self,
        event: &ImpactEvent,
        coordinate: Option<Coordinate>,
        created_at_ms: i64,
        _timeout: Duration,
    ) -> Result<String, ProviderError> {
        if self.accident_fails {
            return Err(ProviderError::Failed("write rejected"));
        }
        self.accidents
            .push((event.clone(), coordinate, created_at_ms));
        Ok(format!("acc-{}", self.accidents.len()))
    }

    fn create_alert_record(
        &mut self,
        record: &AlertRecord,
        _timeout: Duration,
    ) -> Result<(), ProviderError> {
        let to = Some(&record.recipient_user_id);
        if self.alert_panics_for.as_ref() == to {
            panic!("alert backend crashed");
        }
        if self.alert_fails_for.as_ref() == to {
            return Err(ProviderError::Timeout);
        }
        self.alerts.push(record.clone());
        Ok(())
    }

    fn list_users(
        &mut self,
        _timeout: Duration,
    ) -> Result<Vec<UserDirectoryEntry>, ProviderError> {
        if self.directory_fails {
            return Err(ProviderError::Failed("directory offline"));
        }
        Ok(self.users.clone())
    }
}

// ── Settings ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockSettings {
    pub values: HashMap<String, String>,
    pub fails: bool,
}

impl MockSettings {
    pub fn with_rider(number: &str, name: &str) -> Self {
        let mut s = Self::default();
        s.values.insert(KEY_EMERGENCY_NUMBER.into(), number.into());
        s.values.insert(KEY_USER_NAME.into(), name.into());
        s
    }
}

impl SettingsPort for MockSettings {
    fn get(&self, key: &str) -> Result<Option<String>, ProviderError> {
        if self.fails {
            return Err(ProviderError::Failed("settings corrupt"));
        }
        Ok(self.values.get(key).cloned())
    }
}

// ── Telephony ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PhoneCall {
    Direct(String),
    Dialer(String),
}

#[derive(Debug, Default)]
pub struct MockPhone {
    pub native: bool,
    pub call_fails: bool,
    pub dialer_fails: bool,
    pub calls: Vec<PhoneCall>,
}

impl MockPhone {
    pub fn native() -> Self {
        Self {
            native: true,
            ..Self::default()
        }
    }
}

impl TelephonyPort for MockPhone {
    fn native_call_available(&self) -> bool {
        self.native
    }

    fn place_call(&mut self, number: &str, _timeout: Duration) -> Result<(), ProviderError> {
        if self.call_fails {
            return Err(ProviderError::Denied);
        }
        self.calls.push(PhoneCall::Direct(number.to_owned()));
        Ok(())
    }

    fn open_dialer(&mut self, number: &str) -> Result<(), ProviderError> {
        if self.dialer_fails {
            return Err(ProviderError::Unavailable);
        }
        self.calls.push(PhoneCall::Dialer(number.to_owned()));
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct FixedClock(pub i64);

impl ClockPort for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn statuses(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Status(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pick: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pick(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockPlatform ──────────────────────────────────────────────

/// Owns one of every collaborator and lends them out as a [`Platform`].
pub struct MockPlatform {
    pub radio: SimRadio,
    pub ticker: ManualTicker,
    pub haptics: MockHaptics,
    pub location: Option<MockLocation>,
    pub store: MockStore,
    pub settings: MockSettings,
    pub phone: Option<MockPhone>,
    pub announcer: MockAnnouncer,
    pub clock: FixedClock,
}

impl MockPlatform {
    /// Helmet in range, rider configured, three users around the crash
    /// site (two within 1.5 km).
    pub fn new() -> Self {
        let mut radio = SimRadio::new();
        radio.add_peripheral(HELMET_ID, Some(HELMET_NAME), &[]);
        let mut store = MockStore::default();
        store.add_user("near-1", Some(Coordinate::new(12.98, 77.60)));
        store.add_user("near-2", Some(Coordinate::new(12.9650, 77.5900)));
        store.add_user("far", Some(Coordinate::new(13.10, 77.70)));
        Self {
            radio,
            ticker: ManualTicker::default(),
            haptics: MockHaptics::default(),
            location: Some(MockLocation::at(CRASH_SITE)),
            store,
            settings: MockSettings::with_rider("112", "Asha"),
            phone: Some(MockPhone::native()),
            announcer: MockAnnouncer::default(),
            clock: FixedClock(NOW_MS),
        }
    }

    pub fn platform(&mut self) -> Platform<'_> {
        Platform {
            radio: &mut self.radio,
            ticker: &mut self.ticker,
            haptics: Some(&mut self.haptics),
            location: self
                .location
                .as_mut()
                .map(|l| l as &mut dyn LocationPort),
            store: &mut self.store,
            settings: &self.settings,
            telephony: self.phone.as_mut().map(|t| t as &mut dyn TelephonyPort),
            announcer: Some(&mut self.announcer),
            clock: &self.clock,
        }
    }

    pub fn phone_calls(&self) -> Vec<PhoneCall> {
        self.phone.as_ref().map(|p| p.calls.clone()).unwrap_or_default()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

/// A crash frame as the helmet firmware sends it.
pub const CRASH_FRAME: &str =
    r#"{"type":"impact","crash":1,"accel":{"x":0.4,"y":0.2,"z":3.5},"gyro":{"x":12.0,"y":-4.0,"z":1.5}}"#;

/// A plain telemetry frame.
pub const TELEMETRY_FRAME: &str =
    r#"{"type":"telemetry","crash":0,"accel":{"x":0.0,"y":0.0,"z":1.0},"gyro":{"x":0.0,"y":0.0,"z":0.0}}"#;

pub fn impact(device_id: &str) -> ImpactEvent {
    let accel = Vector3::new(0.4, 0.2, 3.5);
    ImpactEvent {
        device_id: device_id.to_owned(),
        timestamp_ms: NOW_MS,
        accel,
        gyro: Vector3::default(),
        impact_magnitude_g: accel.magnitude(),
        crash_flag: true,
    }
}
