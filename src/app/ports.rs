//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GuardService (domain)
//! ```
//!
//! Driven adapters (radio stack, tick source, haptics, location, store,
//! settings, telephony) implement these traits.  The
//! [`GuardService`](super::service::GuardService) consumes them through a
//! [`Platform`] bundle, so the domain core never touches a platform API
//! directly.
//!
//! Optional capabilities (haptics, location, telephony, speech) are
//! `Option`s in the bundle: absence degrades a single step, never the run.

use core::time::Duration;

use crate::config::HapticPattern;
use crate::error::ProviderError;
use crate::model::{AlertRecord, Coordinate, ImpactEvent, UserDirectoryEntry};

// ───────────────────────────────────────────────────────────────
// Radio port (peripheral link ↔ wireless stack)
// ───────────────────────────────────────────────────────────────

/// Maximum notification payload carried through the radio port.
pub const MAX_NOTIFICATION_BYTES: usize = 1024;

/// Opaque reference to a discovered peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralRef {
    pub id: String,
    pub name: Option<String>,
}

/// One advertisement seen during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub peripheral: PeripheralRef,
    pub service_ids: Vec<String>,
    pub rssi: i16,
}

/// Discovery filter: match on name prefix **or** advertised service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    pub name_prefix: String,
    pub service_id: String,
}

impl ScanFilter {
    pub fn matches(&self, adv: &Advertisement) -> bool {
        let name_hit = !self.name_prefix.is_empty()
            && adv
                .peripheral
                .name
                .as_deref()
                .is_some_and(|n| n.starts_with(&self.name_prefix));
        let service_hit = !self.service_id.is_empty()
            && adv
                .service_ids
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&self.service_id));
        name_hit || service_hit
    }
}

/// Handle returned by a successful subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(pub u32);

/// Raw notification delivered by the radio stack.
#[derive(Debug, Clone)]
pub struct Notification {
    pub subscription: SubscriptionHandle,
    pub payload: heapless::Vec<u8, MAX_NOTIFICATION_BYTES>,
}

/// Errors from [`RadioPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Radio stack could not be brought up.
    StackUnavailable,
    /// Scan could not start or was aborted by the stack.
    ScanFailed,
    /// Lower-layer connect failure.
    ConnectFailed,
    /// GATT service/characteristic discovery failed.
    DiscoveryFailed,
    /// Characteristic subscription failed.
    SubscribeFailed,
    /// Operation requires a connection that does not exist.
    NotConnected,
}

/// The wireless stack as seen by the link manager.
///
/// Notifications are buffered by the adapter and drained by the
/// controller with [`next_notification`](Self::next_notification); the
/// adapter never calls back into the domain.
pub trait RadioPort {
    /// Bring up the radio stack (idempotent).
    fn init(&mut self) -> Result<(), RadioError>;

    /// Whether scan/connect/location permissions are granted.
    fn permissions_granted(&mut self) -> bool;

    /// Begin discovery.  Advertisements are delivered through
    /// [`next_advertisement`](Self::next_advertisement); the filter is a
    /// hint; the link manager re-checks every advertisement.
    fn start_scan(&mut self, filter: &ScanFilter) -> Result<(), RadioError>;

    /// Wait up to `wait` for the next advertisement.
    fn next_advertisement(&mut self, wait: Duration) -> Option<Advertisement>;

    /// Stop discovery.  Safe when not scanning.
    fn stop_scan(&mut self);

    fn connect(&mut self, peripheral: &PeripheralRef) -> Result<(), RadioError>;

    /// Discover services and characteristics on the connected peripheral.
    fn discover(&mut self) -> Result<(), RadioError>;

    fn subscribe(
        &mut self,
        service_id: &str,
        characteristic_id: &str,
    ) -> Result<SubscriptionHandle, RadioError>;

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), RadioError>;

    fn disconnect(&mut self, peripheral: &PeripheralRef) -> Result<(), RadioError>;

    /// Non-blocking poll for a buffered notification.
    fn next_notification(&mut self) -> Option<Notification>;
}

// ───────────────────────────────────────────────────────────────
// Tick source (countdown timer)
// ───────────────────────────────────────────────────────────────

/// Periodic tick source driving the confirmation window.
pub trait TickSource {
    /// Start (or restart) ticking every `period`.
    fn start(&mut self, period: Duration);

    /// Stop ticking and discard any undelivered ticks.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Number of ticks that elapsed since the last call.
    fn take_due(&mut self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Sensory alert (vibration)
// ───────────────────────────────────────────────────────────────

/// Out-of-band sensory alert.  Best-effort: implementations swallow
/// their own failures.
pub trait HapticPort {
    fn start(&mut self, pattern: &HapticPattern, repeat: bool);
    fn stop(&mut self);
}

/// Optional text-to-speech capability.
pub trait AnnouncerPort {
    fn speak(&mut self, text: &str) -> Result<(), ProviderError>;
}

// ───────────────────────────────────────────────────────────────
// Dispatch collaborators
// ───────────────────────────────────────────────────────────────

pub trait LocationPort {
    /// Current device coordinate, bounded by `timeout`.
    fn current_coordinate(
        &mut self,
        high_accuracy: bool,
        timeout: Duration,
    ) -> Result<Coordinate, ProviderError>;
}

/// Remote persistence (accident log, alert inbox, user directory).
pub trait PersistencePort {
    /// Persist an accident record and return its id.
    fn create_accident_record(
        &mut self,
        event: &ImpactEvent,
        coordinate: Option<Coordinate>,
        created_at_ms: i64,
        timeout: Duration,
    ) -> Result<String, ProviderError>;

    fn create_alert_record(
        &mut self,
        record: &AlertRecord,
        timeout: Duration,
    ) -> Result<(), ProviderError>;

    fn list_users(&mut self, timeout: Duration) -> Result<Vec<UserDirectoryEntry>, ProviderError>;
}

/// Settings key for the configured emergency phone number.
pub const KEY_EMERGENCY_NUMBER: &str = "emergency_number";
/// Settings key for the wearer's display name.
pub const KEY_USER_NAME: &str = "user_name";

/// Read-only local key-value settings.
pub trait SettingsPort {
    fn get(&self, key: &str) -> Result<Option<String>, ProviderError>;
}

pub trait TelephonyPort {
    /// Whether a native direct-call capability exists.
    fn native_call_available(&self) -> bool;

    /// Place a call directly.
    fn place_call(&mut self, number: &str, timeout: Duration) -> Result<(), ProviderError>;

    /// Open the platform dialer pre-filled with `number` (may be empty).
    fn open_dialer(&mut self, number: &str) -> Result<(), ProviderError>;
}

/// Wall-clock source for record timestamps.
pub trait ClockPort {
    /// Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → UI / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (log, UI, test
/// recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Platform bundle
// ───────────────────────────────────────────────────────────────

/// Every collaborator the controller needs for one call.
pub struct Platform<'a> {
    pub radio: &'a mut dyn RadioPort,
    pub ticker: &'a mut dyn TickSource,
    pub haptics: Option<&'a mut dyn HapticPort>,
    pub location: Option<&'a mut dyn LocationPort>,
    pub store: &'a mut dyn PersistencePort,
    pub settings: &'a dyn SettingsPort,
    pub telephony: Option<&'a mut dyn TelephonyPort>,
    pub announcer: Option<&'a mut dyn AnnouncerPort>,
    pub clock: &'a dyn ClockPort,
}
