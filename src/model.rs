//! Domain data model.
//!
//! Plain value types shared by the link manager, the confirmation window
//! and the dispatch orchestrator.  Everything here is immutable once
//! built; the core passes these by value or shared reference and never
//! owns a long-lived copy of anything the persistence collaborator holds.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Three-axis sensor reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A structured report that the wearable detected a collision-like force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvent {
    pub device_id: String,
    /// Unix epoch milliseconds.
    pub timestamp_ms: i64,
    /// Linear acceleration in g.
    pub accel: Vector3,
    /// Angular rate in deg/s.
    pub gyro: Vector3,
    pub impact_magnitude_g: f32,
    pub crash_flag: bool,
}

/// WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

/// Persisted projection of an escalated [`ImpactEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentRecord {
    pub record_id: String,
    pub device_id: String,
    pub timestamp_ms: i64,
    pub accel: Vector3,
    pub gyro: Vector3,
    pub impact_magnitude_g: f32,
    pub crash_flag: bool,
    pub coordinate: Option<Coordinate>,
    pub created_at_ms: i64,
}

impl AccidentRecord {
    /// Project an event into a record.  The store assigns `record_id`.
    pub fn from_event(
        record_id: String,
        event: &ImpactEvent,
        coordinate: Option<Coordinate>,
        created_at_ms: i64,
    ) -> Self {
        Self {
            record_id,
            device_id: event.device_id.clone(),
            timestamp_ms: event.timestamp_ms,
            accel: event.accel,
            gyro: event.gyro,
            impact_magnitude_g: event.impact_magnitude_g,
            crash_flag: event.crash_flag,
            coordinate,
            created_at_ms,
        }
    }
}

/// Read-only snapshot of one registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDirectoryEntry {
    pub user_id: String,
    pub name: String,
    pub emergency_contact_number: String,
    pub last_known_location: Option<Coordinate>,
}

/// A directory entry that fell inside the nearby-user radius.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyUser {
    pub entry: UserDirectoryEntry,
    pub distance_km: f64,
}

/// One in-app alert addressed to a nearby user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Accident record id, absent when persistence failed.
    pub event_id: Option<String>,
    pub recipient_user_id: String,
    pub victim_name: String,
    pub emergency_contact_number: String,
    pub coordinate: Option<Coordinate>,
    pub seen: bool,
    pub created_at_ms: i64,
}

/// Summary returned to the caller after a dispatch run.  Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchResult {
    pub accident_record_id: Option<String>,
    pub emergency_call_placed: bool,
    pub notified_user_count: usize,
    pub coordinate: Option<Coordinate>,
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Emergency Call: {}, Nearby Users Notified: {}",
            if self.emergency_call_placed {
                "Done"
            } else {
                "Not placed"
            },
            self.notified_user_count
        )
    }
}
