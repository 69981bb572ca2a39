//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements              | Connects to                  |
//! |-------------|-------------------------|------------------------------|
//! | `radio`     | RadioPort               | Simulated BLE central        |
//! | `time`      | ClockPort, TickSource   | System clock, `Instant`      |
//! | `feedback`  | HapticPort              | Log output                   |
//! |             | AnnouncerPort           | Log output                   |
//! | `location`  | LocationPort            | Fixed coordinate             |
//! | `phone`     | TelephonyPort           | Log output                   |
//! | `store`     | PersistencePort         | In-memory blob store         |
//! |             | SettingsPort            | In-memory validated settings |
//! | `log_sink`  | EventSink, subscriber   | Console                      |

pub mod feedback;
pub mod location;
pub mod log_sink;
pub mod phone;
pub mod radio;
pub mod store;
pub mod time;
