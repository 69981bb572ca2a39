//! Emergency dispatch orchestrator.
//!
//! Runs the escalation sequence for one confirmed impact:
//!
//! ```text
//!  announce ─▶ locate ─▶ persist ─▶ call ─▶ fan-out ─▶ DispatchResult
//!     │           │          │         │        │
//!     └── each step guarded: an error or a panic degrades one field ──┘
//! ```
//!
//! Steps run strictly in order because fan-out needs the coordinate from
//! locate.  Every I/O call is bounded by a timeout handed to the port.
//! Nothing in here returns an error to the caller.

use core::fmt;
use core::time::Duration;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, info, warn};

use crate::app::ports::{
    AnnouncerPort, KEY_EMERGENCY_NUMBER, KEY_USER_NAME, LocationPort, PersistencePort, Platform,
    SettingsPort, TelephonyPort,
};
use crate::config::{GuardConfig, NoNumberPolicy};
use crate::model::{AlertRecord, Coordinate, DispatchResult, ImpactEvent};
use crate::nearby;

/// Spoken before the first step when an announcer is available.
pub const ESCALATION_NOTICE: &str = "Accident confirmed. Sending emergency alert.";

/// Victim name used on alerts when none is configured.
const UNKNOWN_VICTIM: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStep {
    Announce,
    Locate,
    Persist,
    Call,
    FanOut,
}

impl fmt::Display for DispatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Announce => "announce",
            Self::Locate => "locate",
            Self::Persist => "persist",
            Self::Call => "call",
            Self::FanOut => "fan-out",
        };
        f.write_str(name)
    }
}

/// Run `f`, turning a panic into `None`.
fn guarded<T>(step: DispatchStep, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("DISPATCH: {} step panicked, continuing", step);
            None
        }
    }
}

/// Read a non-blank setting; read failures count as absent.
fn read_setting(settings: &dyn SettingsPort, key: &str) -> Option<String> {
    match settings.get(key) {
        Ok(Some(v)) if !v.trim().is_empty() => Some(v),
        Ok(_) => None,
        Err(e) => {
            warn!("DISPATCH: settings read '{}' failed ({})", key, e);
            None
        }
    }
}

/// Who the fan-out alerts are about.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Victim {
    name: String,
    emergency_contact: String,
}

pub struct Dispatcher {
    location_timeout: Duration,
    step_timeout: Duration,
    radius_km: f64,
    no_number_policy: NoNumberPolicy,
    announce: bool,
}

impl Dispatcher {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            location_timeout: Duration::from_millis(u64::from(config.location_timeout_ms)),
            step_timeout: Duration::from_millis(u64::from(config.step_timeout_ms)),
            radius_km: config.nearby_radius_km,
            no_number_policy: config.no_number_policy,
            announce: config.announce,
        }
    }

    /// Escalate `event`.  Always returns a result describing what
    /// succeeded; failed steps leave their field at its default.
    pub fn run(&self, event: &ImpactEvent, p: &mut Platform<'_>) -> DispatchResult {
        info!("DISPATCH: escalating impact from {}", event.device_id);

        if self.announce {
            guarded(DispatchStep::Announce, || {
                self.speak_notice(p.announcer.as_deref_mut());
            });
        }

        let coordinate = guarded(DispatchStep::Locate, || {
            self.locate(p.location.as_deref_mut())
        })
        .flatten();

        let created_at_ms = p.clock.now_ms();
        let accident_record_id = guarded(DispatchStep::Persist, || {
            self.persist(&mut *p.store, event, coordinate, created_at_ms)
        })
        .flatten();

        let settings = p.settings;
        let number = guarded(DispatchStep::Call, || {
            read_setting(settings, KEY_EMERGENCY_NUMBER)
        })
        .flatten();
        let emergency_call_placed = guarded(DispatchStep::Call, || {
            self.call_emergency(number.as_deref(), p.telephony.as_deref_mut())
        })
        .unwrap_or(false);

        let victim = Victim {
            name: guarded(DispatchStep::FanOut, || read_setting(settings, KEY_USER_NAME))
                .flatten()
                .unwrap_or_else(|| UNKNOWN_VICTIM.to_owned()),
            emergency_contact: number.unwrap_or_default(),
        };
        let notified_user_count = guarded(DispatchStep::FanOut, || {
            self.fan_out(
                &mut *p.store,
                accident_record_id.as_deref(),
                coordinate,
                &victim,
                created_at_ms,
            )
        })
        .unwrap_or(0);

        let result = DispatchResult {
            accident_record_id,
            emergency_call_placed,
            notified_user_count,
            coordinate,
        };
        info!("DISPATCH: done. {}", result);
        result
    }

    // ── Steps ─────────────────────────────────────────────────

    fn speak_notice(&self, announcer: Option<&mut (dyn AnnouncerPort + '_)>) {
        match announcer {
            Some(a) => {
                if let Err(e) = a.speak(ESCALATION_NOTICE) {
                    debug!("DISPATCH: announcer failed ({}), ignoring", e);
                }
            }
            None => debug!("DISPATCH: no announcer"),
        }
    }

    fn locate(&self, location: Option<&mut (dyn LocationPort + '_)>) -> Option<Coordinate> {
        let Some(loc) = location else {
            warn!("DISPATCH: no location provider, continuing without coordinate");
            return None;
        };
        match loc.current_coordinate(true, self.location_timeout) {
            Ok(c) => {
                info!("DISPATCH: located at {}", c);
                Some(c)
            }
            Err(e) => {
                warn!("DISPATCH: locate failed ({}), continuing without coordinate", e);
                None
            }
        }
    }

    fn persist(
        &self,
        store: &mut dyn PersistencePort,
        event: &ImpactEvent,
        coordinate: Option<Coordinate>,
        created_at_ms: i64,
    ) -> Option<String> {
        match store.create_accident_record(event, coordinate, created_at_ms, self.step_timeout) {
            Ok(id) => {
                info!("DISPATCH: accident record {} saved", id);
                Some(id)
            }
            Err(e) => {
                warn!("DISPATCH: accident record not saved ({})", e);
                None
            }
        }
    }

    /// `true` when a call was placed or the dialer opened with a number.
    fn call_emergency(
        &self,
        number: Option<&str>,
        telephony: Option<&mut (dyn TelephonyPort + '_)>,
    ) -> bool {
        let Some(tel) = telephony else {
            warn!("DISPATCH: no telephony capability, call not placed");
            return false;
        };

        let Some(number) = number else {
            match self.no_number_policy {
                NoNumberPolicy::Skip => {
                    warn!("DISPATCH: no emergency number configured, skipping call");
                }
                NoNumberPolicy::OpenEmptyDialer => {
                    warn!("DISPATCH: no emergency number configured, opening empty dialer");
                    if let Err(e) = tel.open_dialer("") {
                        debug!("DISPATCH: empty dialer failed ({})", e);
                    }
                }
            }
            return false;
        };

        if tel.native_call_available() {
            match tel.place_call(number, self.step_timeout) {
                Ok(()) => {
                    info!("DISPATCH: emergency call placed");
                    return true;
                }
                Err(e) => warn!("DISPATCH: direct call failed ({}), trying dialer", e),
            }
        }
        match tel.open_dialer(number) {
            Ok(()) => {
                info!("DISPATCH: dialer opened for emergency number");
                true
            }
            Err(e) => {
                warn!("DISPATCH: dialer failed ({}), call not placed", e);
                false
            }
        }
    }

    /// Alert every nearby user; returns how many alerts were written.
    fn fan_out(
        &self,
        store: &mut dyn PersistencePort,
        event_id: Option<&str>,
        coordinate: Option<Coordinate>,
        victim: &Victim,
        created_at_ms: i64,
    ) -> usize {
        if coordinate.is_none() {
            info!("DISPATCH: no coordinate, nobody to alert");
            return 0;
        }
        let directory = match store.list_users(self.step_timeout) {
            Ok(d) => d,
            Err(e) => {
                warn!("DISPATCH: user directory unavailable ({})", e);
                return 0;
            }
        };

        let nearby = nearby::resolve(coordinate, &directory, self.radius_km);
        let mut sent = 0;
        for user in &nearby {
            let alert = AlertRecord {
                event_id: event_id.map(str::to_owned),
                recipient_user_id: user.entry.user_id.clone(),
                victim_name: victim.name.clone(),
                emergency_contact_number: victim.emergency_contact.clone(),
                coordinate,
                seen: false,
                created_at_ms,
            };
            let ok = guarded(DispatchStep::FanOut, || {
                store.create_alert_record(&alert, self.step_timeout)
            });
            match ok {
                Some(Ok(())) => sent += 1,
                Some(Err(e)) => warn!(
                    "DISPATCH: alert to {} failed ({})",
                    user.entry.user_id, e
                ),
                None => {}
            }
        }
        info!("DISPATCH: {} of {} nearby users alerted", sent, nearby.len());
        sent
    }
}
