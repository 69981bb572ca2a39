//! ImpactGuard host demo: main entry point.
//!
//! Wires the simulation adapters around the [`GuardService`] and walks one
//! impact through the full pipeline: scan, crash frame, confirmation
//! window, dispatch.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimRadio        IntervalTicker   LogHaptics    LogAnnouncer   │
//! │  (RadioPort)     (TickSource)     (HapticPort)  (Announcer)    │
//! │  MemoryStore     MemorySettings   SimPhone      FixedLocation  │
//! │  (Persistence)   (Settings)       (Telephony)   (Location)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            GuardService (pure logic)                   │    │
//! │  │  Link · Window · Dispatch · Nearby                     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `impactguard [config.json]`.  Log level from `IMPACTGUARD_LOG`.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::{info, warn};

use impactguard::adapters::feedback::{LogAnnouncer, LogHaptics};
use impactguard::adapters::location::FixedLocation;
use impactguard::adapters::log_sink::{LogEventSink, install_console_logger};
use impactguard::adapters::phone::SimPhone;
use impactguard::adapters::radio::SimRadio;
use impactguard::adapters::store::{MemorySettings, MemoryStore};
use impactguard::adapters::time::{IntervalTicker, SystemClock};
use impactguard::app::commands::AppCommand;
use impactguard::app::ports::{KEY_EMERGENCY_NUMBER, KEY_USER_NAME, Platform};
use impactguard::app::service::GuardService;
use impactguard::config::GuardConfig;
use impactguard::model::{Coordinate, UserDirectoryEntry};

/// Where the demo rider crashes.
const CRASH_SITE: Coordinate = Coordinate::new(12.9716, 77.5946);

/// How often the demo loop polls the service.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

const DEMO_HELMET_ID: &str = "C4:DE:E2:10:42:01";

fn load_config() -> Result<GuardConfig> {
    let Some(path) = std::env::args().nth(1) else {
        info!("No config file given, using defaults");
        return Ok(GuardConfig::default());
    };
    let text =
        std::fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
    let config = GuardConfig::from_json(&text).with_context(|| format!("parsing config {path}"))?;
    info!("Config loaded from {}", path);
    Ok(config)
}

fn seed_directory(store: &mut MemoryStore) -> Result<()> {
    let users = [
        ("u-101", "Ravi", Some(Coordinate::new(12.9800, 77.6000))),
        ("u-102", "Meera", Some(Coordinate::new(12.9650, 77.5900))),
        ("u-103", "Karthik", Some(Coordinate::new(13.1000, 77.7000))),
        ("u-104", "Noor", None),
    ];
    for (id, name, at) in users {
        store.register_user(&UserDirectoryEntry {
            user_id: id.to_owned(),
            name: name.to_owned(),
            emergency_contact_number: "108".to_owned(),
            last_known_location: at,
        })?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    install_console_logger().map_err(|e| anyhow::anyhow!(e))?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ImpactGuard v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config ─────────────────────────────────────────────
    let config = load_config()?;
    config.validate()?;
    let encoding = config.frame_encoding;
    let prefix = config.device_name_prefix.clone();

    // ── 3. Adapters ───────────────────────────────────────────
    let mut radio = SimRadio::new();
    radio.add_peripheral(DEMO_HELMET_ID, Some(&format!("{prefix}01")), &[]);
    let mut ticker = IntervalTicker::new();
    let mut haptics = LogHaptics::new();
    let mut location = FixedLocation::new(CRASH_SITE);
    let mut store = MemoryStore::new();
    seed_directory(&mut store)?;
    let mut settings = MemorySettings::new();
    settings.set(KEY_EMERGENCY_NUMBER, "+91 98450 00112")?;
    settings.set(KEY_USER_NAME, "Demo Rider")?;
    let mut phone = SimPhone::new(true);
    let mut announcer = LogAnnouncer::new();
    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();

    let mut svc = GuardService::new(config);

    // Every call borrows the whole adapter set; rebuilt when the demo
    // needs to touch the radio directly.
    macro_rules! platform {
        () => {
            Platform {
                radio: &mut radio,
                ticker: &mut ticker,
                haptics: Some(&mut haptics),
                location: Some(&mut location),
                store: &mut store,
                settings: &settings,
                telephony: Some(&mut phone),
                announcer: Some(&mut announcer),
                clock: &clock,
            }
        };
    }

    // ── 4. Connect ────────────────────────────────────────────
    svc.start(&mut sink);
    svc.handle_command(
        AppCommand::StartScan { timeout: None },
        &mut platform!(),
        &mut sink,
    );

    // ── 5. One impact ─────────────────────────────────────────
    if svc.is_demo_mode() {
        svc.handle_command(AppCommand::SimulateImpact, &mut platform!(), &mut sink);
    } else {
        // The helmet firmware's crash report.
        let frame = r#"{"type":"impact","crash":1,"accel":{"x":0.4,"y":0.2,"z":3.5},"gyro":{"x":12.0,"y":-4.0,"z":1.5}}"#;
        if !radio.notify_json(frame, encoding) {
            bail!("helmet not connected, nothing to demo");
        }
    }

    // ── 6. Event loop until the window resolves ───────────────
    let mut p = platform!();
    let result = loop {
        if let Some(result) = svc.poll(&mut p, &mut sink) {
            break result;
        }
        let state = svc.window_state();
        if state.is_terminal() {
            warn!("Window closed as {:?} without dispatch", state);
            svc.shutdown(&mut p, &mut sink);
            return Ok(());
        }
        std::thread::sleep(POLL_INTERVAL);
    };
    svc.shutdown(&mut p, &mut sink);
    drop(p);

    info!("────────────────────────────────────────");
    info!("{}", result);
    if let Some(id) = &result.accident_record_id {
        info!("Accident record: {}", id);
    }
    info!("Phone: {:?}", phone.actions());
    info!("Spoken: {:?}", announcer.spoken());
    Ok(())
}
