//! Impact → confirmation window → dispatch, end to end through
//! [`GuardService`] with every collaborator mocked.

use crate::mock_platform::{
    CRASH_FRAME, HELMET_ID, HapticCall, MockPlatform, PhoneCall, RecordingSink,
};

use impactguard::app::commands::AppCommand;
use impactguard::app::events::{AppEvent, status};
use impactguard::app::service::GuardService;
use impactguard::config::{FrameEncoding, GuardConfig};
use impactguard::dispatch::ESCALATION_NOTICE;
use impactguard::events::{EVENT_QUEUE_DEPTH, Event};
use impactguard::fsm::StateId;
use impactguard::fsm::context::WindowOutcome;
use impactguard::link::DEMO_DEVICE_ID;
use impactguard::model::DispatchResult;

const WINDOW_TICKS: u32 = 3;

fn config() -> GuardConfig {
    GuardConfig {
        countdown_secs: WINDOW_TICKS,
        scan_timeout_ms: 500,
        ..GuardConfig::default()
    }
}

/// Service connected to the helmet, sink cleared.
fn connected() -> (GuardService, MockPlatform, RecordingSink) {
    let mut svc = GuardService::new(config());
    let mut env = MockPlatform::new();
    let mut sink = RecordingSink::default();
    svc.start(&mut sink);
    svc.handle_command(
        AppCommand::StartScan { timeout: None },
        &mut env.platform(),
        &mut sink,
    );
    assert!(env.radio.is_connected(), "helmet should be connected");
    sink.events.clear();
    (svc, env, sink)
}

fn crash(svc: &mut GuardService, env: &mut MockPlatform, sink: &mut RecordingSink) {
    assert!(env.radio.notify_json(CRASH_FRAME, FrameEncoding::Base64));
    assert_eq!(svc.poll(&mut env.platform(), sink), None);
}

/// Let `n` tick periods elapse, one poll each.
fn ticks(
    n: u32,
    svc: &mut GuardService,
    env: &mut MockPlatform,
    sink: &mut RecordingSink,
) -> Vec<DispatchResult> {
    let mut results = Vec::new();
    for _ in 0..n {
        env.ticker.fire(1);
        results.extend(svc.poll(&mut env.platform(), sink));
    }
    results
}

fn closed(sink: &RecordingSink) -> usize {
    sink.count(|e| matches!(e, AppEvent::WindowClosed(_)))
}

// ── Arming ────────────────────────────────────────────────────

#[test]
fn crash_frame_opens_window_with_alert_and_countdown() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);

    assert_eq!(svc.window_state(), StateId::Armed);
    assert_eq!(svc.remaining(), Some(WINDOW_TICKS));
    assert!(env.ticker.running);

    // Impact pulse alone until the first tick, then the repeating alert.
    let cfg = config();
    assert_eq!(
        env.haptics.calls,
        [HapticCall::Start {
            pattern: cfg.impact_pattern_ms.to_vec(),
            repeat: false
        }]
    );
    assert!(!env.haptics.alert_running());

    ticks(1, &mut svc, &mut env, &mut sink);
    assert_eq!(
        env.haptics.calls.last(),
        Some(&HapticCall::Start {
            pattern: cfg.alert_pattern_ms.to_vec(),
            repeat: true
        })
    );
    assert!(env.haptics.alert_running());

    assert!(matches!(&sink.events[0], AppEvent::ImpactDetected(ev) if ev.device_id == HELMET_ID));
    assert!(sink.statuses().contains(&status::IMPACT));
    assert!(sink.events.contains(&AppEvent::CountdownArmed {
        seconds: WINDOW_TICKS
    }));
}

// ── Expiry ────────────────────────────────────────────────────

#[test]
fn countdown_expiry_dispatches_exactly_once() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);

    let results = ticks(WINDOW_TICKS + 5, &mut svc, &mut env, &mut sink);
    assert_eq!(results.len(), 1, "one dispatch per impact");
    let result = &results[0];

    assert_eq!(result.accident_record_id.as_deref(), Some("acc-1"));
    assert!(result.emergency_call_placed);
    assert_eq!(result.notified_user_count, 2);
    assert!(result.coordinate.is_some());

    assert_eq!(svc.window_state(), StateId::Expired);
    assert_eq!(svc.remaining(), None);
    assert_eq!(svc.dispatch_count(), 1);
    assert_eq!(svc.last_result(), Some(result));
    assert!(!env.ticker.running, "tick source stopped on close");
    assert!(!env.haptics.alert_running(), "alert stopped on close");

    assert_eq!(env.phone_calls(), [PhoneCall::Direct("112".into())]);
    assert_eq!(env.announcer.spoken, [ESCALATION_NOTICE]);
    assert_eq!(env.store.accidents.len(), 1);
    let mut alerted = env.store.alerted();
    alerted.sort_unstable();
    assert_eq!(alerted, ["near-1", "near-2"]);

    assert_eq!(closed(&sink), 1);
    assert!(
        sink.events
            .iter()
            .any(|e| matches!(e, AppEvent::WindowClosed(WindowOutcome::Expired(_))))
    );
    assert!(sink.events.contains(&AppEvent::CountdownTick { remaining: 2 }));
    assert!(sink.events.contains(&AppEvent::CountdownTick { remaining: 1 }));
    assert_eq!(
        sink.statuses(),
        [status::IMPACT, status::SENDING, status::SENT]
    );
}

#[test]
fn tick_burst_beyond_queue_depth_expires_window() {
    let long = EVENT_QUEUE_DEPTH as u32 + 4;
    let mut svc = GuardService::new(GuardConfig {
        countdown_secs: long,
        ..config()
    });
    let mut env = MockPlatform::new();
    let mut sink = RecordingSink::default();
    svc.handle_command(
        AppCommand::StartScan { timeout: None },
        &mut env.platform(),
        &mut sink,
    );
    crash(&mut svc, &mut env, &mut sink);

    env.ticker.fire(long - 1);
    assert_eq!(svc.poll(&mut env.platform(), &mut sink), None);
    assert_eq!(svc.remaining(), Some(1), "every elapsed tick counted");

    env.ticker.fire(1);
    assert!(svc.poll(&mut env.platform(), &mut sink).is_some());
    assert_eq!(svc.window_state(), StateId::Expired);
    assert_eq!(svc.dispatch_count(), 1);
}

#[test]
fn crash_frame_flood_does_not_stall_countdown() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);

    let mut results = Vec::new();
    for _ in 0..WINDOW_TICKS {
        for _ in 0..EVENT_QUEUE_DEPTH + 4 {
            env.radio.notify_json(CRASH_FRAME, FrameEncoding::Base64);
        }
        env.ticker.fire(1);
        results.extend(svc.poll(&mut env.platform(), &mut sink));
    }

    assert_eq!(results.len(), 1, "expired after exactly {WINDOW_TICKS} ticks");
    assert_eq!(svc.window_state(), StateId::Expired);
    assert_eq!(env.store.accidents.len(), 1);
    assert!(sink.count(|e| matches!(e, AppEvent::ImpactIgnored { .. })) > 0);
}

#[test]
fn burst_of_due_ticks_still_dispatches_once() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);

    env.ticker.fire(WINDOW_TICKS * 4);
    let result = svc.poll(&mut env.platform(), &mut sink);
    assert!(result.is_some());
    assert_eq!(svc.dispatch_count(), 1);
    assert_eq!(closed(&sink), 1);
    assert_eq!(env.store.accidents.len(), 1);
}

// ── Cancel / send now / dismiss ───────────────────────────────

#[test]
fn cancel_never_dispatches() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);
    ticks(1, &mut svc, &mut env, &mut sink);

    let r = svc.handle_command(AppCommand::Cancel, &mut env.platform(), &mut sink);
    assert_eq!(r, None);
    assert_eq!(svc.window_state(), StateId::Cancelled);
    assert!(!env.ticker.running);
    assert!(!env.haptics.alert_running());

    // The window is closed for good.
    assert!(ticks(WINDOW_TICKS * 2, &mut svc, &mut env, &mut sink).is_empty());
    let r = svc.handle_command(AppCommand::SendNow, &mut env.platform(), &mut sink);
    assert_eq!(r, None);

    assert_eq!(svc.dispatch_count(), 0);
    assert!(env.store.accidents.is_empty());
    assert!(env.phone_calls().is_empty());
    assert!(sink.events.contains(&AppEvent::WindowClosed(WindowOutcome::Cancelled)));
    assert!(sink.statuses().contains(&status::CANCELLED));
    assert!(!sink.statuses().contains(&status::SENDING));
}

#[test]
fn send_now_dispatches_immediately() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);

    let r = svc.handle_command(AppCommand::SendNow, &mut env.platform(), &mut sink);
    let r = r.expect("send now dispatches");
    assert!(r.emergency_call_placed);
    assert_eq!(svc.window_state(), StateId::Escalated);

    // A late cancel has nothing left to stop.
    assert_eq!(
        svc.handle_command(AppCommand::Cancel, &mut env.platform(), &mut sink),
        None
    );
    assert!(ticks(WINDOW_TICKS, &mut svc, &mut env, &mut sink).is_empty());
    assert_eq!(svc.dispatch_count(), 1);
    assert_eq!(closed(&sink), 1);
    assert!(
        sink.events
            .iter()
            .any(|e| matches!(e, AppEvent::WindowClosed(WindowOutcome::Escalated(_))))
    );
}

#[test]
fn dismiss_closes_without_dispatch_or_cancel_notice() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);

    assert_eq!(
        svc.handle_command(AppCommand::Dismiss, &mut env.platform(), &mut sink),
        None
    );
    assert_eq!(svc.window_state(), StateId::Dismissed);
    assert!(!env.ticker.running);
    assert!(ticks(WINDOW_TICKS, &mut svc, &mut env, &mut sink).is_empty());
    assert_eq!(svc.dispatch_count(), 0);
    assert!(sink.events.contains(&AppEvent::WindowClosed(WindowOutcome::Dismissed)));
    assert!(!sink.statuses().contains(&status::CANCELLED));
}

#[test]
fn cancel_queued_ahead_of_expiry_wins() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);

    assert!(svc.submit(Event::Cancel));
    env.ticker.fire(WINDOW_TICKS);
    assert_eq!(svc.poll(&mut env.platform(), &mut sink), None);

    assert_eq!(svc.window_state(), StateId::Cancelled);
    assert_eq!(closed(&sink), 1);
    assert!(env.store.accidents.is_empty());
}

// ── Overlapping impacts ───────────────────────────────────────

#[test]
fn second_impact_while_armed_is_ignored() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);
    ticks(1, &mut svc, &mut env, &mut sink);
    let starts = env.ticker.starts;

    crash(&mut svc, &mut env, &mut sink);

    assert_eq!(svc.remaining(), Some(WINDOW_TICKS - 1), "countdown not reset");
    assert_eq!(env.ticker.starts, starts);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ImpactIgnored { .. })),
        1
    );
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ImpactDetected(_))),
        1
    );

    let results = ticks(WINDOW_TICKS, &mut svc, &mut env, &mut sink);
    assert_eq!(results.len(), 1);
    assert_eq!(env.store.accidents.len(), 1);
}

#[test]
fn new_impact_after_close_opens_fresh_window() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);
    svc.handle_command(AppCommand::Cancel, &mut env.platform(), &mut sink);

    crash(&mut svc, &mut env, &mut sink);
    assert_eq!(svc.window_state(), StateId::Armed);
    assert_eq!(svc.remaining(), Some(WINDOW_TICKS));

    let results = ticks(WINDOW_TICKS, &mut svc, &mut env, &mut sink);
    assert_eq!(results.len(), 1);
    assert_eq!(svc.dispatch_count(), 1);
    assert_eq!(closed(&sink), 2);
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_while_armed_dismisses_and_releases_everything() {
    let (mut svc, mut env, mut sink) = connected();
    crash(&mut svc, &mut env, &mut sink);

    svc.shutdown(&mut env.platform(), &mut sink);

    assert_eq!(svc.window_state(), StateId::Dismissed);
    assert_eq!(svc.dispatch_count(), 0);
    assert!(!env.ticker.running);
    assert_eq!(env.haptics.calls.last(), Some(&HapticCall::Stop));
    assert!(!env.radio.is_connected());
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::LinkStateChanged { to, .. } if *to == impactguard::link::LinkState::Idle
    )));
}

// ── Demo mode ─────────────────────────────────────────────────

#[test]
fn demo_mode_runs_the_pipeline_without_a_helmet() {
    let mut svc = GuardService::new(GuardConfig {
        demo_mode: true,
        ..config()
    });
    let mut env = MockPlatform::new();
    let mut sink = RecordingSink::default();

    svc.start(&mut sink);
    assert_eq!(sink.events[0], AppEvent::Started { demo_mode: true });

    svc.handle_command(
        AppCommand::StartScan { timeout: None },
        &mut env.platform(),
        &mut sink,
    );
    assert!(!env.radio.is_connected(), "demo mode never touches the radio");
    assert!(!sink.statuses().contains(&status::SCANNING));
    assert_eq!(sink.statuses().last(), Some(&status::DEMO));

    svc.handle_command(AppCommand::SimulateImpact, &mut env.platform(), &mut sink);
    assert_eq!(svc.window_state(), StateId::Armed);

    let results = ticks(WINDOW_TICKS, &mut svc, &mut env, &mut sink);
    assert_eq!(results.len(), 1);
    assert_eq!(env.store.accidents[0].0.device_id, DEMO_DEVICE_ID);
}

#[test]
fn simulated_impact_is_rejected_outside_demo_mode() {
    let (mut svc, mut env, mut sink) = connected();
    svc.handle_command(AppCommand::SimulateImpact, &mut env.platform(), &mut sink);
    assert_eq!(svc.window_state(), StateId::Idle);
    assert!(sink.events.is_empty());
}
