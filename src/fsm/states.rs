//! Confirmation window state handlers and table builder.
//!
//! Each state is three plain `fn` pointers: no closures, no dynamic
//! dispatch.
//!
//! ```text
//!  IDLE ──[arm]──▶ ARMED(n) ──[tick]──▶ ARMED(n-1) ── … ──▶ EXPIRED
//!                    │  │  │
//!                    │  │  └──[dismiss]──▶ DISMISSED
//!                    │  └─────[send now]──▶ ESCALATED
//!                    └────────[cancel]────▶ CANCELLED
//! ```
//!
//! Terminal states ignore every input; only a new arming leaves them.
//! Every terminal `on_enter` tears down the tick source and the alert.

use super::context::{WindowContext, WindowInput, WindowOutcome, WindowOutputs};
use super::{StateDescriptor, StateId};
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: stay,
        },
        StateDescriptor {
            id: StateId::Armed,
            name: "Armed",
            on_enter: Some(armed_enter),
            on_exit: Some(armed_exit),
            on_update: armed_update,
        },
        StateDescriptor {
            id: StateId::Cancelled,
            name: "Cancelled",
            on_enter: Some(cancelled_enter),
            on_exit: None,
            on_update: stay,
        },
        StateDescriptor {
            id: StateId::Expired,
            name: "Expired",
            on_enter: Some(expired_enter),
            on_exit: None,
            on_update: stay,
        },
        StateDescriptor {
            id: StateId::Escalated,
            name: "Escalated",
            on_enter: Some(escalated_enter),
            on_exit: None,
            on_update: stay,
        },
        StateDescriptor {
            id: StateId::Dismissed,
            name: "Dismissed",
            on_enter: Some(dismissed_enter),
            on_exit: None,
            on_update: stay,
        },
    ]
}

/// Shared `on_update` for Idle and every terminal state.
fn stay(ctx: &mut WindowContext) -> Option<StateId> {
    if ctx.input != WindowInput::None {
        debug!("WINDOW: closed, ignoring {:?}", ctx.input);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut WindowContext) {
    ctx.outputs = WindowOutputs::all_off();
    ctx.pending = None;
}

// ═══════════════════════════════════════════════════════════════════════════
//  ARMED: counting down, alert running
// ═══════════════════════════════════════════════════════════════════════════

fn armed_enter(ctx: &mut WindowContext) {
    ctx.remaining = ctx.duration_ticks;
    ctx.fired = false;
    ctx.outcome = None;
    ctx.outputs = WindowOutputs {
        ticker_on: true,
        alert_on: true,
        restart: true,
    };
    info!("WINDOW: armed, escalating in {} ticks", ctx.remaining);
}

fn armed_exit(ctx: &mut WindowContext) {
    ctx.teardown();
}

fn armed_update(ctx: &mut WindowContext) -> Option<StateId> {
    match ctx.input {
        WindowInput::Cancel => Some(StateId::Cancelled),
        WindowInput::Escalate => Some(StateId::Escalated),
        WindowInput::Dismiss => Some(StateId::Dismissed),
        WindowInput::Tick => {
            ctx.remaining = ctx.remaining.saturating_sub(1);
            debug!("WINDOW: {} ticks left", ctx.remaining);
            (ctx.remaining == 0).then_some(StateId::Expired)
        }
        WindowInput::None => (ctx.remaining == 0).then_some(StateId::Expired),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Terminal states
// ═══════════════════════════════════════════════════════════════════════════

fn cancelled_enter(ctx: &mut WindowContext) {
    ctx.teardown();
    ctx.pending = None;
    ctx.fire(WindowOutcome::Cancelled);
    info!("WINDOW: cancelled by wearer with {} ticks left", ctx.remaining);
}

fn dismissed_enter(ctx: &mut WindowContext) {
    ctx.teardown();
    ctx.pending = None;
    ctx.fire(WindowOutcome::Dismissed);
    warn!("WINDOW: dismissed externally, no dispatch");
}

fn expired_enter(ctx: &mut WindowContext) {
    ctx.teardown();
    escalate_pending(ctx, WindowOutcome::Expired, "countdown expired");
}

fn escalated_enter(ctx: &mut WindowContext) {
    ctx.teardown();
    escalate_pending(ctx, WindowOutcome::Escalated, "escalated by wearer");
}

fn escalate_pending(
    ctx: &mut WindowContext,
    wrap: fn(crate::model::ImpactEvent) -> WindowOutcome,
    why: &str,
) {
    match ctx.pending.take() {
        Some(ev) => {
            info!("WINDOW: {} ({} ticks left)", why, ctx.remaining);
            ctx.fire(wrap(ev));
        }
        None => {
            warn!("WINDOW: {} with no pending event", why);
            ctx.fired = true;
        }
    }
}
