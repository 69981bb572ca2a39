//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  StateTable                                               │
//! │  ┌───────────┬───────────┬──────────┬───────────────────┐ │
//! │  │ StateId   │ on_enter  │ on_exit  │ on_update         │ │
//! │  ├───────────┼───────────┼──────────┼───────────────────┤ │
//! │  │ Idle      │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Armed     │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  │ Cancelled │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Expired   │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Escalated │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Dismissed │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  └───────────┴───────────┴──────────┴───────────────────┘ │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut WindowContext`.

pub mod context;
pub mod states;

use context::WindowContext;
use log::debug;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state of the confirmation window.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Armed = 1,
    Cancelled = 2,
    Expired = 3,
    Escalated = 4,
    Dismissed = 5,
}

impl StateId {
    /// Total number of states, sizes the table array.
    pub const COUNT: usize = 6;

    /// Convert a table index back to `StateId`.  Out-of-range indices
    /// assert in debug builds and map to `Dismissed` (inert) in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Armed,
            2 => Self::Cancelled,
            3 => Self::Expired,
            4 => Self::Escalated,
            5 => Self::Dismissed,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Dismissed
            }
        }
    }

    /// Terminal states close the window; only a new arming leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Expired | Self::Escalated | Self::Dismissed
        )
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut WindowContext);

/// Signature for the per-step update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut WindowContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    /// Steps executed since construction.
    step_count: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            step_count: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut WindowContext) {
        debug!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Run `on_update` for the current state and follow any transition.
    pub fn step(&mut self, ctx: &mut WindowContext) {
        self.step_count += 1;
        let next = (self.table[self.current].on_update)(ctx);
        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Jump to `next` regardless of what `on_update` would return.
    /// A no-op when already there; see [`reenter`](Self::reenter).
    pub fn force_transition(&mut self, next: StateId, ctx: &mut WindowContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// Run `on_exit` then `on_enter` of the current state again.
    pub fn reenter(&mut self, ctx: &mut WindowContext) {
        let name = self.table[self.current].name;
        debug!("FSM re-entering: {}", name);
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut WindowContext) {
        let next_idx = next_id as usize;

        debug!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
