//! Application core: domain orchestration behind port traits.
//!
//! This module wires the impact guard together: link manager, confirmation
//! window and dispatch orchestrator.  All interaction with radios, timers,
//! stores and phones happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without a device.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
