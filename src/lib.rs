//! ImpactGuard library.
//!
//! Wearable impact detection with a cancellable confirmation window and a
//! best-effort emergency dispatch.  Exposes the domain core and the host
//! adapters for the demo binary and integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod fsm;
pub mod link;
pub mod model;
pub mod nearby;
pub mod window;
