//! Fixed-position location provider.
//!
//! The host has no GNSS; this adapter reports a configured coordinate, or
//! fails the way a phone does when location services are off.

use core::time::Duration;

use log::debug;

use crate::app::ports::LocationPort;
use crate::error::ProviderError;
use crate::model::Coordinate;

#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    fix: Option<Coordinate>,
}

impl FixedLocation {
    pub fn new(at: Coordinate) -> Self {
        Self { fix: Some(at) }
    }

    /// Location services off: every request is denied.
    pub fn denied() -> Self {
        Self { fix: None }
    }
}

impl LocationPort for FixedLocation {
    fn current_coordinate(
        &mut self,
        high_accuracy: bool,
        timeout: Duration,
    ) -> Result<Coordinate, ProviderError> {
        debug!(
            "LOCATION | request (high_accuracy={}, budget {:?})",
            high_accuracy, timeout
        );
        self.fix.ok_or(ProviderError::Denied)
    }
}
