//! Log-backed sensory alert and speech adapters.
//!
//! The host has no vibration motor or speech engine, so these record what
//! a phone would do and log it.

use log::info;

use crate::app::ports::{AnnouncerPort, HapticPort};
use crate::config::HapticPattern;
use crate::error::ProviderError;

/// Vibration stand-in.
#[derive(Debug, Default)]
pub struct LogHaptics {
    active: Option<(HapticPattern, bool)>,
    starts: u32,
}

impl LogHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a repeating pattern is currently running.
    pub fn is_repeating(&self) -> bool {
        matches!(self.active, Some((_, true)))
    }

    pub fn start_count(&self) -> u32 {
        self.starts
    }
}

impl HapticPort for LogHaptics {
    fn start(&mut self, pattern: &HapticPattern, repeat: bool) {
        self.starts += 1;
        info!(
            "HAPTIC | {:?} ms{}",
            pattern.as_slice(),
            if repeat { " (repeat)" } else { "" }
        );
        self.active = Some((pattern.clone(), repeat));
    }

    fn stop(&mut self) {
        if self.active.take().is_some() {
            info!("HAPTIC | stop");
        }
    }
}

/// Speech stand-in; keeps everything it was asked to say.
#[derive(Debug, Default)]
pub struct LogAnnouncer {
    spoken: Vec<String>,
}

impl LogAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }
}

impl AnnouncerPort for LogAnnouncer {
    fn speak(&mut self, text: &str) -> Result<(), ProviderError> {
        info!("SPEAK | \"{}\"", text);
        self.spoken.push(text.to_owned());
        Ok(())
    }
}
