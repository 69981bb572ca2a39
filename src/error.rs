//! Unified error types for impactguard.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the controller's error handling uniform.  Dispatch-step failures never
//! travel this far: the orchestrator swallows them at the step boundary.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Scan/connect against the wearable failed.
    Link(LinkError),
    /// A telemetry frame could not be decoded.
    Decode(DecodeError),
    /// An external provider (location, store, telephony) failed.
    Provider(ProviderError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Provider(e) => write!(f, "provider: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Bluetooth / location permissions were not granted.
    PermissionDenied,
    /// The radio stack could not be initialised.
    LinkUnavailable,
    /// Connect, service discovery or subscribe failed.
    ConnectionFailed,
    /// Synthetic injection requested outside demo mode.
    NotInDemoMode,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "Bluetooth permissions denied"),
            Self::LinkUnavailable => write!(f, "radio stack unavailable"),
            Self::ConnectionFailed => write!(f, "connection failed"),
            Self::NotInDemoMode => write!(f, "demo mode is off"),
        }
    }
}

impl std::error::Error for LinkError {}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Frame decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Notification carried no bytes.
    Empty,
    /// Payload exceeds the configured frame limit.
    TooLarge,
    /// Payload is not valid base64.
    Base64,
    /// Decoded bytes are not UTF-8.
    Utf8,
    /// Text is not a JSON object of the expected shape.
    Json,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty payload"),
            Self::TooLarge => write!(f, "payload too large"),
            Self::Base64 => write!(f, "invalid base64"),
            Self::Utf8 => write!(f, "invalid UTF-8"),
            Self::Json => write!(f, "invalid JSON frame"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Failure of an external collaborator during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderError {
    /// Capability missing on this platform.
    Unavailable,
    /// Call did not complete inside its time budget.
    Timeout,
    /// User or platform refused the capability.
    Denied,
    /// Backend reported an error.
    Failed(&'static str),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "provider unavailable"),
            Self::Timeout => write!(f, "provider timed out"),
            Self::Denied => write!(f, "provider denied"),
            Self::Failed(msg) => write!(f, "provider failed: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for Error {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
