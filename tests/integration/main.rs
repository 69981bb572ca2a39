//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem through
//! the public API against mock adapters.  Everything runs on the host.

mod flow_tests;
mod mock_platform;
