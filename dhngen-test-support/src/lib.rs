//! Shared test utilities used across dhngen crates.
//!
//! Hosts a `tracing` layer that captures spans and events for assertions and
//! the environment-driven run profile shared by the property suites.

pub mod profile;
pub mod tracing;
