//! Support library for the `dhngen` binary.
//!
//! Exposes the CLI and logging modules so tests can drive the command
//! pipeline without spawning a subprocess.

pub mod cli;
pub mod logging;
