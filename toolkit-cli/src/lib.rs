//! Support library for the toolkit CLI binary.
//!
//! Exposes the dispatcher, logging setup, and bundled commands so integration
//! tests can drive the command pipeline without forking a subprocess.

pub mod cli;
pub mod logging;
pub mod tools;
