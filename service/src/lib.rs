//! Process-level setup shared by the `voice_router` binaries: command line and
//! environment configuration, and console logging.

pub mod config;
pub mod logging;
