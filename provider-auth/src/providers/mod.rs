//! Default endpoints for the supported vendors.

mod config;

pub use config::{assemblyai_endpoints, deepgram_endpoints, endpoints_for, gladia_endpoints, Endpoints};
