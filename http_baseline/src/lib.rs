//! HTTP baseline load test.
//!
//! A weighted mix of `GET /`, `GET /health` and `POST /echo` issued by simulated users
//! to establish baseline latency and throughput for a target server. The traffic
//! profile lives in [`scenario`]; the [`loadmix`] engine runs it.

/// Command-line configuration
pub mod config;
/// The baseline traffic profile
pub mod scenario;
/// Logging setup
pub mod telemetry;

pub use scenario::baseline;
