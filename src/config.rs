//! The `Config` value handed by the CLI boundary to the core (§6).
//!
//! The core never reads process arguments or the environment itself; it
//! only ever sees this struct, which keeps the reactor and handlers
//! trivially unit-testable without going through argument parsing.

use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP ports to listen on, at least one.
    pub ports: Vec<u16>,
    /// Address to bind to; `None` means all interfaces.
    pub bind_ip: Option<IpAddr>,
    pub verbose: bool,
    pub debug: bool,
    /// Liveness thresholds (§4.6). Exposed here, rather than hardcoded,
    /// purely so integration tests can shrink them; the CLI boundary
    /// never sets these away from the defaults.
    pub ping_idle: std::time::Duration,
    pub timeout_idle: std::time::Duration,
    pub sweep_interval: std::time::Duration,
}

pub const DEFAULT_PORT: u16 = 6667;

impl Default for Config {
    fn default() -> Self {
        Config {
            ports: vec![DEFAULT_PORT],
            bind_ip: None,
            verbose: false,
            debug: false,
            ping_idle: std::time::Duration::from_secs(90),
            timeout_idle: std::time::Duration::from_secs(180),
            sweep_interval: std::time::Duration::from_secs(10),
        }
    }
}
