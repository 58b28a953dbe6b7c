//! Crate-level errors for the few fallible startup paths (§7.4).
//!
//! Per-message protocol errors never appear here: they're reported to the
//! offending client as a numeric reply (see `handlers`), not propagated as
//! a `Result::Err`.

use std::fmt;
use std::io;
use std::net::AddrParseError;

#[derive(Debug)]
pub enum Error {
    /// A `--listen` value wasn't a valid IP address.
    InvalidAddress(String, AddrParseError),
    /// A `--ports` value wasn't a valid TCP port.
    InvalidPort(String),
    /// No ports were left to listen on.
    NoPorts,
    /// Binding a listening socket failed.
    Bind(u16, io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAddress(s, _) => write!(f, "invalid --listen address: {:?}", s),
            Error::InvalidPort(s) => write!(f, "invalid port: {:?}", s),
            Error::NoPorts => write!(f, "no ports to listen on"),
            Error::Bind(port, _) => write!(f, "could not bind port {}", port),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidAddress(_, e) => Some(e),
            Error::Bind(_, e) => Some(e),
            Error::InvalidPort(_) | Error::NoPorts => None,
        }
    }
}
