//! The CLI front end: turns process arguments into a [`Config`].
//!
//! Deliberately thin — per §1 this is an external collaborator to the
//! connection-and-routing core, not part of its tested surface.

use crate::config::Config;
use crate::error::Error;

/// Parses arguments in the style `--ports 6667,6668 --listen 0.0.0.0 --verbose --debug`.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Config, Error> {
    let mut config = Config::default();
    let mut ports = Vec::new();

    let mut args = args.into_iter().peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ports" => {
                let value = args.next().unwrap_or_default();
                ports = parse_ports(&value)?;
            }
            "--listen" => {
                let value = args.next().unwrap_or_default();
                let ip = value
                    .parse()
                    .map_err(|e| Error::InvalidAddress(value.clone(), e))?;
                config.bind_ip = Some(ip);
            }
            "--verbose" => config.verbose = true,
            "--debug" => {
                config.debug = true;
                config.verbose = true;
            }
            _ => {
                log::warn!("Ignoring unrecognized argument {:?}", arg);
            }
        }
    }

    if !ports.is_empty() {
        config.ports = ports;
    }
    if config.ports.is_empty() {
        return Err(Error::NoPorts);
    }

    Ok(config)
}

fn parse_ports(value: &str) -> Result<Vec<u16>, Error> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u16>().map_err(|_| Error::InvalidPort(s.to_owned())))
        .collect()
}
