use std::process::ExitCode;

use tokio::task::LocalSet;

use wireline::config::Config;
use wireline::state::{Core, State};
use wireline::{cli, reactor};

fn main() -> ExitCode {
    let config = match cli::parse_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("wireline: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logger(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to start the async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let local = LocalSet::new();
    let domain = server_domain(&config);
    let created_at = chrono::Local::now().format("%a %b %e %Y at %H:%M:%S %Z").to_string();
    let state = State::new(Core::new(domain, created_at, &config));

    local.block_on(&runtime, async move {
        match reactor::run(state, config).await {
            Ok(()) => {
                let _ = tokio::signal::ctrl_c().await;
                log::info!("received Ctrl-C, shutting down");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{e}");
                ExitCode::FAILURE
            }
        }
    })
}

/// Resolves the bind address to its fully qualified domain name (§6),
/// falling back to the bare address if reverse resolution fails.
fn server_domain(config: &Config) -> String {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    let ip = config.bind_ip.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let fqdn = match dns_lookup::getnameinfo(&SocketAddr::new(ip, 0), 0) {
        Ok((host, _service)) => host,
        Err(e) => {
            log::warn!("could not resolve a hostname for {ip}: {e}");
            ip.to_string()
        }
    };
    fqdn.chars().take(63).collect()
}

fn init_logger(config: &Config) {
    let level = if config.debug {
        log::LevelFilter::Debug
    } else if config.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();
}
