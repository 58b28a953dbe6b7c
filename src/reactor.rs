//! The cooperative, single-OS-thread connection loop (§4.6).
//!
//! Everything here runs `spawn_local` on one `LocalSet`/current-thread
//! runtime: one task per listening port accepting connections, one task
//! per accepted connection, and one periodic liveness-sweep task. No
//! registry mutation ever happens off that thread, so `State` needs no
//! synchronization beyond `Rc<RefCell<_>>`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::config::Config;
use crate::error::Error;
use crate::session::{Outgoing, SessionId};
use crate::state::State;

const READ_CHUNK: usize = 1024;

/// Binds every configured port, then drives the reactor until the process
/// is asked to stop (Ctrl-C). Returns an [`Error`] immediately if any bind
/// fails (§7.4, a fatal startup error).
pub async fn run(state: State, config: Config) -> Result<(), Error> {
    let bind_ip = config.bind_ip.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let mut listeners = Vec::with_capacity(config.ports.len());
    for &port in &config.ports {
        let addr = SocketAddr::new(bind_ip, port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Bind(port, e))?;
        log::info!("listening on {addr}");
        listeners.push(listener);
    }

    for listener in listeners {
        let state = state.clone();
        tokio::task::spawn_local(accept_loop(listener, state));
    }

    let sweep_state = state.clone();
    let sweep_interval = config.sweep_interval;
    tokio::task::spawn_local(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            let disconnected = sweep_state.sweep_liveness(std::time::Instant::now());
            if !disconnected.is_empty() {
                log::debug!("liveness sweep disconnected {} session(s)", disconnected.len());
            }
        }
    });

    Ok(())
}

async fn accept_loop(listener: TcpListener, state: State) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                let state = state.clone();
                tokio::task::spawn_local(serve_connection(socket, peer, state));
            }
            Err(e) => {
                log::warn!("accept failed: {e}");
            }
        }
    }
}

/// Owns one accepted connection end to end: registers a session, then
/// alternates between reading the socket and draining its outgoing queue
/// until either side closes (§4.6 step 2). Exposed (not just
/// crate-private) so integration tests can drive it directly against a
/// listener bound to an ephemeral port.
pub async fn serve_connection(mut socket: TcpStream, peer: SocketAddr, state: State) {
    let (outgoing, mut rx, _pending) = Outgoing::new();
    let id = state.peer_joined(peer.ip().to_string(), peer.port(), outgoing);
    log::info!("{id} connected from {peer}");

    let mut buf = [0u8; READ_CHUNK];
    'connection: loop {
        tokio::select! {
            read = socket.read(&mut buf) => {
                match read {
                    Ok(0) => {
                        state.disconnect(id, "connection closed");
                        drain_and_close(&mut socket, &mut rx).await;
                        break 'connection;
                    }
                    Ok(n) => {
                        let lines = feed_and_frame(&state, id, &buf[..n]);
                        for line in lines {
                            state.handle_line(id, &line);
                        }
                    }
                    Err(e) => {
                        log::debug!("{id} read error: {e}");
                        state.disconnect(id, "read error");
                        drain_and_close(&mut socket, &mut rx).await;
                        break 'connection;
                    }
                }
            }
            item = rx.recv() => {
                match item {
                    Some(bytes) => {
                        if let Err(e) = socket.write_all(&bytes).await {
                            log::debug!("{id} write error: {e}");
                            break 'connection;
                        }
                    }
                    None => break 'connection,
                }
            }
        }
    }

    let _ = socket.shutdown().await;
    log::info!("{id} disconnected");
}

/// Drains whatever's left in a session's outgoing queue (normally just the
/// `ERROR` line `disconnect` just enqueued) and writes it out best-effort
/// before the socket is closed (§4.7).
async fn drain_and_close(socket: &mut TcpStream, rx: &mut tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = rx.recv().await {
        if socket.write_all(&bytes).await.is_err() {
            break;
        }
    }
}

/// Feeds freshly-read bytes into the session's framer and extracts every
/// complete line now available. The inbound buffer is unbounded by design
/// (§5): only the outbound queue is capped.
fn feed_and_frame(state: &State, id: SessionId, bytes: &[u8]) -> Vec<String> {
    let mut core = state.0.borrow_mut();
    match core.registry.session_mut(id) {
        Some(session) => {
            session.framer_mut().feed(bytes);
            session.framer_mut().frame_lines()
        }
        None => Vec::new(),
    }
}
