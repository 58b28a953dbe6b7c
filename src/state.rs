//! The shared core: server identity plus the registry, wrapped for sharing
//! across every task on the current-thread executor (§5, §9 "Registry handle").

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use wireline_proto::Message;

use crate::config::Config;
use crate::handlers;
use crate::registry::Registry;
use crate::session::{Outgoing, SessionId};

/// Everything about the server that isn't the network layer itself.
pub struct Core {
    pub domain: String,
    pub created_at: String,
    pub registry: Registry,
    pub ping_idle: Duration,
    pub timeout_idle: Duration,
}

impl Core {
    pub fn new(domain: String, created_at: String, config: &Config) -> Self {
        Core {
            domain,
            created_at,
            registry: Registry::new(),
            ping_idle: config.ping_idle,
            timeout_idle: config.timeout_idle,
        }
    }

    /// Best-effort delivery of an already-framed (CRLF-terminated) line to
    /// one session. Silently drops the send if the session is gone or its
    /// connection task has already hung up; the caller never needs to care.
    pub fn deliver(&mut self, id: SessionId, bytes: Vec<u8>) {
        if let Some(session) = self.registry.session(id) {
            let outgoing = session.outgoing().clone();
            if outgoing.pending_len() + bytes.len() > crate::session::MAX_OUTGOING_BYTES {
                drop(outgoing);
                self.disconnect(id, "send queue exceeded");
                return;
            }
            let _ = outgoing.send(bytes);
        }
    }

    /// Disconnect is the single destruction path (§4.7). Appends
    /// `ERROR :<reason>` to the session's own queue, then removes it (and
    /// its channel/nickname entries) from the registry. Idempotent: a
    /// session that's already gone is simply not found (P6).
    pub fn disconnect(&mut self, id: SessionId, reason: &str) {
        if let Some(session) = self.registry.session(id) {
            let mut buf = wireline_proto::Buffer::new();
            buf.message("", "ERROR").trailing_param(reason);
            let _ = session.outgoing().send(buf.into_string().into_bytes());
        } else {
            return;
        }

        let removed = match self.registry.remove_session(id) {
            Some(s) => s,
            None => return,
        };

        if let Some(nick) = removed.nickname() {
            let line = {
                let mut buf = wireline_proto::Buffer::new();
                buf.message(&format!("{}!{}@{}", nick, removed.user().unwrap_or("*"), removed.peer_host()), "QUIT")
                    .trailing_param(reason);
                buf.into_string().into_bytes()
            };
            for chan_name in removed.channels() {
                if let Some(chan) = self.registry.channel(chan_name) {
                    for member in chan.members().collect::<Vec<_>>() {
                        self.deliver(member, line.clone());
                    }
                }
            }
        }
    }

    /// The reactor calls this for every framed line read from a session.
    pub fn handle_line(&mut self, id: SessionId, line: &str) {
        let message = match Message::parse(line) {
            Some(m) => m,
            None => return,
        };
        let established = match self.registry.session(id) {
            Some(session) => session.handler().is_established(),
            None => return,
        };
        if established {
            handlers::commands::dispatch(self, id, message);
        } else {
            handlers::registration::dispatch(self, id, message);
        }
        if let Some(session) = self.registry.session_mut(id) {
            session.touch();
        }
    }

    /// Runs one liveness pass over every session (§4.6). Returns the ids
    /// disconnected, purely so tests can assert on the sweep's effect.
    pub fn sweep_liveness(&mut self, now: Instant) -> Vec<SessionId> {
        let mut disconnected = Vec::new();
        for id in self.registry.session_ids() {
            let session = match self.registry.session(id) {
                Some(s) => s,
                None => continue,
            };
            let idle = now.saturating_duration_since(session.last_activity_at());
            if idle > self.timeout_idle {
                self.disconnect(id, "ping timeout");
                disconnected.push(id);
            } else if idle > self.ping_idle && !session.ping_outstanding() {
                if session.handler().is_established() {
                    let domain = self.domain.clone();
                    let mut buf = wireline_proto::Buffer::new();
                    buf.message(&domain, "PING").trailing_param(&domain);
                    self.deliver(id, buf.into_string().into_bytes());
                    if let Some(session) = self.registry.session_mut(id) {
                        session.set_ping_outstanding();
                    }
                } else {
                    self.disconnect(id, "ping timeout");
                    disconnected.push(id);
                }
            }
        }
        disconnected
    }
}

/// A cheaply-cloneable handle to the shared core, passed to every task
/// spawned on the current-thread executor.
#[derive(Clone)]
pub struct State(pub Rc<RefCell<Core>>);

impl State {
    pub fn new(core: Core) -> Self {
        State(Rc::new(RefCell::new(core)))
    }

    pub fn peer_joined(&self, peer_host: String, peer_port: u16, outgoing: Outgoing) -> SessionId {
        self.0.borrow_mut().registry.insert_session(peer_host, peer_port, outgoing)
    }

    pub fn handle_line(&self, id: SessionId, line: &str) {
        self.0.borrow_mut().handle_line(id, line);
    }

    pub fn disconnect(&self, id: SessionId, reason: &str) {
        self.0.borrow_mut().disconnect(id, reason);
    }

    pub fn sweep_liveness(&self, now: Instant) -> Vec<SessionId> {
        self.0.borrow_mut().sweep_liveness(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Outgoing;

    fn test_core() -> Core {
        Core::new("srv.test".into(), "today".into(), &Config::default())
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(bytes) = rx.try_recv() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            lines.extend(text.split("\r\n").filter(|s| !s.is_empty()).map(|s| s.to_owned()));
        }
        lines
    }

    fn register(core: &mut Core, rx: &mut tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>, nick: &str) -> SessionId {
        let (outgoing, new_rx, _pending) = Outgoing::new();
        *rx = new_rx;
        let id = core.registry.insert_session("host".into(), 1, outgoing);
        core.handle_line(id, &format!("NICK {}", nick));
        core.handle_line(id, &format!("USER {} * * :{}", nick, nick));
        id
    }

    #[test]
    fn registration_emits_welcome_then_lusers() {
        let mut core = test_core();
        let (outgoing, mut rx, _pending) = Outgoing::new();
        let id = core.registry.insert_session("host".into(), 1, outgoing);
        core.handle_line(id, "NICK alice");
        core.handle_line(id, "USER alice * * :Alice");

        let lines = drain(&mut rx);
        assert!(lines[0].contains(" 001 alice :"));
        assert!(lines[1].contains(" 002 "));
        assert!(lines[2].contains(" 003 "));
        assert!(lines[3].contains(" 251 "));
        assert!(core.registry.session(id).unwrap().handler().is_established());
    }

    #[test]
    fn nickname_collision_keeps_second_client_unregistered() {
        let mut core = test_core();
        let mut rx1 = tokio::sync::mpsc::unbounded_channel().1;
        register(&mut core, &mut rx1, "bob");

        let (outgoing2, mut rx2, _pending) = Outgoing::new();
        let id2 = core.registry.insert_session("host".into(), 2, outgoing2);
        core.handle_line(id2, "NICK bob");

        let lines = drain(&mut rx2);
        assert!(lines[0].contains(" 433 * bob :"));
        assert!(!core.registry.session(id2).unwrap().handler().is_established());
    }

    #[test]
    fn channel_privmsg_is_delivered_to_other_member_only() {
        let mut core = test_core();
        let mut rx_alice = tokio::sync::mpsc::unbounded_channel().1;
        let alice = register(&mut core, &mut rx_alice, "alice");
        let mut rx_bob = tokio::sync::mpsc::unbounded_channel().1;
        let bob = register(&mut core, &mut rx_bob, "bob");

        core.handle_line(alice, "JOIN #room");
        drain(&mut rx_alice);
        core.handle_line(bob, "JOIN #room");
        drain(&mut rx_bob);
        drain(&mut rx_alice);

        core.handle_line(alice, "PRIVMSG #room :hi");
        let bob_lines = drain(&mut rx_bob);
        let alice_lines = drain(&mut rx_alice);
        assert_eq!(bob_lines, vec!["PRIVMSG #room :hi".to_owned()]
            .into_iter()
            .map(|tail| format!(":alice!alice@host {tail}"))
            .collect::<Vec<_>>());
        assert!(alice_lines.is_empty());
    }

    #[test]
    fn bad_ping_then_good_ping() {
        let mut core = test_core();
        let mut rx = tokio::sync::mpsc::unbounded_channel().1;
        let id = register(&mut core, &mut rx, "carol");
        drain(&mut rx);

        core.handle_line(id, "PING");
        let lines = drain(&mut rx);
        assert!(lines[0].contains(" 409 carol :"));

        core.handle_line(id, "PING :fisk");
        let lines = drain(&mut rx);
        assert!(lines[0].ends_with("PONG srv.test :fisk"));
    }

    #[test]
    fn rejoining_with_different_case_is_a_no_op() {
        let mut core = test_core();
        let mut rx = tokio::sync::mpsc::unbounded_channel().1;
        let id = register(&mut core, &mut rx, "frank");
        drain(&mut rx);

        core.handle_line(id, "JOIN #room");
        drain(&mut rx);
        core.handle_line(id, "JOIN #ROOM");
        let lines = drain(&mut rx);
        assert!(lines.is_empty(), "re-joining under a different case should be a no-op, got {lines:?}");
    }

    #[test]
    fn list_filter_matches_regardless_of_case() {
        let mut core = test_core();
        let mut rx = tokio::sync::mpsc::unbounded_channel().1;
        let id = register(&mut core, &mut rx, "gina");
        drain(&mut rx);

        core.handle_line(id, "JOIN #room");
        drain(&mut rx);

        core.handle_line(id, "LIST #ROOM");
        let lines = drain(&mut rx);
        assert!(lines.iter().any(|l| l.contains(" 322 ") && l.contains("#room")));
        assert!(lines.iter().any(|l| l.contains(" 323 ")));
    }

    #[test]
    fn quit_with_no_message_defaults_to_the_nickname() {
        let mut core = test_core();
        let mut rx = tokio::sync::mpsc::unbounded_channel().1;
        let id = register(&mut core, &mut rx, "erin");
        drain(&mut rx);

        core.handle_line(id, "QUIT");
        let lines = drain(&mut rx);
        assert!(lines[0].ends_with("ERROR :erin"));
        assert!(core.registry.session(id).is_none());
    }

    #[test]
    fn sweep_disconnects_only_past_the_timeout() {
        let mut core = test_core();
        core.timeout_idle = Duration::from_secs(0);
        let mut rx = tokio::sync::mpsc::unbounded_channel().1;
        let id = register(&mut core, &mut rx, "dave");
        drain(&mut rx);

        let disconnected = core.sweep_liveness(Instant::now());
        assert_eq!(disconnected, vec![id]);
        assert!(core.registry.session(id).is_none());
    }
}
