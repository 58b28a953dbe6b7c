//! Per-connection state (§3 "Session").

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use tokio::sync::mpsc;

use wireline_proto::Framer;

/// Stable handle to a session, backed by its slot in the registry's
/// `Slab<Session>` (the "connection handle" of §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(usize);

impl SessionId {
    pub fn from_raw(key: usize) -> Self {
        SessionId(key)
    }

    pub fn to_raw(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two states of the per-session command handler (§4.3/§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Registering,
    Established,
}

impl HandlerState {
    pub fn is_established(self) -> bool {
        matches!(self, HandlerState::Established)
    }
}

/// Maximum number of bytes a session's outgoing queue may hold before it
/// is disconnected with `"send queue exceeded"` (§5).
pub const MAX_OUTGOING_BYTES: usize = 64 * 1024;

/// The sending half of a session's outgoing-message queue, plus a shared
/// counter of how many bytes are currently buffered in it.
///
/// The receiving half lives in the connection task that owns the
/// `TcpStream`; dropping the sender (by removing the `Session` from the
/// registry) is what tells that task to close the socket once whatever
/// is already queued has drained (§4.7).
#[derive(Clone)]
pub struct Outgoing {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    pending: Rc<Cell<usize>>,
}

impl Outgoing {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>, Rc<Cell<usize>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Rc::new(Cell::new(0));
        (
            Outgoing {
                tx,
                pending: pending.clone(),
            },
            rx,
            pending,
        )
    }

    pub fn pending_len(&self) -> usize {
        self.pending.get()
    }

    /// Queues `data` for the owning connection task to write. Returns
    /// `Err` if the receiver is already gone (the session is mid-teardown).
    pub fn send(&self, data: Vec<u8>) -> Result<(), ()> {
        self.pending.set(self.pending.get() + data.len());
        self.tx.send(data).map_err(|_| ())
    }
}

pub struct Session {
    peer_host: String,
    peer_port: u16,
    framer: Framer,
    outgoing: Outgoing,
    nickname: Option<String>,
    user: Option<String>,
    real_name: Option<String>,
    /// Folded channel name -> canonical channel name, mirroring the
    /// channel's own membership set (Invariant 2, §3).
    channels: HashMap<String, String>,
    last_activity_at: Instant,
    ping_outstanding: bool,
    handler: HandlerState,
}

impl Session {
    pub fn new(peer_host: String, peer_port: u16, outgoing: Outgoing) -> Self {
        Session {
            peer_host,
            peer_port,
            framer: Framer::new(),
            outgoing,
            nickname: None,
            user: None,
            real_name: None,
            channels: HashMap::new(),
            last_activity_at: Instant::now(),
            ping_outstanding: false,
            handler: HandlerState::Registering,
        }
    }

    pub fn peer_host(&self) -> &str {
        &self.peer_host
    }

    pub fn peer_port(&self) -> u16 {
        self.peer_port
    }

    pub fn framer_mut(&mut self) -> &mut Framer {
        &mut self.framer
    }

    pub fn outgoing(&self) -> &Outgoing {
        &self.outgoing
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    pub fn set_nickname(&mut self, nick: String) {
        self.nickname = Some(nick);
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn real_name(&self) -> Option<&str> {
        self.real_name.as_deref()
    }

    pub fn set_user(&mut self, user: String, real_name: String) {
        self.user = Some(user);
        self.real_name = Some(real_name);
    }

    /// `nick!user@host`, used as the sender prefix on routed messages (§4.4).
    pub fn prefix(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nickname.as_deref().unwrap_or("*"),
            self.user.as_deref().unwrap_or("*"),
            self.peer_host,
        )
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.values().map(|s| s.as_str())
    }

    pub fn is_in_channel(&self, folded_name: &str) -> bool {
        self.channels.contains_key(folded_name)
    }

    pub fn add_channel(&mut self, folded_name: String, canonical_name: String) {
        self.channels.insert(folded_name, canonical_name);
    }

    pub fn remove_channel(&mut self, folded_name: &str) {
        self.channels.remove(folded_name);
    }

    pub fn handler(&self) -> HandlerState {
        self.handler
    }

    pub fn set_established(&mut self) {
        self.handler = HandlerState::Established;
    }

    pub fn is_registered(&self) -> bool {
        self.nickname.is_some() && self.user.is_some()
    }

    pub fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Instant::now();
        self.ping_outstanding = false;
    }

    pub fn ping_outstanding(&self) -> bool {
        self.ping_outstanding
    }

    pub fn set_ping_outstanding(&mut self) {
        self.ping_outstanding = true;
    }
}
