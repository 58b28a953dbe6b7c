//! Server-wide indexes: connections, nicknames, channels (§3 "Registry").

use std::collections::HashMap;

use slab::Slab;
use wireline_proto::Folded;

use crate::channel::Channel;
use crate::session::{Outgoing, Session, SessionId};

/// Owns the three mappings described in §3 and keeps Invariants 2-4 (no two
/// sessions share a folded nickname; membership is bidirectional; channels
/// are removed the moment they go empty) true across every mutation.
#[derive(Default)]
pub struct Registry {
    sessions: Slab<Session>,
    nicknames: HashMap<Folded, SessionId>,
    channels: HashMap<Folded, Channel>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn insert_session(&mut self, peer_host: String, peer_port: u16, outgoing: Outgoing) -> SessionId {
        let session = Session::new(peer_host, peer_port, outgoing);
        SessionId::from_raw(self.sessions.insert(session))
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id.to_raw())
    }

    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id.to_raw())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|(k, _)| SessionId::from_raw(k)).collect()
    }

    /// Looks up a session by its current (folded) nickname.
    pub fn find_nickname(&self, nick: &str) -> Option<SessionId> {
        self.nicknames.get(&Folded::new(nick)).copied()
    }

    /// Registers `nick` for `id`, evicting any previous folded-key entry
    /// that pointed at `id` (used when a session renames itself).
    pub fn set_nickname(&mut self, id: SessionId, nick: &str) {
        if let Some(session) = self.sessions.get(id.to_raw()) {
            if let Some(old) = session.nickname() {
                self.nicknames.remove(&Folded::new(old));
            }
        }
        self.nicknames.insert(Folded::new(nick), id);
        if let Some(session) = self.sessions.get_mut(id.to_raw()) {
            session.set_nickname(nick.to_owned());
        }
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&Folded::new(name))
    }

    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.values().map(|c| c.name().to_owned()).collect();
        names.sort();
        names
    }

    /// Adds `id` to the channel `canonical_name` (creating it if needed) and
    /// records the membership on the session side too (Invariant 3).
    pub fn join_channel(&mut self, id: SessionId, canonical_name: &str) {
        let folded = Folded::new(canonical_name);
        self.channels
            .entry(folded.clone())
            .or_insert_with(|| Channel::new(canonical_name.to_owned()))
            .add_member(id);
        if let Some(session) = self.sessions.get_mut(id.to_raw()) {
            session.add_channel(folded.as_str().to_owned(), canonical_name.to_owned());
        }
    }

    /// Removes `id` from the channel `name`, deleting the channel if it's
    /// now empty (Invariant 4). Returns the channel's canonical name and
    /// whether it was destroyed, or `None` if the channel didn't exist.
    pub fn leave_channel(&mut self, id: SessionId, name: &str) -> Option<(String, bool)> {
        let folded = Folded::new(name);
        let (canonical, now_empty) = {
            let chan = self.channels.get_mut(&folded)?;
            let now_empty = chan.remove_member(id);
            (chan.name().to_owned(), now_empty)
        };
        if now_empty {
            self.channels.remove(&folded);
        }
        if let Some(session) = self.sessions.get_mut(id.to_raw()) {
            session.remove_channel(folded.as_str());
        }
        Some((canonical, now_empty))
    }

    /// Removes every trace of `id` from the registry: its channel
    /// memberships (destroying any channel that becomes empty), its
    /// nickname, and the session slot itself (§4.7 disconnect). Idempotent:
    /// a second call with the same `id` is a no-op (P6).
    pub fn remove_session(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.try_remove(id.to_raw())?;
        if let Some(nick) = session.nickname() {
            if self.nicknames.get(&Folded::new(nick)) == Some(&id) {
                self.nicknames.remove(&Folded::new(nick));
            }
        }
        for folded_name in session.channels().map(|c| Folded::new(c).as_str().to_owned()).collect::<Vec<_>>() {
            if let Some(chan) = self.channels.get_mut(&Folded::new(&folded_name)) {
                if chan.remove_member(id) {
                    self.channels.remove(&Folded::new(&folded_name));
                }
            }
        }
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_outgoing() -> Outgoing {
        Outgoing::new().0
    }

    #[test]
    fn nickname_round_trips_and_is_unique_per_fold() {
        let mut reg = Registry::new();
        let alice = reg.insert_session("host".into(), 1, fake_outgoing());
        reg.set_nickname(alice, "Alice");
        assert_eq!(reg.find_nickname("ALICE"), Some(alice));
        assert_eq!(reg.session(alice).unwrap().nickname(), Some("Alice"));
    }

    #[test]
    fn renaming_evicts_the_old_folded_key() {
        let mut reg = Registry::new();
        let alice = reg.insert_session("host".into(), 1, fake_outgoing());
        reg.set_nickname(alice, "alice");
        reg.set_nickname(alice, "alice2");
        assert_eq!(reg.find_nickname("alice"), None);
        assert_eq!(reg.find_nickname("alice2"), Some(alice));
    }

    #[test]
    fn joining_and_leaving_keeps_membership_symmetric() {
        let mut reg = Registry::new();
        let alice = reg.insert_session("host".into(), 1, fake_outgoing());
        reg.join_channel(alice, "#room");
        assert!(reg.channel("#room").unwrap().has_member(alice));
        assert!(reg.session(alice).unwrap().is_in_channel("#room"));

        let (name, destroyed) = reg.leave_channel(alice, "#room").unwrap();
        assert_eq!(name, "#room");
        assert!(destroyed);
        assert!(reg.channel("#room").is_none());
        assert!(!reg.session(alice).unwrap().is_in_channel("#room"));
    }

    #[test]
    fn removing_a_session_cleans_up_nickname_and_channels() {
        let mut reg = Registry::new();
        let alice = reg.insert_session("host".into(), 1, fake_outgoing());
        reg.set_nickname(alice, "alice");
        reg.join_channel(alice, "#room");

        assert!(reg.remove_session(alice).is_some());
        assert_eq!(reg.find_nickname("alice"), None);
        assert!(reg.channel("#room").is_none());
        assert!(reg.session(alice).is_none());

        // Idempotent: removing again is a no-op, not a panic (P6).
        assert!(reg.remove_session(alice).is_none());
    }

    #[test]
    fn channel_survives_while_any_member_remains() {
        let mut reg = Registry::new();
        let alice = reg.insert_session("a".into(), 1, fake_outgoing());
        let bob = reg.insert_session("b".into(), 2, fake_outgoing());
        reg.join_channel(alice, "#room");
        reg.join_channel(bob, "#room");

        let (_, destroyed) = reg.leave_channel(alice, "#room").unwrap();
        assert!(!destroyed);
        assert!(reg.channel("#room").is_some());
    }
}
