//! Channel data (§4.5).

use std::collections::HashSet;

use crate::session::SessionId;

/// A named set of members, with an optional topic and optional join key.
///
/// No operator privileges, no modes beyond the key: see §1 Non-goals.
pub struct Channel {
    /// The name as first used to create the channel, preserved for
    /// display even though lookups go through its folded form.
    name: String,
    members: HashSet<SessionId>,
    topic: String,
    key: Option<String>,
}

impl Channel {
    pub fn new(name: String) -> Self {
        Channel {
            name,
            members: HashSet::new(),
            topic: String::new(),
            key: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.members.iter().copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn has_member(&self, id: SessionId) -> bool {
        self.members.contains(&id)
    }

    pub fn add_member(&mut self, id: SessionId) {
        self.members.insert(id);
    }

    /// Removes a member. Returns `true` if the channel is now empty and
    /// should be destroyed (Invariant 4, §3).
    pub fn remove_member(&mut self, id: SessionId) -> bool {
        self.members.remove(&id);
        self.members.is_empty()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: String) {
        self.topic = topic;
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    /// Whether `presented_key` satisfies this channel's join key, if any.
    pub fn accepts_key(&self, presented_key: Option<&str>) -> bool {
        match &self.key {
            None => true,
            Some(required) => presented_key == Some(required.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: usize) -> SessionId {
        SessionId::from_raw(n)
    }

    #[test]
    fn starts_empty_with_no_topic_or_key() {
        let chan = Channel::new("#room".to_owned());
        assert_eq!(chan.name(), "#room");
        assert_eq!(chan.topic(), "");
        assert_eq!(chan.key(), None);
        assert_eq!(chan.member_count(), 0);
    }

    #[test]
    fn removing_last_member_reports_empty() {
        let mut chan = Channel::new("#room".to_owned());
        chan.add_member(sid(1));
        chan.add_member(sid(2));
        assert!(!chan.remove_member(sid(1)));
        assert!(chan.remove_member(sid(2)));
    }

    #[test]
    fn accepts_key_logic() {
        let mut chan = Channel::new("#k".to_owned());
        assert!(chan.accepts_key(None));
        chan.set_key(Some("secret".to_owned()));
        assert!(!chan.accepts_key(None));
        assert!(!chan.accepts_key(Some("wrong")));
        assert!(chan.accepts_key(Some("secret")));
    }
}
