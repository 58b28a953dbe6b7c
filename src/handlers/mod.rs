//! Command handlers, split by the session's current state (§4.3, §4.4).

use wireline_proto::ReplyBuffer;

use crate::session::SessionId;
use crate::state::Core;

pub mod commands;
pub mod registration;

/// A reply buffer addressed to `id`, pre-filled with its current nickname
/// (or `*` before one is assigned).
pub(crate) fn reply_buffer(core: &Core, id: SessionId) -> ReplyBuffer {
    let nick = core
        .registry
        .session(id)
        .and_then(|s| s.nickname())
        .unwrap_or("")
        .to_owned();
    ReplyBuffer::new(&core.domain, &nick)
}

pub(crate) fn nick_of(core: &Core, id: SessionId) -> String {
    core.registry.session(id).and_then(|s| s.nickname()).unwrap_or("*").to_owned()
}

/// `^[A-Za-z\[\]\\^_\`{|}][A-Za-z0-9\[\]\\^_\`{|}-]{0,50}$` (§4.3).
pub fn is_valid_nickname(s: &str) -> bool {
    fn is_nick_special(b: u8) -> bool {
        matches!(b, b'[' | b']' | b'\\' | b'^' | b'_' | b'`' | b'{' | b'|' | b'}')
    }

    if s.is_empty() || s.len() > 51 {
        return false;
    }
    let bytes = s.as_bytes();
    let first_ok = bytes[0].is_ascii_alphabetic() || is_nick_special(bytes[0]);
    if !first_ok {
        return false;
    }
    bytes[1..]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || is_nick_special(b) || b == b'-')
}

/// `^[&#+!][^\x00\x07\n\r ,:]{0,50}$` (§4.4 JOIN).
pub fn is_valid_channel_name(s: &str) -> bool {
    if s.is_empty() || s.len() > 51 {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some('&') | Some('#') | Some('+') | Some('!') => {}
        _ => return false,
    }
    chars.all(|c| !matches!(c, '\x00' | '\x07' | '\n' | '\r' | ' ' | ',' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_rules() {
        assert!(is_valid_nickname("alice"));
        assert!(is_valid_nickname("[away]"));
        assert!(is_valid_nickname("a-1"));
        assert!(!is_valid_nickname(""));
        assert!(!is_valid_nickname("1alice"));
        assert!(!is_valid_nickname("has space"));
    }

    #[test]
    fn channel_rules() {
        assert!(is_valid_channel_name("#room"));
        assert!(is_valid_channel_name("&local"));
        assert!(!is_valid_channel_name("room"));
        assert!(!is_valid_channel_name("#has space"));
        assert!(!is_valid_channel_name(""));
    }
}
