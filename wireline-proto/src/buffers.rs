//! Small builders for assembling outgoing IRC lines without per-message
//! allocations beyond the shared backing buffer.

/// A backing buffer that can hold several `\r\n`-terminated messages.
///
/// Termination is lazy: starting a new message via [`Buffer::message`]
/// first closes off whatever message is still open, so callers never need
/// to remember to terminate a message themselves unless it's the last one
/// in the buffer (see [`Buffer::into_string`]).
#[derive(Default)]
pub struct Buffer {
    buf: String,
    open: bool,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Starts a new message: `:<prefix> <verb>`, or just `<verb>` when
    /// `prefix` is empty (used for client-originated lines like `PONG`).
    pub fn message<'a>(&'a mut self, prefix: &str, verb: &str) -> MessageBuffer<'a> {
        if self.open {
            self.buf.push_str("\r\n");
        }
        self.open = true;
        if !prefix.is_empty() {
            self.buf.push(':');
            self.buf.push_str(prefix);
            self.buf.push(' ');
        }
        self.buf.push_str(verb);
        MessageBuffer { buf: &mut self.buf }
    }

    /// Finalizes the buffer, terminating the last open message, and
    /// returns the assembled bytes ready to be queued for a socket write.
    pub fn into_string(mut self) -> String {
        if self.open {
            self.buf.push_str("\r\n");
            self.open = false;
        }
        self.buf
    }
}

/// A message under construction within a [`Buffer`].
pub struct MessageBuffer<'a> {
    buf: &'a mut String,
}

impl<'a> MessageBuffer<'a> {
    /// Appends a middle parameter.
    pub fn param(self, value: impl AsRef<str>) -> Self {
        self.buf.push(' ');
        self.buf.push_str(value.as_ref());
        self
    }

    /// Appends the trailing parameter (the one prefixed with `:`).
    pub fn trailing_param(self, value: impl AsRef<str>) -> Self {
        self.buf.push_str(" :");
        self.buf.push_str(value.as_ref());
        self
    }

    /// Gives direct access to the trailing parameter so it can be built
    /// incrementally (e.g. a space-separated NAMES listing).
    pub fn raw_trailing_param(self) -> &'a mut String {
        self.buf.push_str(" :");
        self.buf
    }

    /// Marks the message as complete. A no-op: termination is handled
    /// lazily by the next [`Buffer::message`] call or by
    /// [`Buffer::into_string`]. Kept so call sites can mark a builder
    /// chain as finished without guessing whether more params follow.
    pub fn build(self) {}
}

/// A [`Buffer`] specialized for numeric replies to one client: every
/// message is automatically addressed `:<domain> <code> <nick>`.
pub struct ReplyBuffer {
    buf: Buffer,
    domain: String,
    nick: String,
}

impl ReplyBuffer {
    pub fn new(domain: &str, nick: &str) -> Self {
        ReplyBuffer {
            buf: Buffer::new(),
            domain: domain.to_owned(),
            nick: nick.to_owned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Starts a numeric reply, pre-filling the target nick (`*` before
    /// registration completes) as its first parameter.
    pub fn reply(&mut self, code: u16) -> MessageBuffer<'_> {
        let verb = format!("{:03}", code);
        let nick = if self.nick.is_empty() {
            "*"
        } else {
            self.nick.as_str()
        };
        self.buf.message(&self.domain.clone(), &verb).param(nick)
    }

    /// Starts a non-numeric, server-originated message (e.g. `PONG`).
    pub fn message(&mut self, verb: &str) -> MessageBuffer<'_> {
        self.buf.message(&self.domain.clone(), verb)
    }

    pub fn into_string(self) -> String {
        self.buf.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_message_is_terminated_on_finalize() {
        let mut buf = Buffer::new();
        buf.message("srv", "PING").param("origin");
        assert_eq!(buf.into_string(), ":srv PING origin\r\n");
    }

    #[test]
    fn successive_messages_are_terminated_lazily() {
        let mut buf = Buffer::new();
        buf.message("srv", "001").param("alice").trailing_param("hi");
        buf.message("srv", "002").param("alice").trailing_param("bye");
        assert_eq!(
            buf.into_string(),
            ":srv 001 alice :hi\r\n:srv 002 alice :bye\r\n",
        );
    }

    #[test]
    fn raw_trailing_param_allows_incremental_building() {
        let mut buf = Buffer::new();
        {
            let trailing = buf.message("srv", "353").param("alice").param("=").param("#room")
                .raw_trailing_param();
            trailing.push_str("alice");
            trailing.push(' ');
            trailing.push_str("bob");
        }
        assert_eq!(buf.into_string(), ":srv 353 alice = #room :alice bob\r\n");
    }

    #[test]
    fn reply_buffer_prefills_nick_and_domain() {
        let mut rb = ReplyBuffer::new("srv.example", "alice");
        rb.reply(431).trailing_param("No nickname given");
        assert_eq!(
            rb.into_string(),
            ":srv.example 431 alice :No nickname given\r\n",
        );
    }

    #[test]
    fn reply_buffer_uses_star_before_registration() {
        let mut rb = ReplyBuffer::new("srv.example", "");
        rb.reply(433).param("bob").trailing_param("Nickname is already in use");
        assert_eq!(
            rb.into_string(),
            ":srv.example 433 * bob :Nickname is already in use\r\n",
        );
    }
}
