//! Splits a growing byte stream into `\r?\n`-terminated lines, holding an
//! unterminated tail across reads (§4.2).

/// Owns the inbound byte buffer for one connection and extracts complete
/// lines from it as bytes arrive in arbitrarily-sized chunks.
#[derive(Default)]
pub struct Framer {
    buf: Vec<u8>,
}

impl Framer {
    pub fn new() -> Self {
        Framer::default()
    }

    /// Appends freshly-read bytes to the buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extracts every complete line currently buffered, as owned UTF-8
    /// strings (non-UTF-8 lines are lossily converted rather than
    /// dropped, since the wire is 8-bit transparent but this dialect's
    /// parser only deals in `str`). Any unterminated remainder is kept
    /// for the next call.
    pub fn frame_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(nl) = memchr::memchr(b'\n', &self.buf[start..]) {
            let mut end = start + nl;
            if end > start && self.buf[end - 1] == b'\r' {
                end -= 1;
            }
            lines.push(String::from_utf8_lossy(&self.buf[start..end]).into_owned());
            start += nl + 1;
        }
        self.buf.drain(0..start);
        lines
    }

    /// Number of bytes currently held in the unterminated tail.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_crlf() {
        let mut f = Framer::new();
        f.feed(b"NICK alice\r\nUSER alice * * :Alice\r\n");
        assert_eq!(f.frame_lines(), vec!["NICK alice", "USER alice * * :Alice"]);
        assert_eq!(f.buffered_len(), 0);
    }

    #[test]
    fn tolerates_bare_lf() {
        let mut f = Framer::new();
        f.feed(b"PING :x\nPONG\n");
        assert_eq!(f.frame_lines(), vec!["PING :x", "PONG"]);
    }

    #[test]
    fn holds_partial_line_across_feeds() {
        let mut f = Framer::new();
        f.feed(b"NICK al");
        assert!(f.frame_lines().is_empty());
        assert_eq!(f.buffered_len(), 7);
        f.feed(b"ice\r\n");
        assert_eq!(f.frame_lines(), vec!["NICK alice"]);
    }

    #[test]
    fn arbitrary_split_points_yield_the_same_lines_as_one_read() {
        let whole = b"NICK alice\r\nUSER alice * * :Alice Example\r\nJOIN #room\r\n";
        let mut one_shot = Framer::new();
        one_shot.feed(whole);
        let expected = one_shot.frame_lines();

        for split in 0..whole.len() {
            let (a, b) = whole.split_at(split);
            let mut f = Framer::new();
            f.feed(a);
            let mut lines = f.frame_lines();
            f.feed(b);
            lines.extend(f.frame_lines());
            assert_eq!(lines, expected, "split at {split}");
        }
    }
}
