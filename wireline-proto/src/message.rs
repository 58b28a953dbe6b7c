use crate::command::Command;

/// Maximum length of an outgoing line, CRLF included.
pub const MESSAGE_LENGTH: usize = 512;

/// One framed, parsed input line.
///
/// Clients in this dialect never send a `:prefix`, so unlike a full RFC 2812
/// parser this only ever extracts a command and its arguments (§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<'a> {
    pub command: Result<Command, &'a str>,
    pub params: Vec<&'a str>,
}

impl<'a> Message<'a> {
    /// Parses one already-framed line (no trailing CR/LF).
    ///
    /// Returns `None` for a blank line, which the framer may hand out at the
    /// very end of a buffer.
    pub fn parse(line: &'a str) -> Option<Message<'a>> {
        if line.is_empty() {
            return None;
        }

        let (command, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest),
            None => (line, ""),
        };
        let command = Command::parse(command);
        let params = parse_params(rest);

        Some(Message { command, params })
    }
}

fn parse_params(rest: &str) -> Vec<&str> {
    if rest.is_empty() {
        return Vec::new();
    }
    if let Some(trailing) = rest.strip_prefix(':') {
        return vec![trailing];
    }
    match rest.split_once(" :") {
        Some((head, trailing)) => {
            let mut params: Vec<&str> = head.split(' ').filter(|s| !s.is_empty()).collect();
            params.push(trailing);
            params
        }
        None => rest.split(' ').filter(|s| !s.is_empty()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_command() {
        let msg = Message::parse("LUSERS").unwrap();
        assert_eq!(msg.command, Ok(Command::Lusers));
        assert!(msg.params.is_empty());
    }

    #[test]
    fn uppercases_the_command() {
        let msg = Message::parse("nick alice").unwrap();
        assert_eq!(msg.command, Ok(Command::Nick));
        assert_eq!(msg.params, vec!["alice"]);
    }

    #[test]
    fn leading_colon_is_verbatim_trailing() {
        let msg = Message::parse("QUIT :bye bye").unwrap();
        assert_eq!(msg.command, Ok(Command::Quit));
        assert_eq!(msg.params, vec!["bye bye"]);
    }

    #[test]
    fn middle_params_then_trailing() {
        let msg = Message::parse("PRIVMSG #room :hello there").unwrap();
        assert_eq!(msg.command, Ok(Command::PrivMsg));
        assert_eq!(msg.params, vec!["#room", "hello there"]);
    }

    #[test]
    fn middle_params_without_trailing() {
        let msg = Message::parse("USER alice * * Alice Doe").unwrap();
        assert_eq!(msg.command, Ok(Command::User));
        assert_eq!(msg.params, vec!["alice", "*", "*", "Alice", "Doe"]);
    }

    #[test]
    fn unknown_command_keeps_original_spelling() {
        let msg = Message::parse("FOOBAR x y").unwrap();
        assert_eq!(msg.command, Err("FOOBAR"));
        assert_eq!(msg.params, vec!["x", "y"]);
    }

    #[test]
    fn empty_line_is_none() {
        assert!(Message::parse("").is_none());
    }
}
