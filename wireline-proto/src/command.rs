use std::fmt;

/// The set of commands this server dialect understands.
///
/// Anything else parses to `Err(original_token)` so the caller can still
/// report an `ERR_UNKNOWNCOMMAND` with the client's own spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Join,
    List,
    Lusers,
    Names,
    Nick,
    Notice,
    Ping,
    Pong,
    PrivMsg,
    Quit,
    User,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Join => "JOIN",
            Command::List => "LIST",
            Command::Lusers => "LUSERS",
            Command::Names => "NAMES",
            Command::Nick => "NICK",
            Command::Notice => "NOTICE",
            Command::Ping => "PING",
            Command::Pong => "PONG",
            Command::PrivMsg => "PRIVMSG",
            Command::Quit => "QUIT",
            Command::User => "USER",
        }
    }

    /// Parses a command token, case-insensitively, returning the original
    /// token (not upper-cased) on `Err` so the caller can echo the client's
    /// own spelling back in an `ERR_UNKNOWNCOMMAND` reply.
    pub fn parse(s: &str) -> Result<Command, &str> {
        if s.eq_ignore_ascii_case("JOIN") {
            Ok(Command::Join)
        } else if s.eq_ignore_ascii_case("LIST") {
            Ok(Command::List)
        } else if s.eq_ignore_ascii_case("LUSERS") {
            Ok(Command::Lusers)
        } else if s.eq_ignore_ascii_case("NAMES") {
            Ok(Command::Names)
        } else if s.eq_ignore_ascii_case("NICK") {
            Ok(Command::Nick)
        } else if s.eq_ignore_ascii_case("NOTICE") {
            Ok(Command::Notice)
        } else if s.eq_ignore_ascii_case("PING") {
            Ok(Command::Ping)
        } else if s.eq_ignore_ascii_case("PONG") {
            Ok(Command::Pong)
        } else if s.eq_ignore_ascii_case("PRIVMSG") {
            Ok(Command::PrivMsg)
        } else if s.eq_ignore_ascii_case("QUIT") {
            Ok(Command::Quit)
        } else if s.eq_ignore_ascii_case("USER") {
            Ok(Command::User)
        } else {
            Err(s)
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("JOIN"), Ok(Command::Join));
        assert_eq!(Command::parse("PRIVMSG"), Ok(Command::PrivMsg));
    }

    #[test]
    fn rejects_unknown_commands_with_original_token() {
        assert_eq!(Command::parse("FOO"), Err("FOO"));
    }

    #[test]
    fn display_round_trips_as_str() {
        assert_eq!(Command::Nick.to_string(), "NICK");
    }
}
