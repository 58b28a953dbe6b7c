//! The authoritative numeric reply codes this dialect emits (§6).

pub const WELCOME: u16 = 1;
pub const YOURHOST: u16 = 2;
pub const CREATED: u16 = 3;

pub const LUSERCLIENT: u16 = 251;

pub const LIST: u16 = 322;
pub const LISTEND: u16 = 323;

pub const NOTOPIC: u16 = 331;
pub const TOPIC: u16 = 332;

pub const NAMREPLY: u16 = 353;
pub const ENDOFNAMES: u16 = 366;

pub const ERR_NOSUCHNICK: u16 = 401;
pub const ERR_NOSUCHCHANNEL: u16 = 403;
pub const ERR_NOORIGIN: u16 = 409;
pub const ERR_NORECIPIENT: u16 = 411;
pub const ERR_NOTEXTTOSEND: u16 = 412;
pub const ERR_UNKNOWNCOMMAND: u16 = 421;
pub const ERR_NONICKNAMEGIVEN: u16 = 431;
pub const ERR_ERRONEUSNICKNAME: u16 = 432;
pub const ERR_NICKNAMEINUSE: u16 = 433;
pub const ERR_NEEDMOREPARAMS: u16 = 461;
pub const ERR_BADCHANNELKEY: u16 = 475;
