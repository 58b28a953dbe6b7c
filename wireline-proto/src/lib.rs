//! Wire-level building blocks for a reduced IRC dialect: case folding,
//! line framing, command/message parsing, and reply-buffer assembly.
//!
//! Kept dependency-light and free of any networking or registry concerns
//! so it can be unit tested without a runtime.

pub use buffers::{Buffer, MessageBuffer, ReplyBuffer};
pub use casefold::{fold, Folded};
pub use command::Command;
pub use framer::Framer;
pub use message::{Message, MESSAGE_LENGTH};

mod buffers;
mod casefold;
mod command;
mod framer;
mod message;
pub mod rpl;
