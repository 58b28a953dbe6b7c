//! The Registering-state handler (§4.3): only `NICK`, `USER`, `QUIT`,
//! `PING`, `PONG` are recognized; anything else is silently ignored.

use wireline_proto::{rpl, Command, Message};

use crate::handlers::{is_valid_nickname, reply_buffer};
use crate::session::SessionId;
use crate::state::Core;

pub fn dispatch(core: &mut Core, id: SessionId, message: Message<'_>) {
    let command = match message.command {
        Ok(c) => c,
        Err(_) => return,
    };

    match command {
        Command::Nick => handle_nick(core, id, &message.params),
        Command::User => handle_user(core, id, &message.params),
        Command::Ping => handle_ping(core, id, &message.params),
        Command::Pong => {}
        Command::Quit => {
            let reason = message.params.first().copied().unwrap_or("Client quit");
            core.disconnect(id, reason);
        }
        _ => {}
    }
}

fn handle_nick(core: &mut Core, id: SessionId, params: &[&str]) {
    let Some(&nick) = params.first() else {
        let mut rb = reply_buffer(core, id);
        rb.reply(rpl::ERR_NONICKNAMEGIVEN).trailing_param("No nickname given");
        core.deliver(id, rb.into_string().into_bytes());
        return;
    };

    if !is_valid_nickname(nick) {
        let mut rb = reply_buffer(core, id);
        rb.reply(rpl::ERR_ERRONEUSNICKNAME).param(nick).trailing_param("Erroneous nickname");
        core.deliver(id, rb.into_string().into_bytes());
        return;
    }

    if let Some(existing) = core.registry.find_nickname(nick) {
        if existing != id {
            let mut rb = reply_buffer(core, id);
            rb.reply(rpl::ERR_NICKNAMEINUSE).param(nick).trailing_param("Nickname is already in use");
            core.deliver(id, rb.into_string().into_bytes());
            return;
        }
    }

    core.registry.set_nickname(id, nick);
    maybe_complete_registration(core, id);
}

fn handle_user(core: &mut Core, id: SessionId, params: &[&str]) {
    if params.len() < 4 {
        let mut rb = reply_buffer(core, id);
        rb.reply(rpl::ERR_NEEDMOREPARAMS).param("USER").trailing_param("Not enough parameters");
        core.deliver(id, rb.into_string().into_bytes());
        return;
    }

    let user = params[0].to_owned();
    let real_name = params[3].to_owned();
    if let Some(session) = core.registry.session_mut(id) {
        session.set_user(user, real_name);
    }
    maybe_complete_registration(core, id);
}

fn handle_ping(core: &mut Core, id: SessionId, params: &[&str]) {
    let Some(&origin) = params.first() else {
        let mut rb = reply_buffer(core, id);
        rb.reply(rpl::ERR_NOORIGIN).trailing_param("No origin specified");
        core.deliver(id, rb.into_string().into_bytes());
        return;
    };
    let mut rb = reply_buffer(core, id);
    rb.message("PONG").param(&core.domain.clone()).trailing_param(origin);
    core.deliver(id, rb.into_string().into_bytes());
}

/// Once both `NICK` and `USER` have landed, emit the welcome burst and
/// flip the session to `Established` (§4.3, §3 Invariant 5).
fn maybe_complete_registration(core: &mut Core, id: SessionId) {
    let ready = core.registry.session(id).map(|s| s.is_registered()).unwrap_or(false);
    if !ready {
        return;
    }

    let nick = core.registry.session(id).unwrap().nickname().unwrap().to_owned();
    let domain = core.domain.clone();
    let created_at = core.created_at.clone();
    let count = core.registry.session_count();

    let mut rb = reply_buffer(core, id);
    rb.reply(rpl::WELCOME)
        .trailing_param(format!("Welcome to the network, {nick}"));
    rb.reply(rpl::YOURHOST)
        .trailing_param(format!("Your host is {domain}, running version wireline-0.1.0"));
    rb.reply(rpl::CREATED)
        .trailing_param(format!("This server was created {created_at}"));
    rb.reply(rpl::LUSERCLIENT)
        .trailing_param(format!("There are {count} users on 1 server"));
    core.deliver(id, rb.into_string().into_bytes());

    if let Some(session) = core.registry.session_mut(id) {
        session.set_established();
    }
}
