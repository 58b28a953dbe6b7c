//! The Established-state dispatch table (§4.4).

use wireline_proto::{rpl, Command, Message, MESSAGE_LENGTH};

use crate::handlers::{is_valid_channel_name, is_valid_nickname, nick_of, reply_buffer};
use crate::session::SessionId;
use crate::state::Core;

pub fn dispatch(core: &mut Core, id: SessionId, message: Message<'_>) {
    let command = match message.command {
        Ok(c) => c,
        Err(token) => {
            let mut rb = reply_buffer(core, id);
            rb.reply(rpl::ERR_UNKNOWNCOMMAND).param(token).trailing_param("Unknown command");
            core.deliver(id, rb.into_string().into_bytes());
            return;
        }
    };

    match command {
        Command::Join => handle_join(core, id, &message.params),
        Command::Names => handle_names(core, id, &message.params),
        Command::List => handle_list(core, id, &message.params),
        Command::Lusers => handle_lusers(core, id),
        Command::Nick => handle_nick(core, id, &message.params),
        Command::PrivMsg | Command::Notice => handle_routed(core, id, command, &message.params),
        Command::Ping => handle_ping(core, id, &message.params),
        Command::Pong => {}
        Command::Quit => {
            let reason = match message.params.first().copied() {
                Some(reason) => reason.to_owned(),
                None => nick_of(core, id),
            };
            core.disconnect(id, &reason);
        }
        Command::User => {}
    }
}

fn handle_join(core: &mut Core, id: SessionId, params: &[&str]) {
    let Some(&chans) = params.first() else {
        return;
    };

    if chans == "0" {
        let joined: Vec<String> = core.registry.session(id).map(|s| s.channels().map(str::to_owned).collect()).unwrap_or_default();
        for chan in joined {
            part_one(core, id, &chan, "leaving all channels");
        }
        return;
    }

    let keys: Vec<&str> = params.get(1).map(|k| k.split(',').collect()).unwrap_or_default();

    for (i, name) in chans.split(',').enumerate() {
        if !is_valid_channel_name(name) {
            let mut rb = reply_buffer(core, id);
            rb.reply(rpl::ERR_NOSUCHCHANNEL).param(name).trailing_param("No such channel");
            core.deliver(id, rb.into_string().into_bytes());
            continue;
        }

        let presented_key = keys.get(i).copied();
        if let Some(existing) = core.registry.channel(name) {
            if !existing.accepts_key(presented_key) {
                let mut rb = reply_buffer(core, id);
                rb.reply(rpl::ERR_BADCHANNELKEY).param(name).trailing_param("Cannot join channel (+k)");
                core.deliver(id, rb.into_string().into_bytes());
                continue;
            }
        }

        let folded_name = wireline_proto::fold(name);
        if core.registry.session(id).map(|s| s.is_in_channel(&folded_name)).unwrap_or(false) {
            continue;
        }

        core.registry.join_channel(id, name);
        let canonical = core.registry.channel(name).map(|c| c.name().to_owned()).unwrap_or_else(|| name.to_owned());

        let prefix = core.registry.session(id).map(|s| s.prefix()).unwrap_or_default();
        let join_line = {
            let mut buf = wireline_proto::Buffer::new();
            buf.message(&prefix, "JOIN").trailing_param(&canonical);
            buf.into_string().into_bytes()
        };
        let members = core.registry.channel(&canonical).map(|c| c.members().collect::<Vec<_>>()).unwrap_or_default();
        for member in &members {
            core.deliver(*member, join_line.clone());
        }

        let topic = core.registry.channel(&canonical).map(|c| c.topic().to_owned()).unwrap_or_default();
        let mut rb = reply_buffer(core, id);
        if topic.is_empty() {
            rb.reply(rpl::NOTOPIC).param(&canonical).trailing_param("No topic is set");
        } else {
            rb.reply(rpl::TOPIC).param(&canonical).trailing_param(&topic);
        }
        core.deliver(id, rb.into_string().into_bytes());

        send_names(core, id, &canonical);
    }
}

fn part_one(core: &mut Core, id: SessionId, canonical: &str, reason: &str) {
    let prefix = core.registry.session(id).map(|s| s.prefix()).unwrap_or_default();
    let members = core.registry.channel(canonical).map(|c| c.members().collect::<Vec<_>>()).unwrap_or_default();
    let part_line = {
        let mut buf = wireline_proto::Buffer::new();
        buf.message(&prefix, "PART").param(canonical).trailing_param(reason);
        buf.into_string().into_bytes()
    };
    for member in &members {
        core.deliver(*member, part_line.clone());
    }
    core.registry.leave_channel(id, canonical);
}

/// Emits the `353`/`366` NAMES listing for one channel, wrapping the
/// member list across multiple `353` lines so each stays within
/// [`MESSAGE_LENGTH`] (§4.4 NAMES).
fn send_names(core: &mut Core, id: SessionId, canonical: &str) {
    let nick = nick_of(core, id);
    let header_len = format!(":{} 353 {} = {} :", core.domain, nick, canonical).len();
    let budget = MESSAGE_LENGTH.saturating_sub(header_len + 2);

    let members: Vec<String> = core
        .registry
        .channel(canonical)
        .map(|c| {
            c.members()
                .filter_map(|m| core.registry.session(m).and_then(|s| s.nickname()).map(str::to_owned))
                .collect()
        })
        .unwrap_or_default();

    let mut rb = reply_buffer(core, id);
    let mut line = String::new();
    for name in &members {
        let extra = if line.is_empty() { name.len() } else { name.len() + 1 };
        if line.len() + extra > budget && !line.is_empty() {
            rb.reply(rpl::NAMREPLY).param("=").param(canonical).trailing_param(&line);
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(name);
    }
    if !line.is_empty() || members.is_empty() {
        rb.reply(rpl::NAMREPLY).param("=").param(canonical).trailing_param(&line);
    }
    rb.reply(rpl::ENDOFNAMES).param(canonical).trailing_param("End of /NAMES list");
    core.deliver(id, rb.into_string().into_bytes());
}

fn handle_names(core: &mut Core, id: SessionId, params: &[&str]) {
    let chans: Vec<String> = match params.first() {
        Some(list) => list.split(',').map(str::to_owned).collect(),
        None => core.registry.session(id).map(|s| s.channels().map(str::to_owned).collect()).unwrap_or_default(),
    };
    for chan in chans {
        send_names(core, id, &chan);
    }
}

fn handle_list(core: &mut Core, id: SessionId, params: &[&str]) {
    let wanted: Option<Vec<String>> = params
        .first()
        .map(|list| list.split(',').map(wireline_proto::fold).collect());
    let names = core.registry.channel_names();
    let mut rb = reply_buffer(core, id);
    for name in &names {
        if let Some(w) = &wanted {
            if !w.iter().any(|c| *c == wireline_proto::fold(name)) {
                continue;
            }
        }
        if let Some(chan) = core.registry.channel(name) {
            rb.reply(rpl::LIST).param(name).param(chan.member_count().to_string()).trailing_param(chan.topic());
        }
    }
    rb.reply(rpl::LISTEND).trailing_param("End of /LIST");
    core.deliver(id, rb.into_string().into_bytes());
}

fn handle_lusers(core: &mut Core, id: SessionId) {
    let count = core.registry.session_count();
    let mut rb = reply_buffer(core, id);
    rb.reply(rpl::LUSERCLIENT).trailing_param(format!("There are {count} users on 1 server"));
    core.deliver(id, rb.into_string().into_bytes());
}

fn handle_nick(core: &mut Core, id: SessionId, params: &[&str]) {
    let Some(&new_nick) = params.first() else {
        let mut rb = reply_buffer(core, id);
        rb.reply(rpl::ERR_NONICKNAMEGIVEN).trailing_param("No nickname given");
        core.deliver(id, rb.into_string().into_bytes());
        return;
    };

    let current = core.registry.session(id).and_then(|s| s.nickname()).map(str::to_owned);
    if current.as_deref().map(|c| wireline_proto::fold(c)) == Some(wireline_proto::fold(new_nick)) {
        return;
    }

    if !is_valid_nickname(new_nick) {
        let mut rb = reply_buffer(core, id);
        rb.reply(rpl::ERR_ERRONEUSNICKNAME).param(new_nick).trailing_param("Erroneous nickname");
        core.deliver(id, rb.into_string().into_bytes());
        return;
    }

    if let Some(existing) = core.registry.find_nickname(new_nick) {
        if existing != id {
            let mut rb = reply_buffer(core, id);
            rb.reply(rpl::ERR_NICKNAMEINUSE).param(new_nick).trailing_param("Nickname is already in use");
            core.deliver(id, rb.into_string().into_bytes());
            return;
        }
    }

    core.registry.set_nickname(id, new_nick);
}

fn handle_routed(core: &mut Core, id: SessionId, command: Command, params: &[&str]) {
    let Some(&target) = params.first() else {
        let mut rb = reply_buffer(core, id);
        rb.reply(rpl::ERR_NORECIPIENT).trailing_param(format!("No recipient given ({command})"));
        core.deliver(id, rb.into_string().into_bytes());
        return;
    };
    let Some(&text) = params.get(1) else {
        let mut rb = reply_buffer(core, id);
        rb.reply(rpl::ERR_NOTEXTTOSEND).trailing_param("No text to send");
        core.deliver(id, rb.into_string().into_bytes());
        return;
    };

    let prefix = core.registry.session(id).map(|s| s.prefix()).unwrap_or_default();
    let line = {
        let mut buf = wireline_proto::Buffer::new();
        buf.message(&prefix, command.as_str()).param(target).trailing_param(text);
        buf.into_string().into_bytes()
    };

    if let Some(recipient) = core.registry.find_nickname(target) {
        core.deliver(recipient, line);
        return;
    }

    if let Some(chan) = core.registry.channel(target) {
        let members: Vec<SessionId> = chan.members().filter(|&m| m != id).collect();
        for member in members {
            core.deliver(member, line.clone());
        }
        return;
    }

    let mut rb = reply_buffer(core, id);
    rb.reply(rpl::ERR_NOSUCHNICK).param(target).trailing_param("No such nick/channel");
    core.deliver(id, rb.into_string().into_bytes());
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
