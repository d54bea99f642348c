//! A handler which tracks the number of headshot kills per player and
//! answers `!headshots` chat queries over rcon.

use crate::config::{HeadshotConfig, ResetPolicy};
use crate::dispatch::{Dispatcher, HandlerId};
use crate::handlers::CommandSender;
use crate::parser::LogRecord;
use crate::util::{get_quoted_strings, parse_player_info};
use std::cell::RefCell;
use std::collections::HashMap;

const USAGE: &str =
    "say [HEADSHOTS] Command must be either \"!headshots\" or \"!headshots <PLAYER>\" or \"!headshots *\"";

/// Registers the headshot counter. Kill lines carrying `(headshot)` bump the
/// killer's tally; a chat line saying `!headshots` reports the speaker's own
/// tally, `!headshots <PLAYER>` someone else's, and `!headshots *` everyone's.
pub fn init(
    rcon: &CommandSender,
    dispatch: &Dispatcher<LogRecord>,
    config: HeadshotConfig,
) -> HandlerId {
    let rcon = rcon.clone();
    let tallies: RefCell<HashMap<Vec<u8>, u32>> = RefCell::new(HashMap::new());

    dispatch.register(move |record: &LogRecord| {
        let Some(message) = record.message.as_deref() else {
            return;
        };

        if contains(message, b"(headshot)") {
            // `"Killer<...>" killed "Victim<...>" with "weapon" (headshot)`
            let quoted = get_quoted_strings(message);
            let &[killer_blob, _victim, _weapon] = quoted.as_slice() else {
                return;
            };
            let Ok(killer) = parse_player_info(killer_blob) else {
                return;
            };
            if killer.user_id == b"BOT" && !config.count_bots {
                return;
            }

            *tallies
                .borrow_mut()
                .entry(killer.name.to_vec())
                .or_insert(0) += 1;
        } else if contains(message, b"\" say \"") && contains(message, b"\"!headshots") {
            let quoted = get_quoted_strings(message);
            let &[speaker_blob, query] = quoted.as_slice() else {
                return;
            };
            let query = query.trim_ascii();

            let who: Vec<u8> = if query == b"!headshots" {
                let Ok(speaker) = parse_player_info(speaker_blob) else {
                    return;
                };
                speaker.name.to_vec()
            } else {
                match query.splitn(2, |&ch| ch == b' ').nth(1) {
                    Some(name) => name.trim_ascii().to_vec(),
                    None => {
                        rcon.send(USAGE);
                        return;
                    }
                }
            };

            let tallies = tallies.borrow();
            if who == b"*" {
                for (player, count) in tallies.iter() {
                    rcon.send(format!(
                        "say [HEADSHOTS] {} has {}",
                        String::from_utf8_lossy(player),
                        count
                    ));
                }
            } else {
                let count = tallies.get(&who).copied().unwrap_or(0);
                rcon.send(format!(
                    "say [HEADSHOTS] {} has {}",
                    String::from_utf8_lossy(&who),
                    count
                ));
            }
        } else if config.when_reset == ResetPolicy::Round
            && message == b"World triggered \"Round_Start\""
        {
            tallies.borrow_mut().clear();
        } else if config.when_reset == ResetPolicy::Map && message.starts_with(b"Started map") {
            tallies.borrow_mut().clear();
        }
    })
}

fn contains(message: &[u8], needle: &[u8]) -> bool {
    message.windows(needle.len()).any(|window| window == needle)
}
