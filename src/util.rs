use crate::error::LogError;

/// A player as it appears in log lines: `NAME<ID><USER_ID><TEAM>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInfo<'a> {
    /// The player's screen name.
    pub name: &'a [u8],
    /// The number the server assigned to the player.
    pub player_id: &'a [u8],
    /// Either `[U:...:...]` for a Steam user or `BOT` for a bot.
    pub user_id: &'a [u8],
    /// ``, `Unassigned`, `TERRORIST` or `CT`.
    pub team: &'a [u8],
}

/// Collects the quoted strings in a message, in order. Empty quotes and an
/// unterminated final quote produce nothing.
///
/// ```
/// use sourlog::util::get_quoted_strings;
///
/// let quoted = get_quoted_strings(b"\"Quoted\" not quoted \"quoted again\"");
/// assert_eq!(quoted, [&b"Quoted"[..], &b"quoted again"[..]]);
/// ```
pub fn get_quoted_strings(message: &[u8]) -> Vec<&[u8]> {
    let mut strings = Vec::new();
    let mut opened_at = None;

    for (idx, &ch) in message.iter().enumerate() {
        if ch == b'"' {
            match opened_at.take() {
                Some(start) if start < idx => strings.push(&message[start..idx]),
                Some(_) => {}
                None => opened_at = Some(idx + 1),
            }
        }
    }

    strings
}

/// Parses a `NAME<ID><USER_ID><TEAM>` player blob.
pub fn parse_player_info(blob: &[u8]) -> Result<PlayerInfo<'_>, LogError> {
    let end = blob
        .iter()
        .rposition(|&ch| ch != b'>')
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let blob = &blob[..end];

    let mut segments = Vec::new();
    let mut start = 0;
    let mut idx = 0;
    while idx + 1 < blob.len() {
        if blob[idx] == b'>' && blob[idx + 1] == b'<' {
            segments.push(&blob[start..idx]);
            start = idx + 2;
            idx += 2;
        } else {
            idx += 1;
        }
    }
    segments.push(&blob[start..]);

    let &[name_with_id, user_id, team] = segments.as_slice() else {
        return Err(LogError::MalformedPlayerInfo);
    };

    // the name itself can contain anything except `<`, so the id starts at
    // the last one
    let split_at = name_with_id
        .iter()
        .rposition(|&ch| ch == b'<')
        .ok_or(LogError::MalformedPlayerInfo)?;

    Ok(PlayerInfo {
        name: &name_with_id[..split_at],
        player_id: &name_with_id[split_at + 1..],
        user_id,
        team,
    })
}
