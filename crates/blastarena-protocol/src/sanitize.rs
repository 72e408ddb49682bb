//! Boundary validation for client-supplied text.
//!
//! Nicknames and chat lines are echoed to every client and eventually
//! land in a DOM, so markup-significant characters are escaped before the
//! text is stored anywhere.

use thiserror::Error;

/// Longest accepted nickname, counted before escaping.
pub const MAX_NICKNAME_LEN: usize = 16;

/// Longest accepted chat line, counted before escaping.
pub const MAX_CHAT_LEN: usize = 200;

/// Why a nickname was rejected.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum NicknameError {
    #[error("nickname must not be empty")]
    Empty,
    #[error("nickname exceeds {MAX_NICKNAME_LEN} characters")]
    TooLong,
}

/// Escapes the characters that could smuggle markup into a client.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trims, length-checks, and escapes a nickname.
pub fn clean_nickname(raw: &str) -> Result<String, NicknameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NicknameError::Empty);
    }
    if trimmed.chars().count() > MAX_NICKNAME_LEN {
        return Err(NicknameError::TooLong);
    }
    Ok(escape_html(trimmed))
}

/// Trims, truncates, and escapes a chat line. Returns `None` for
/// whitespace-only input (nothing worth echoing).
pub fn clean_chat(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let bounded: String = trimmed.chars().take(MAX_CHAT_LEN).collect();
    Some(escape_html(&bounded))
}
