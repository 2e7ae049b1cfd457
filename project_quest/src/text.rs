/// Longest accepted player name, in characters.
pub const MAX_NAME_LENGTH: usize = 15;
/// Longest accepted chat line, in characters.
pub const MAX_CHAT_LENGTH: usize = 60;
pub const DEFAULT_NAME: &str = "lorem ipsum";

/// Escape the characters that are markup-significant to the client.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn player_name(raw: &str) -> String {
    let name = sanitize(raw);
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        truncate_chars(&name, MAX_NAME_LENGTH)
    }
}

/// `None` when nothing is left to say.
pub fn chat_line(raw: &str) -> Option<String> {
    let text = sanitize(raw);
    if text.is_empty() {
        None
    } else {
        Some(truncate_chars(&text, MAX_CHAT_LENGTH))
    }
}
