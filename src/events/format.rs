//! Discord-side text formatting helpers.

use std::sync::LazyLock;

use fancy_regex::Regex;

/// A dot between an alphanumeric and a letter, i.e. the inside of a link.
static LINK_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?<=[A-Za-z0-9])\.(?=[A-Za-z])").unwrap());

/// Wrap text in a plain code block.
pub fn code_block(content: &str) -> String {
    format!("```\n{}\n```", content)
}

/// Wrap text in a code block with a syntax-highlight language.
pub fn code_block_lang(language: &str, content: &str) -> String {
    format!("```{}\n{}\n```", language, content)
}

/// Neutralize code fences so text cannot break out of a code block.
pub fn escape_code_block(text: &str) -> String {
    text.replace("```", "\\`\\`\\`")
}

/// Escape Discord markdown control characters.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '~' | '|' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Role mention.
pub fn ping(role_id: u64) -> String {
    format!("<@&{}>", role_id)
}

/// User mention.
pub fn ping_user(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

/// Relative timestamp rendered by the Discord client.
pub fn relative_timestamp(unix: i64) -> String {
    format!("<t:{}:R>", unix)
}

/// Defeat auto-hyperlinking: `minewind.com` becomes `minewind(.)com`.
pub fn break_links(text: &str) -> String {
    LINK_DOT.replace_all(text, "(.)").into_owned()
}
