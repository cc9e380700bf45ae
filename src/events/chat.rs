//! Player speech lines.

use std::sync::LazyLock;

use crate::events::format::{break_links, code_block, code_block_lang, escape_code_block, escape_markdown};
use crate::events::rules::{Rule, RuleSet};

/// `[☘ ][TAG.]Name: text`
const SPEECH: &str = r"^(☘ )?([a-zA-Z0-9]{1,4}\.)?([a-zA-Z0-9❤_ ]{1,16}): .*$";
/// `* Name does something`
const EMOTE: &str = r"^\* ([a-zA-Z0-9_ ❤]{1,16}) (.*)$";

static SPEECH_RULE: LazyLock<Rule> = LazyLock::new(|| Rule::new(SPEECH));

/// Number of leading characters exempt from link breaking, so the clan
/// tag separator is never rewritten.
const LINK_SAFE_PREFIX: usize = 6;

pub fn chat_rules() -> RuleSet {
    RuleSet::new(&[SPEECH, EMOTE])
}

/// A line classified as player chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub line: String,
}

impl ChatLine {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    /// Clan tag without its trailing dot, for speech lines that carry one.
    pub fn clan_tag(&self) -> Option<String> {
        let tag = SPEECH_RULE.capture(&self.line, 2)?;
        Some(tag.trim_end_matches('.').to_string())
    }

    /// Speaker name, for speech lines.
    pub fn name(&self) -> Option<String> {
        SPEECH_RULE.capture(&self.line, 3)
    }

    /// Text after the first `": "`, for speech lines.
    pub fn body(&self) -> Option<&str> {
        self.name()?;
        self.line.split_once(": ").map(|(_, body)| body)
    }

    /// Link-broken and fence-escaped line.
    pub fn cleaned(&self) -> String {
        let split = self
            .line
            .char_indices()
            .nth(LINK_SAFE_PREFIX)
            .map(|(i, _)| i)
            .unwrap_or(self.line.len());
        let (head, tail) = self.line.split_at(split);
        escape_code_block(&format!("{}{}", head, break_links(tail)))
    }

    /// Discord rendering. Outgoing and incoming private messages get a
    /// diff block, emotes a markdown heading, everything else a plain block.
    pub fn render(&self) -> String {
        if self.line.contains(": >") {
            code_block_lang("diff", &format!("+{}", self.cleaned()))
        } else if self.line.contains(": <") {
            code_block_lang("diff", &format!("-{}", self.cleaned()))
        } else if self.line.starts_with("* ") {
            code_block_lang("markdown", &format!("#{}", escape_markdown(&self.cleaned())))
        } else {
            code_block(&self.cleaned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clan_tag_and_name() {
        let chat = ChatLine::new("☘ ABC.Steve: hello");
        assert_eq!(chat.clan_tag(), Some("ABC".to_string()));
        assert_eq!(chat.name(), Some("Steve".to_string()));
        assert_eq!(chat.body(), Some("hello"));
    }

    #[test]
    fn test_name_without_tag() {
        let chat = ChatLine::new("Steve: hi there");
        assert_eq!(chat.clan_tag(), None);
        assert_eq!(chat.name(), Some("Steve".to_string()));
    }

    #[test]
    fn test_emote_has_no_speaker() {
        let chat = ChatLine::new("* Steve waves");
        assert!(chat_rules().is_match(&chat.line));
        assert_eq!(chat.name(), None);
        assert_eq!(chat.render(), "```markdown\n#\\* Steve waves\n```");
    }

    #[test]
    fn test_private_message_shapes() {
        assert_eq!(
            ChatLine::new("Steve: > hey").render(),
            "```diff\n+Steve: > hey\n```"
        );
        assert_eq!(
            ChatLine::new("Steve: < hey").render(),
            "```diff\n-Steve: < hey\n```"
        );
    }

    #[test]
    fn test_links_broken_after_prefix() {
        let chat = ChatLine::new("AB.Steve: see minewind.com");
        assert_eq!(chat.render(), "```\nAB.Steve: see minewind(.)com\n```");
    }

    #[test]
    fn test_fences_escaped() {
        let chat = ChatLine::new("Steve: ```break```");
        assert_eq!(chat.cleaned(), "Steve: \\`\\`\\`break\\`\\`\\`");
    }
}
