//! Per-channel buffering of outgoing Discord messages.

/// Discord's message length limit.
pub const MESSAGE_LIMIT: usize = 2000;

/// Messages queued per channel, channels in first-queued order.
#[derive(Debug, Default)]
pub struct Outbox {
    channels: Vec<(u64, Vec<String>)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, channel_id: u64, text: String) {
        match self.channels.iter_mut().find(|(id, _)| *id == channel_id) {
            Some((_, messages)) => messages.push(text),
            None => self.channels.push((channel_id, vec![text])),
        }
    }

    /// Take everything queued so far.
    pub fn drain(&mut self) -> Vec<(u64, Vec<String>)> {
        std::mem::take(&mut self.channels)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Join messages with newlines into as few chunks as fit `max_len`.
///
/// Messages are never split unless a single one exceeds the limit.
pub fn pack_messages(messages: &[String], max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for message in messages {
        let needed = if current.is_empty() {
            message.len()
        } else {
            current.len() + 1 + message.len()
        };
        if needed <= max_len {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(message);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if message.len() <= max_len {
            current.push_str(message);
        } else {
            chunks.extend(split_message(message, max_len));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Find the last UTF-8 char boundary at or before `byte_index` in `s`.
fn floor_char_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index >= s.len() {
        return s.len();
    }
    let mut i = byte_index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Split one message into chunks that fit within `max_len` bytes.
///
/// Prefers line breaks, then spaces. Never splits inside a multi-byte
/// character.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = message;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let split_at = floor_char_boundary(remaining, max_len);

        // If max_len is smaller than the first character, force at least one
        // character to avoid an infinite loop.
        if split_at == 0 {
            let first_char_end = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
            chunks.push(remaining[..first_char_end].to_string());
            remaining = &remaining[first_char_end..];
            continue;
        }

        let chunk = &remaining[..split_at];
        match chunk.rfind('\n').or_else(|| chunk.rfind(' ')) {
            Some(idx) if idx > 0 => {
                chunks.push(remaining[..idx].to_string());
                remaining = &remaining[idx + 1..];
            }
            _ => {
                chunks.push(chunk.to_string());
                remaining = &remaining[split_at..];
            }
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_outbox_groups_by_channel_in_first_queued_order() {
        let mut outbox = Outbox::new();
        outbox.push(2, "a".to_string());
        outbox.push(1, "b".to_string());
        outbox.push(2, "c".to_string());
        assert_eq!(
            outbox.drain(),
            vec![(2, strings(&["a", "c"])), (1, strings(&["b"]))]
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_pack_joins_with_newlines() {
        let chunks = pack_messages(&strings(&["one", "two", "three"]), 2000);
        assert_eq!(chunks, vec!["one\ntwo\nthree"]);
    }

    #[test]
    fn test_pack_respects_limit_between_messages() {
        let chunks = pack_messages(&strings(&["aaaa", "bbbb", "cccc"]), 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_pack_splits_oversized_message() {
        let chunks = pack_messages(&strings(&["hi", "0123456789"]), 4);
        assert_eq!(chunks, vec!["hi", "0123", "4567", "89"]);
    }

    #[test]
    fn test_pack_empty() {
        assert!(pack_messages(&[], 2000).is_empty());
    }

    #[test]
    fn test_split_message_short() {
        assert_eq!(split_message("Hello world", 50), vec!["Hello world"]);
    }

    #[test]
    fn test_split_message_on_space() {
        assert_eq!(split_message("Hello beautiful world", 15), vec!["Hello", "beautiful world"]);
    }

    #[test]
    fn test_split_message_prefers_newline() {
        assert_eq!(split_message("ab cd\nef gh", 8), vec!["ab cd", "ef gh"]);
    }

    #[test]
    fn test_split_message_multibyte_utf8() {
        // "é" is 2 bytes; max_len=4 lands inside it
        let chunks = split_message("café rest", 4);
        assert_eq!(chunks[0], "caf");
        for chunk in &chunks {
            assert!(chunk.len() <= 4);
        }
    }
}
