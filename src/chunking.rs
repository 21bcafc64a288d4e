//! Splitting messages into classifier-sized pieces.

use ropey::Rope;

use crate::model::{CleanedMessage, MessageChunk};

/// Input ceiling of the default sentiment model, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 512;

/// Split `message` into consecutive, non-overlapping slices of at most
/// `max_chars` characters. Concatenating the result gives back `message`;
/// an empty message yields no chunks. Slicing is by char, never mid code point.
pub fn split(message: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let rope = Rope::from_str(message);
    let len = rope.len_chars();
    let mut chunks = Vec::with_capacity(len.div_ceil(max_chars));
    let mut start = 0usize;
    while start < len {
        let end = (start + max_chars).min(len);
        chunks.push(rope.slice(start..end).to_string());
        start = end;
    }
    chunks
}

/// Chunk every message, tagging each chunk with its message's position.
pub fn chunk_messages(messages: &[CleanedMessage], max_chars: usize) -> Vec<MessageChunk> {
    messages
        .iter()
        .enumerate()
        .flat_map(|(source_index, m)| {
            split(&m.message, max_chars)
                .into_iter()
                .map(move |text| MessageChunk { source_index, text })
        })
        .collect()
}
