//! Reply chunking.

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Splits `text` into consecutive slices of at most `max_chars` characters.
///
/// The split is purely positional: concatenating the chunks reproduces
/// `text` exactly, and every chunk but the last has exactly `max_chars`
/// characters. Text no longer than `max_chars` (including empty text)
/// yields a single chunk equal to the input. A `max_chars` of zero is
/// treated as one.
#[must_use]
pub fn split_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    loop {
        match rest.char_indices().nth(max_chars) {
            Some((idx, _)) => {
                let (head, tail) = rest.split_at(idx);
                chunks.push(head);
                rest = tail;
            }
            None => {
                chunks.push(rest);
                return chunks;
            }
        }
    }
}
