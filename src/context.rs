//! Surrounding-sentence extraction for selections.

/// Characters that end a sentence.
const BOUNDARIES: [char; 4] = ['.', '!', '?', '\n'];

/// Maximum characters to widen in each direction.
const MAX_WIDEN: usize = 200;

/// Widen `target` inside `full_text` to the enclosing sentence.
///
/// Scans outward from the first occurrence of `target` until a sentence
/// boundary, at most [`MAX_WIDEN`] characters each way. The boundary
/// characters themselves are excluded and the result is trimmed. Returns
/// `target` unchanged when it does not occur in `full_text`.
#[must_use]
pub fn extract_sentence(full_text: &str, target: &str) -> String {
    let Some(byte_idx) = full_text.find(target).filter(|_| !target.is_empty()) else {
        return target.to_owned();
    };

    let chars: Vec<char> = full_text.chars().collect();
    let idx = full_text[..byte_idx].chars().count();
    let target_len = target.chars().count();

    let mut start = idx;
    while start > 0 && !BOUNDARIES.contains(&chars[start - 1]) && idx - start < MAX_WIDEN {
        start -= 1;
    }

    let mut end = idx + target_len;
    while end < chars.len() && !BOUNDARIES.contains(&chars[end]) && end - idx < MAX_WIDEN {
        end += 1;
    }

    chars[start..end].iter().collect::<String>().trim().to_owned()
}
