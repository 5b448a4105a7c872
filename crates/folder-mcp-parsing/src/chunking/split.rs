//! Boundary-preserving text splitting.
//!
//! Every split here keeps delimiters attached to the preceding piece, so
//! concatenating the returned pieces in order always reproduces the input
//! exactly. Splits only ever occur at ASCII delimiter characters, so chunk
//! boundaries never fall inside a multibyte character.

use super::traits::TokenCounter;

/// Recursively split `text` until every returned piece counts at or under
/// `hard_cap` tokens, descending paragraph → sentence → whitespace → raw
/// character window as needed.
pub fn split_to_budget(text: &str, counter: &dyn TokenCounter, hard_cap: usize) -> Vec<String> {
    if text.chars().count() <= 1 || counter.count(text) <= hard_cap {
        return vec![text.to_string()];
    }

    if text.contains("\n\n") {
        let paragraphs: Vec<&str> = text.split_inclusive("\n\n").collect();
        if paragraphs.len() > 1 {
            return paragraphs
                .into_iter()
                .flat_map(|p| split_to_budget(p, counter, hard_cap))
                .collect();
        }
    }

    let sentences: Vec<&str> = text.split_inclusive(['.', '!', '?']).collect();
    if sentences.len() > 1 {
        return sentences
            .into_iter()
            .flat_map(|s| split_to_budget(s, counter, hard_cap))
            .collect();
    }

    let words: Vec<&str> = text.split_inclusive(char::is_whitespace).collect();
    if words.len() > 1 {
        return words
            .into_iter()
            .flat_map(|w| split_to_budget(w, counter, hard_cap))
            .collect();
    }

    split_by_char_window(text, hard_cap)
}

/// Last-resort split for a single unbroken run of characters (no
/// whitespace, no sentence punctuation) that still exceeds `hard_cap`.
fn split_by_char_window(text: &str, hard_cap: usize) -> Vec<String> {
    let window = hard_cap.saturating_mul(4).max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(window)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

/// Greedily pack `leaves` into chunks, flushing whenever the next leaf
/// would push the running total over `soft_cap` (never splitting a leaf
/// itself — that already happened in [`split_to_budget`]).
pub fn pack(leaves: Vec<String>, counter: &dyn TokenCounter, soft_cap: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut buf_tokens = 0usize;

    for leaf in leaves {
        let leaf_tokens = counter.count(&leaf);
        if !buf.is_empty() && buf_tokens + leaf_tokens > soft_cap {
            out.push(std::mem::take(&mut buf));
            buf_tokens = 0;
        }
        buf.push_str(&leaf);
        buf_tokens += leaf_tokens;
    }

    if !buf.is_empty() {
        out.push(buf);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::heuristic_counter::HeuristicCounter;

    #[test]
    fn split_and_pack_reproduces_original_text() {
        let counter = HeuristicCounter::new("h", 8192);
        let text = "Paragraph one.\n\nParagraph two is a bit longer with more words.\n\nThird.";
        let leaves = split_to_budget(text, &counter, 1000);
        let packed = pack(leaves, &counter, 1000);
        assert_eq!(packed.concat(), text);
    }

    #[test]
    fn respects_hard_cap_on_oversized_paragraph() {
        let counter = HeuristicCounter::new("h", 8192);
        let long_word = "a".repeat(5000);
        let leaves = split_to_budget(&long_word, &counter, 10);
        assert!(leaves.iter().all(|l| counter.count(l) <= 40));
        assert_eq!(leaves.concat(), long_word);
    }
}
