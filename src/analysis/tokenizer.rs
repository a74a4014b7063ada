use std::collections::HashSet;

/// Fixed English stopword set (§4.1). Intentionally small: this is not a
/// linguistic stopword list, just the closed-class words that would
/// otherwise swamp postings for a bibliographic corpus.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "on", "for", "to", "in", "by", "with", "at", "as",
    "from", "via",
];

/// Splits already-`normalize`d text on maximal runs of characters outside
/// `[a-z0-9]`, drops empty tokens and stopwords, and assigns 0-based
/// positions over the *emitted* (non-stopword) token stream.
///
/// Returns `(tokens, positions)` where `positions[i]` is the position of
/// `tokens[i]`; since tokens are emitted in order this is always `0..n`, but
/// kept as a parallel vector to match the component contract in §4.1.
pub fn tokenize(normalized: &str) -> (Vec<String>, Vec<u32>) {
    let mut tokens = Vec::new();
    let mut positions = Vec::new();
    let mut current = String::new();
    let mut position = 0u32;

    fn flush(current: &mut String, tokens: &mut Vec<String>, positions: &mut Vec<u32>, position: &mut u32) {
        if current.is_empty() {
            return;
        }
        if !is_stopword(current) {
            tokens.push(std::mem::take(current));
            positions.push(*position);
            *position += 1;
        } else {
            current.clear();
        }
    }

    for ch in normalized.chars() {
        if is_token_char(ch) {
            current.push(ch);
        } else {
            flush(&mut current, &mut tokens, &mut positions, &mut position);
        }
    }
    flush(&mut current, &mut tokens, &mut positions, &mut position);

    (tokens, positions)
}

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit()
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Convenience wrapper building a stopword set that additionally honors
/// `BuildConfig::extra_stopwords`.
pub fn stopword_set(extra: &[String]) -> HashSet<String> {
    let mut set: HashSet<String> = STOPWORDS.iter().map(|s| s.to_string()).collect();
    set.extend(extra.iter().cloned());
    set
}
