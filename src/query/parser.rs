use std::collections::HashSet;

use crate::analysis::normalize::normalize;
use crate::analysis::tokenizer::tokenize;

/// A parsed query (§4.7): an ordered list of phrases (each a nonempty
/// sequence of normalized tokens matched consecutively), an ordered bag of
/// loose tokens, and whether the trailing bag token should be treated as a
/// prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub phrases: Vec<Vec<String>>,
    pub tokens: Vec<String>,
    pub last_is_prefix: bool,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty() && self.tokens.is_empty()
    }
}

/// Extracts balanced double-quoted phrases from a free-text query string,
/// then tokenizes the remainder into bag tokens (§4.7).
///
/// An unbalanced trailing quote is a contract, not an oversight: its content
/// is never consumed as a phrase and instead falls through to the bag-token
/// pass below.
///
/// `extra_stopwords` mirrors `BuildConfig::extra_stopwords` (§10.2): a word
/// configured as an extra stopword never gets interned as a dictionary term
/// at build time, so a query token equal to it must be dropped here too,
/// the same way a fixed stopword is, rather than resolving to zero term ids
/// and tripping `query::matcher::execute`'s empty-doc-set short-circuit.
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    extra_stopwords: HashSet<String>,
}

impl QueryParser {
    pub fn new() -> Self {
        QueryParser::default()
    }

    /// Builds a parser that additionally treats each of `extra_stopwords`
    /// as a no-op filler word, matching the same list passed to
    /// `BuildConfig::extra_stopwords` for the index this parser serves.
    pub fn with_extra_stopwords(extra_stopwords: &[String]) -> Self {
        QueryParser { extra_stopwords: extra_stopwords.iter().cloned().collect() }
    }

    pub fn parse(&self, input: &str) -> ParsedQuery {
        let quote_positions: Vec<usize> =
            input.char_indices().filter(|&(_, c)| c == '"').map(|(i, _)| i).collect();

        let mut spans: Vec<(usize, usize)> = Vec::new(); // (content_start, content_end) byte offsets, exclusive of quotes
        let mut consumed: Vec<(usize, usize)> = Vec::new(); // (quote_start, char_after_closing_quote)
        let mut i = 0;
        while i + 1 < quote_positions.len() {
            let open = quote_positions[i];
            let close = quote_positions[i + 1];
            spans.push((open + 1, close));
            consumed.push((open, close + 1));
            i += 2;
        }

        let mut remainder = String::with_capacity(input.len());
        let mut cursor = 0usize;
        for &(start, end) in &consumed {
            if start > cursor {
                remainder.push_str(&input[cursor..start]);
            }
            remainder.push(' ');
            cursor = end;
        }
        if cursor < input.len() {
            remainder.push_str(&input[cursor..]);
        }

        let mut phrases = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            let normalized = normalize(&input[start..end]);
            let (phrase_tokens, _) = tokenize(&normalized);
            let phrase_tokens = self.drop_extra_stopwords(phrase_tokens);
            if !phrase_tokens.is_empty() {
                phrases.push(phrase_tokens);
            }
        }

        let normalized_remainder = normalize(&remainder);
        let (tokens, _) = tokenize(&normalized_remainder);
        let tokens = self.drop_extra_stopwords(tokens);

        let trimmed = input.trim_end();
        let last_is_prefix = !tokens.is_empty() && !trimmed.ends_with('"');

        ParsedQuery { phrases, tokens, last_is_prefix }
    }

    fn drop_extra_stopwords(&self, tokens: Vec<String>) -> Vec<String> {
        if self.extra_stopwords.is_empty() {
            return tokens;
        }
        tokens.into_iter().filter(|t| !self.extra_stopwords.contains(t)).collect()
    }
}
