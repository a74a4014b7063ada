use crate::dictionary::builder::TermDictionary;
use crate::loader::artifact_loader::PrefixMap;

/// Worst-case number of term ids a single prefix-expanded bag token may
/// contribute (§4.8, §5 cancellation/timeout bound).
pub const PREFIX_EXPANSION_CAP: u32 = 128;

/// Resolution of one bag token against one tier's dictionary: the term ids
/// it matched, and whether an exact (non-prefix) hit was among them.
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    pub term_ids: Vec<u32>,
    pub exact: bool,
}

/// Resolves a phrase token: exact lookup only, no prefix expansion (§4.8).
pub fn resolve_exact(dict: &TermDictionary, token: &str) -> Option<u32> {
    let id = dict.lower_bound(token);
    if id < dict.len() as u32 && dict.term_at(id) == token { Some(id) } else { None }
}

/// Resolves a bag token. When `allow_prefix` is set (only ever true for the
/// query's terminal token, and only when the parser marked it prefix-
/// eligible), expands to every term sharing `token` as a byte-prefix,
/// capped at `PREFIX_EXPANSION_CAP` and preferring the loader's coarse
/// prefix map to bound the search before falling back to a direct binary
/// search for tokens longer than the map's 4-character granularity.
pub fn resolve_bag_token(
    dict: &TermDictionary,
    prefix_map: &PrefixMap,
    token: &str,
    allow_prefix: bool,
) -> ResolvedToken {
    let lb = dict.lower_bound(token);
    let exact = lb < dict.len() as u32 && dict.term_at(lb) == token;

    if !allow_prefix {
        return ResolvedToken { term_ids: if exact { vec![lb] } else { Vec::new() }, exact };
    }

    // The coarse map is keyed by exactly 4 characters (or fewer, only for
    // terms shorter than 4 chars), so it only gives an O(1) shortcut when the
    // token's own length is exactly 4. Shorter tokens would look up a key
    // that was never inserted at that length for longer terms sharing the
    // prefix, silently under-expanding; fall back to binary search instead.
    let hi = if token.chars().count() == 4 {
        prefix_map.get(token).map(|&(_, hi)| hi).unwrap_or(lb)
    } else {
        dict.prefix_upper_bound(lb, token)
    };

    let capped_hi = lb + (hi - lb).min(PREFIX_EXPANSION_CAP);
    ResolvedToken { term_ids: (lb..capped_hi).collect(), exact }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::builder::DictionaryBuilder;
    use std::collections::HashMap;

    fn build(terms: &[&str]) -> (TermDictionary, PrefixMap) {
        let mut builder = DictionaryBuilder::new();
        for t in terms {
            builder.intern(t);
        }
        let (dict, _) = builder.finish();
        let mut prefix_map: PrefixMap = HashMap::new();
        for id in 0..dict.len() as u32 {
            let term = dict.term_at(id);
            let key_len: usize = term.chars().take(4).map(char::len_utf8).sum();
            let key = term[..key_len].to_string();
            prefix_map.entry(key).and_modify(|(_, hi)| *hi = id + 1).or_insert((id, id + 1));
        }
        (dict, prefix_map)
    }

    #[test]
    fn exact_lookup_finds_present_term_only() {
        let (dict, _) = build(&["bellare", "rogaway"]);
        assert!(resolve_exact(&dict, "rogaway").is_some());
        assert!(resolve_exact(&dict, "rogawa").is_none());
    }

    #[test]
    fn prefix_expansion_includes_exact_and_siblings_without_duplication() {
        let (dict, prefix_map) = build(&["bell", "bellare", "bellovin", "bern"]);
        let resolved = resolve_bag_token(&dict, &prefix_map, "bell", true);
        assert!(resolved.exact);
        assert_eq!(resolved.term_ids.len(), 3);
    }

    #[test]
    fn non_prefix_lookup_never_expands() {
        let (dict, prefix_map) = build(&["bell", "bellare", "bellovin"]);
        let resolved = resolve_bag_token(&dict, &prefix_map, "bell", false);
        assert_eq!(resolved.term_ids.len(), 1);
        assert!(resolved.exact);
    }

    #[test]
    fn prefix_expansion_handles_short_tokens_not_just_four_char_ones() {
        let (dict, prefix_map) = build(&["bell", "bellare", "bellovin", "bern"]);
        let resolved = resolve_bag_token(&dict, &prefix_map, "be", true);
        assert_eq!(resolved.term_ids.len(), 4);
    }

    #[test]
    fn prefix_expansion_caps_at_128() {
        let terms: Vec<String> = (0..200).map(|i| format!("term{i:04}")).collect();
        let refs: Vec<&str> = terms.iter().map(String::as_str).collect();
        let (dict, prefix_map) = build(&refs);
        let resolved = resolve_bag_token(&dict, &prefix_map, "term", true);
        assert_eq!(resolved.term_ids.len(), PREFIX_EXPANSION_CAP as usize);
    }
}
