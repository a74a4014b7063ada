use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::core::error::Result;
use crate::core::types::{CoreField, ExtField, FieldTag};
use crate::loader::artifact_loader::{CoreTier, ExtTier, FieldPointers};
use crate::postings::decoder::{decode_frequency, decode_positional};
use crate::query::parser::ParsedQuery;
use crate::query::resolver::{resolve_bag_token, resolve_exact};

/// Multiplier applied to a token's contribution when it matched only by
/// prefix expansion, with no exact term present in the dictionary (§4.10.5).
pub const PREFIX_SCORE_MULTIPLIER: f64 = 0.8;
pub const TITLE_PHRASE_BONUS: f64 = 1.5;
pub const AUTHORS_PHRASE_BONUS: f64 = 0.6;

/// One surviving, scored document from a single `search()` call. Unordered;
/// `search::results` applies the total tie-break order and truncates to the
/// requested limit.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub doc_id: u32,
    pub score: f64,
}

fn year_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4}$").unwrap())
}

fn doi_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"10\.[0-9]").unwrap())
}

fn structured_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]+[-:][0-9]+$").unwrap())
}

/// Tier classification (§4.10.1): does this query need the extended tier?
/// A bag token that looks like a 4-digit year, a DOI fragment, or a
/// structured identifier (`eurocrypt-2013`, `rfc:8446`) forces it.
pub fn requires_extended(parsed: &ParsedQuery) -> bool {
    parsed
        .tokens
        .iter()
        .any(|t| year_token_re().is_match(t) || doi_token_re().is_match(t) || structured_id_re().is_match(t))
}

struct TokenMatch {
    docs: BTreeSet<u32>,
    fields_by_doc: HashMap<u32, Vec<FieldTag>>,
    prefix_only: bool,
}

/// Executes the matcher/scorer pipeline (§4.10 steps 2-5) for one query
/// against one engine's loaded tiers. Tier classification and lazy-load
/// coordination are the caller's responsibility (§5); by the time this runs
/// `ext` must already reflect whatever the query needs.
pub fn execute(parsed: &ParsedQuery, core: &CoreTier, ext: Option<&ExtTier>) -> Result<Vec<Hit>> {
    if parsed.is_empty() {
        return Ok(Vec::new());
    }

    let mut token_matches = Vec::with_capacity(parsed.tokens.len());
    for (i, token) in parsed.tokens.iter().enumerate() {
        let is_terminal = i + 1 == parsed.tokens.len();
        let allow_prefix = is_terminal && parsed.last_is_prefix;
        let m = resolve_token(token, allow_prefix, core, ext)?;
        if m.docs.is_empty() {
            return Ok(Vec::new());
        }
        token_matches.push(m);
    }

    let mut candidates = if token_matches.is_empty() {
        // Phrase-only query: seed candidates from the first phrase below.
        None
    } else {
        Some(intersect_ascending(token_matches.iter().map(|m| m.docs.clone()).collect()))
    };
    if let Some(c) = &candidates {
        if c.is_empty() {
            return Ok(Vec::new());
        }
    }

    let mut title_bonus: HashMap<u32, u32> = HashMap::new();
    let mut authors_only_bonus: HashMap<u32, u32> = HashMap::new();

    for phrase in &parsed.phrases {
        let (title_docs, authors_docs) = match phrase_match_docs(phrase, core)? {
            Some(pair) => pair,
            None => return Ok(Vec::new()),
        };

        candidates = Some(match candidates.take() {
            Some(c) => c.into_iter().filter(|d| title_docs.contains(d) || authors_docs.contains(d)).collect(),
            None => title_docs.union(&authors_docs).copied().collect(),
        });
        let c = candidates.as_ref().unwrap();
        if c.is_empty() {
            return Ok(Vec::new());
        }

        for &d in c {
            if title_docs.contains(&d) {
                *title_bonus.entry(d).or_insert(0) += 1;
            } else if authors_docs.contains(&d) {
                *authors_only_bonus.entry(d).or_insert(0) += 1;
            }
        }
    }

    let candidates = candidates.unwrap_or_default();
    let mut hits = Vec::with_capacity(candidates.len());
    for doc_id in candidates {
        let mut score = 0.0;
        for m in &token_matches {
            let Some(fields) = m.fields_by_doc.get(&doc_id) else { continue };
            let best = fields.iter().map(|f| f.weight()).fold(0.0_f64, f64::max);
            score += if m.prefix_only { best * PREFIX_SCORE_MULTIPLIER } else { best };
        }
        score += *title_bonus.get(&doc_id).unwrap_or(&0) as f64 * TITLE_PHRASE_BONUS;
        score += *authors_only_bonus.get(&doc_id).unwrap_or(&0) as f64 * AUTHORS_PHRASE_BONUS;
        hits.push(Hit { doc_id, score });
    }

    Ok(hits)
}

fn resolve_token(token: &str, allow_prefix: bool, core: &CoreTier, ext: Option<&ExtTier>) -> Result<TokenMatch> {
    let mut docs = BTreeSet::new();
    let mut fields_by_doc: HashMap<u32, Vec<FieldTag>> = HashMap::new();
    let mut exact = false;
    let mut any_term = false;

    let core_resolved = resolve_bag_token(&core.dict.dict, &core.dict.prefix_map, token, allow_prefix);
    exact |= core_resolved.exact;
    any_term |= !core_resolved.term_ids.is_empty();
    for &term_id in &core_resolved.term_ids {
        for field in CoreField::ALL {
            accumulate_field(
                field.into(),
                field_pointers(core, field),
                &core.postings,
                term_id,
                field.is_positional(),
                &mut docs,
                &mut fields_by_doc,
            )?;
        }
    }

    if let Some(ext) = ext {
        let ext_resolved = resolve_bag_token(&ext.dict.dict, &ext.dict.prefix_map, token, allow_prefix);
        exact |= ext_resolved.exact;
        any_term |= !ext_resolved.term_ids.is_empty();
        for &term_id in &ext_resolved.term_ids {
            for field in ExtField::ALL {
                accumulate_field(
                    field.into(),
                    ext_field_pointers(ext, field),
                    &ext.postings,
                    term_id,
                    false,
                    &mut docs,
                    &mut fields_by_doc,
                )?;
            }
        }
    }

    let prefix_only = allow_prefix && any_term && !exact;
    Ok(TokenMatch { docs, fields_by_doc, prefix_only })
}

fn field_pointers(core: &CoreTier, field: CoreField) -> &FieldPointers {
    match field {
        CoreField::Title => &core.title,
        CoreField::Authors => &core.authors,
        CoreField::Key => &core.key,
    }
}

fn ext_field_pointers(ext: &ExtTier, field: ExtField) -> &FieldPointers {
    match field {
        ExtField::Venue => &ext.venue,
        ExtField::Year => &ext.year,
        ExtField::Doi => &ext.doi,
    }
}

#[allow(clippy::too_many_arguments)]
fn accumulate_field(
    tag: FieldTag,
    pointers: &FieldPointers,
    postings: &[u8],
    term_id: u32,
    positional: bool,
    docs: &mut BTreeSet<u32>,
    fields_by_doc: &mut HashMap<u32, Vec<FieldTag>>,
) -> Result<()> {
    let Some((start, len)) = pointers.range(term_id) else { return Ok(()) };
    let bytes = &postings[start as usize..(start + len) as usize];
    let doc_ids: Vec<u32> = if positional {
        decode_positional(bytes)?.into_iter().map(|(d, _)| d).collect()
    } else {
        decode_frequency(bytes)?.into_iter().map(|(d, _)| d).collect()
    };
    for d in doc_ids {
        docs.insert(d);
        let entry = fields_by_doc.entry(d).or_default();
        if !entry.contains(&tag) {
            entry.push(tag);
        }
    }
    Ok(())
}

fn intersect_ascending(mut sets: Vec<BTreeSet<u32>>) -> BTreeSet<u32> {
    if sets.is_empty() {
        return BTreeSet::new();
    }
    sets.sort_by_key(|s| s.len());
    let mut acc = sets.remove(0);
    for s in sets {
        if acc.is_empty() {
            break;
        }
        acc.retain(|d| s.contains(d));
    }
    acc
}

/// Decodes positional postings for every phrase token in both `title` and
/// `authors`, returning the set of docs where the phrase matches each field
/// (§4.10.4). Returns `None` if any phrase token fails exact lookup in the
/// core dictionary, per §4.8's "zero matches for the entire phrase" rule.
fn phrase_match_docs(phrase: &[String], core: &CoreTier) -> Result<Option<(HashSet<u32>, HashSet<u32>)>> {
    let mut title_positions: Vec<HashMap<u32, Vec<u32>>> = Vec::with_capacity(phrase.len());
    let mut authors_positions: Vec<HashMap<u32, Vec<u32>>> = Vec::with_capacity(phrase.len());

    for token in phrase {
        let Some(term_id) = resolve_exact(&core.dict.dict, token) else {
            return Ok(None);
        };
        title_positions.push(decode_positional_map(&core.title, &core.postings, term_id)?);
        authors_positions.push(decode_positional_map(&core.authors, &core.postings, term_id)?);
    }

    Ok(Some((consecutive_match_docs(&title_positions), consecutive_match_docs(&authors_positions))))
}

fn decode_positional_map(pointers: &FieldPointers, postings: &[u8], term_id: u32) -> Result<HashMap<u32, Vec<u32>>> {
    let Some((start, len)) = pointers.range(term_id) else { return Ok(HashMap::new()) };
    let bytes = &postings[start as usize..(start + len) as usize];
    Ok(decode_positional(bytes)?.into_iter().collect())
}

fn consecutive_match_docs(token_positions: &[HashMap<u32, Vec<u32>>]) -> HashSet<u32> {
    let mut matched = HashSet::new();
    let Some(first) = token_positions.first() else { return matched };

    'doc: for (&doc_id, first_positions) in first {
        for &start in first_positions {
            let mut ok = true;
            for (offset, positions) in token_positions.iter().enumerate().skip(1) {
                let Some(doc_positions) = positions.get(&doc_id) else {
                    ok = false;
                    break;
                };
                if !doc_positions.contains(&(start + offset as u32)) {
                    ok = false;
                    break;
                }
            }
            if ok {
                matched.insert(doc_id);
                continue 'doc;
            }
        }
    }
    matched
}
