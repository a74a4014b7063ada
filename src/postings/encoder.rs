use std::collections::HashMap;

use crate::postings::varint::encode_u32;

/// Per-(term, field) accumulation built during the single tokenization pass
/// over records (in id order). Encodes to bytes only once the dictionary's
/// sort permutation is known (C2 must finish before C3 can address terms by
/// their final sorted id).
///
/// Callers must call `add_positional`/`add_occurrence` with strictly
/// increasing `doc_id` per `term_id` (true automatically when records are
/// processed one at a time, in id order) and strictly increasing `position`
/// within a single doc.
pub enum FieldAccumulator {
    Positional(HashMap<u32, Vec<(u32, Vec<u32>)>>),
    Frequency(HashMap<u32, Vec<(u32, u32)>>),
}

impl FieldAccumulator {
    pub fn new_positional() -> Self {
        FieldAccumulator::Positional(HashMap::new())
    }

    pub fn new_frequency() -> Self {
        FieldAccumulator::Frequency(HashMap::new())
    }

    pub fn add_positional(&mut self, term_id: u32, doc_id: u32, position: u32) {
        let FieldAccumulator::Positional(map) = self else {
            panic!("add_positional called on a frequency-only field accumulator");
        };
        let entries = map.entry(term_id).or_default();
        match entries.last_mut() {
            Some((d, positions)) if *d == doc_id => positions.push(position),
            _ => entries.push((doc_id, vec![position])),
        }
    }

    pub fn add_occurrence(&mut self, term_id: u32, doc_id: u32) {
        let FieldAccumulator::Frequency(map) = self else {
            panic!("add_occurrence called on a positional field accumulator");
        };
        let entries = map.entry(term_id).or_default();
        match entries.last_mut() {
            Some((d, tf)) if *d == doc_id => *tf += 1,
            _ => entries.push((doc_id, 1)),
        }
    }
}

/// Struct-of-arrays pointer table for one field across all terms of a tier:
/// `start[i]`/`len[i]` address the byte range of term `i`'s postings in the
/// tier's shared `postings.bin`. `len == 0` means the term never occurs in
/// this field.
#[derive(Debug, Clone)]
pub struct EncodedField {
    pub start: Vec<u32>,
    pub len: Vec<u32>,
}

/// Encodes one field's accumulated postings into the shared postings blob,
/// remapping pre-sort term ids through `permutation` (old id -> new id, as
/// produced by `DictionaryBuilder::finish`).
pub fn encode_field(
    acc: FieldAccumulator,
    permutation: &[u32],
    num_terms: usize,
    postings: &mut Vec<u8>,
) -> EncodedField {
    let mut by_new_id: Vec<Option<Entries>> = (0..num_terms).map(|_| None).collect();

    match acc {
        FieldAccumulator::Positional(map) => {
            for (old_id, entries) in map {
                let new_id = permutation[old_id as usize] as usize;
                by_new_id[new_id] = Some(Entries::Positional(entries));
            }
        }
        FieldAccumulator::Frequency(map) => {
            for (old_id, entries) in map {
                let new_id = permutation[old_id as usize] as usize;
                by_new_id[new_id] = Some(Entries::Frequency(entries));
            }
        }
    }

    let mut start = vec![0u32; num_terms];
    let mut len = vec![0u32; num_terms];

    for (new_id, slot) in by_new_id.into_iter().enumerate() {
        if let Some(entries) = slot {
            let begin = postings.len() as u32;
            encode_entries(entries, postings);
            start[new_id] = begin;
            len[new_id] = postings.len() as u32 - begin;
        }
    }

    EncodedField { start, len }
}

enum Entries {
    Positional(Vec<(u32, Vec<u32>)>),
    Frequency(Vec<(u32, u32)>),
}

fn encode_entries(entries: Entries, out: &mut Vec<u8>) {
    let mut prev_doc = 0u32;
    match entries {
        Entries::Positional(docs) => {
            for (doc_id, positions) in docs {
                encode_u32(out, doc_id - prev_doc);
                prev_doc = doc_id;
                encode_u32(out, positions.len() as u32);
                let mut prev_pos = 0u32;
                for p in positions {
                    encode_u32(out, p - prev_pos);
                    prev_pos = p;
                }
            }
        }
        Entries::Frequency(docs) => {
            for (doc_id, tf) in docs {
                encode_u32(out, doc_id - prev_doc);
                prev_doc = doc_id;
                encode_u32(out, tf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::decoder::{decode_frequency, decode_positional};

    #[test]
    fn positional_round_trips_through_encode_decode() {
        let mut acc = FieldAccumulator::new_positional();
        acc.add_positional(0, 2, 0);
        acc.add_positional(0, 2, 3);
        acc.add_positional(0, 5, 1);

        let permutation = [0u32];
        let mut postings = Vec::new();
        let field = encode_field(acc, &permutation, 1, &mut postings);

        let bytes = &postings[field.start[0] as usize..(field.start[0] + field.len[0]) as usize];
        let decoded = decode_positional(bytes).unwrap();
        assert_eq!(decoded, vec![(2, vec![0, 3]), (5, vec![1])]);
    }

    #[test]
    fn frequency_round_trips_through_encode_decode() {
        let mut acc = FieldAccumulator::new_frequency();
        acc.add_occurrence(0, 1);
        acc.add_occurrence(0, 1);
        acc.add_occurrence(0, 4);

        let permutation = [0u32];
        let mut postings = Vec::new();
        let field = encode_field(acc, &permutation, 1, &mut postings);

        let bytes = &postings[field.start[0] as usize..(field.start[0] + field.len[0]) as usize];
        let decoded = decode_frequency(bytes).unwrap();
        assert_eq!(decoded, vec![(1, 2), (4, 1)]);
    }

    #[test]
    fn absent_term_has_zero_length() {
        let acc = FieldAccumulator::new_frequency();
        let permutation = [0u32, 1];
        let mut postings = Vec::new();
        let field = encode_field(acc, &permutation, 2, &mut postings);
        assert_eq!(field.len, vec![0, 0]);
    }
}
