use std::collections::HashMap;

/// An ordered, sorted, immutable term table: a concatenated UTF-8 term blob
/// plus an `N+1`-length offset array delimiting each term. Deliberately not
/// a hash map — binary search over a sorted byte blob is what makes prefix
/// range expansion (§4.8) fall out of the same mechanism as exact lookup
/// (§9 design note).
#[derive(Debug, Clone)]
pub struct TermDictionary {
    term_blob: Vec<u8>,
    term_offsets: Vec<u32>,
}

impl TermDictionary {
    pub fn from_parts(term_blob: Vec<u8>, term_offsets: Vec<u32>) -> Self {
        TermDictionary { term_blob, term_offsets }
    }

    pub fn len(&self) -> usize {
        self.term_offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn term_blob(&self) -> &[u8] {
        &self.term_blob
    }

    pub fn term_offsets(&self) -> &[u32] {
        &self.term_offsets
    }

    /// Returns the term at `id`. Panics on out-of-range `id`; callers only
    /// ever index ids produced by this same dictionary's own search methods.
    pub fn term_at(&self, id: u32) -> &str {
        let start = self.term_offsets[id as usize] as usize;
        let end = self.term_offsets[id as usize + 1] as usize;
        std::str::from_utf8(&self.term_blob[start..end]).expect("term blob is not valid UTF-8")
    }

    /// First index `i` such that `term_at(i) >= term` (standard lower
    /// bound). Returns `len()` if every term sorts below `term`.
    pub fn lower_bound(&self, term: &str) -> u32 {
        let mut lo = 0u32;
        let mut hi = self.len() as u32;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.term_at(mid) < term {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// `true` if `term` is present exactly.
    pub fn contains(&self, term: &str) -> bool {
        let id = self.lower_bound(term);
        id < self.len() as u32 && self.term_at(id) == term
    }

    /// Returns `[lo, hi)`, the contiguous range of term ids whose term
    /// starts with `prefix`, assuming `lo == lower_bound(prefix)`. Sorting
    /// by byte order guarantees this range is contiguous.
    pub fn prefix_upper_bound(&self, lo: u32, prefix: &str) -> u32 {
        let n = self.len() as u32;
        let mut left = lo;
        let mut right = n;
        while left < right {
            let mid = left + (right - left) / 2;
            if self.term_at(mid).starts_with(prefix) {
                left = mid + 1;
            } else {
                right = mid;
            }
        }
        left
    }
}

/// Accumulates distinct terms in insertion order, then sorts them into a
/// `TermDictionary` plus the permutation (old id -> new id) postings
/// encoding needs to remap its term-keyed accumulators (§4.2).
#[derive(Default)]
pub struct DictionaryBuilder {
    term_ids: HashMap<String, u32>,
    terms: Vec<String>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        DictionaryBuilder::default()
    }

    /// Interns `term`, returning its (pre-sort) term id.
    pub fn intern(&mut self, term: &str) -> u32 {
        if let Some(&id) = self.term_ids.get(term) {
            return id;
        }
        let id = self.terms.len() as u32;
        self.terms.push(term.to_string());
        self.term_ids.insert(term.to_string(), id);
        id
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Sorts terms by byte order and returns the finished dictionary
    /// alongside `permutation`, where `permutation[old_id]` is the term's id
    /// in the sorted dictionary.
    pub fn finish(self) -> (TermDictionary, Vec<u32>) {
        let n = self.terms.len();
        let mut order: Vec<u32> = (0..n as u32).collect();
        order.sort_by(|&a, &b| self.terms[a as usize].as_bytes().cmp(self.terms[b as usize].as_bytes()));

        let mut permutation = vec![0u32; n];
        let mut term_blob = Vec::new();
        let mut term_offsets = Vec::with_capacity(n + 1);
        term_offsets.push(0u32);

        for (new_id, &old_id) in order.iter().enumerate() {
            permutation[old_id as usize] = new_id as u32;
            term_blob.extend_from_slice(self.terms[old_id as usize].as_bytes());
            term_offsets.push(term_blob.len() as u32);
        }

        (TermDictionary::from_parts(term_blob, term_offsets), permutation)
    }
}
