use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One scored, tie-break-ready candidate (§4.10 steps 5-6). `year` is `0`
/// for records with no year, per the "missing year = 0" tie-break rule.
#[derive(Debug, Clone)]
pub struct RankedHit {
    pub doc_id: u32,
    pub score: f64,
    pub year: i32,
    pub title: String,
    pub key: String,
}

/// Total order: score descending, then year descending, then title
/// ascending (byte-wise), then key ascending (byte-wise). `Ord` is defined
/// so that the *least* element under this order is the best-ranked hit,
/// which is what `TopKCollector`'s bounded max-heap needs to evict the
/// worst survivor when it overflows capacity.
impl PartialEq for RankedHit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedHit {}

impl PartialOrd for RankedHit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedHit {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.year.cmp(&self.year))
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.key.cmp(&other.key))
    }
}

/// Bounded top-k collector (§4.10 step 7). Keeps at most `k` hits, evicting
/// the current worst survivor whenever a better one arrives and capacity is
/// exceeded.
pub struct TopKCollector {
    heap: BinaryHeap<RankedHit>,
    k: usize,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector { heap: BinaryHeap::with_capacity(k + 1), k: k.max(1) }
    }

    pub fn collect(&mut self, hit: RankedHit) {
        self.heap.push(hit);
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    /// Drains the collector into the final, fully ordered ranking.
    pub fn into_sorted(self) -> Vec<RankedHit> {
        let mut results: Vec<_> = self.heap.into_iter().collect();
        results.sort();
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(doc_id: u32, score: f64, year: i32, title: &str, key: &str) -> RankedHit {
        RankedHit { doc_id, score, year, title: title.to_string(), key: key.to_string() }
    }

    #[test]
    fn orders_by_score_then_year_then_title_then_key() {
        let mut collector = TopKCollector::new(10);
        collector.collect(hit(2, 1.8, 1993, "Zero Knowledge Proofs", "K2"));
        collector.collect(hit(0, 1.8, 2002, "Authenticated Encryption", "K1"));
        collector.collect(hit(1, 1.8, 2002, "Authenticated Encryption with Associated Data", "K3"));

        let ranked = collector.into_sorted();
        let ids: Vec<u32> = ranked.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn evicts_worst_survivor_once_over_capacity() {
        let mut collector = TopKCollector::new(2);
        collector.collect(hit(0, 1.0, 2000, "A", "K1"));
        collector.collect(hit(1, 3.0, 2000, "B", "K2"));
        collector.collect(hit(2, 2.0, 2000, "C", "K3"));

        let ranked = collector.into_sorted();
        let ids: Vec<u32> = ranked.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
