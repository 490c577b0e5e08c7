//! Bounded archive of the best individuals seen in a run.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::evolution::individual::IndividualId;

/// A ranked hall-of-fame slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Entry {
    /// Fitness at insertion.
    pub fitness: f64,
    /// Insertion order; earlier entries win ties.
    pub seq: u64,
    /// The individual.
    pub id: IndividualId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Best first: fitness descending, then insertion order ascending.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fitness
            .total_cmp(&self.fitness)
            .then(self.seq.cmp(&other.seq))
            .then(self.id.cmp(&other.id))
    }
}

/// The `capacity` fittest individuals ever offered, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallOfFame {
    entries: BTreeSet<Entry>,
    capacity: usize,
    next_seq: u64,
}

impl HallOfFame {
    /// Create an empty hall of fame holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeSet::new(),
            capacity,
            next_seq: 0,
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the hall of fame is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, best first.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Ids of the entries, best first.
    pub fn ids(&self) -> impl Iterator<Item = IndividualId> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    /// The best entry.
    #[must_use]
    pub fn best(&self) -> Option<&Entry> {
        self.entries.first()
    }

    /// Offer `(id, fitness)` candidates in order.
    ///
    /// Returns `(admitted, evicted)`: ids that entered the hall of fame and
    /// ids that were pushed out. A candidate that only ties the worst entry
    /// is not admitted.
    pub fn update(
        &mut self,
        candidates: impl IntoIterator<Item = (IndividualId, f64)>,
    ) -> (Vec<IndividualId>, Vec<IndividualId>) {
        let mut admitted = Vec::new();
        let mut evicted = Vec::new();
        for (id, fitness) in candidates {
            if self.capacity == 0 {
                break;
            }
            if self.entries.len() >= self.capacity {
                let admits = self
                    .entries
                    .last()
                    .is_some_and(|worst| fitness.total_cmp(&worst.fitness) == Ordering::Greater);
                if !admits {
                    continue;
                }
                if let Some(worst) = self.entries.pop_last() {
                    evicted.push(worst.id);
                }
            }
            let seq = self.next_seq;
            self.next_seq += 1;
            self.entries.insert(Entry { fitness, seq, id });
            admitted.push(id);
        }
        (admitted, evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offers(
        hof: &mut HallOfFame,
        fitness: &[f64],
        first_id: u64,
    ) -> (Vec<IndividualId>, Vec<IndividualId>) {
        let ids = (first_id..).map(id);
        hof.update(ids.zip(fitness.iter().copied()))
    }

    fn id(raw: u64) -> IndividualId {
        IndividualId::new(raw)
    }

    #[test]
    fn test_keeps_best_sorted() {
        let mut hof = HallOfFame::new(3);
        offers(&mut hof, &[1.0, 5.0, 3.0, 4.0, 2.0], 0);
        assert_eq!(hof.len(), 3);
        let fitness: Vec<f64> = hof.iter().map(|e| e.fitness).collect();
        assert_eq!(fitness, vec![5.0, 4.0, 3.0]);
        assert_eq!(hof.best().unwrap().id, id(1));
    }

    #[test]
    fn test_reports_evictions() {
        let mut hof = HallOfFame::new(2);
        let (admitted, evicted) = offers(&mut hof, &[1.0, 2.0, 3.0], 0);
        assert_eq!(admitted, vec![id(0), id(1), id(2)]);
        assert_eq!(evicted, vec![id(0)]);
    }

    #[test]
    fn test_ties_keep_earliest() {
        let mut hof = HallOfFame::new(2);
        offers(&mut hof, &[2.0, 2.0], 0);
        let (admitted, evicted) = offers(&mut hof, &[2.0], 10);
        assert!(admitted.is_empty());
        assert!(evicted.is_empty());
        let ids: Vec<IndividualId> = hof.ids().collect();
        assert_eq!(ids, vec![id(0), id(1)]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut hof = HallOfFame::new(4);
        for round in 0..10u32 {
            let fitness: Vec<f64> = (0..7).map(|i| f64::from((i * 7 + round * 3) % 11)).collect();
            offers(&mut hof, &fitness, u64::from(round) * 100);
            assert!(hof.len() <= 4);
            let sorted: Vec<f64> = hof.iter().map(|e| e.fitness).collect();
            assert!(sorted.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
