//! Genome representation.
//!
//! A genome is an ordered sequence of nucleotides (one byte each) whose length
//! is kept within configured bounds. The bounds are enforced by the only two
//! length-changing edits, [`Genome::insert_segment`] and
//! [`Genome::remove_segment`], which refuse an edit instead of clamping it.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::BoundsViolation;

/// Number of distinct nucleotide values.
pub const NUM_NUCLEOTIDES: usize = 256;

/// Inclusive genome length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    /// Minimum genome length (at least 1).
    pub min: usize,
    /// Maximum genome length.
    pub max: usize,
}

impl LengthBounds {
    /// Whether `length` lies within the bounds.
    #[must_use]
    pub fn contains(&self, length: usize) -> bool {
        (self.min..=self.max).contains(&length)
    }

    fn check(&self, length: usize, attempted: usize) -> Result<(), BoundsViolation> {
        if self.contains(attempted) {
            Ok(())
        } else {
            Err(BoundsViolation {
                length,
                attempted,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// An animat genome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome {
    nucleotides: Vec<u8>,
}

impl Genome {
    /// Create a genome, checking its length against `bounds`.
    ///
    /// # Errors
    ///
    /// Returns a [`BoundsViolation`] if the length is out of bounds.
    pub fn new(nucleotides: Vec<u8>, bounds: LengthBounds) -> Result<Self, BoundsViolation> {
        bounds.check(nucleotides.len(), nucleotides.len())?;
        Ok(Self { nucleotides })
    }

    /// A genome of `length` copies of `value`.
    ///
    /// # Errors
    ///
    /// Returns a [`BoundsViolation`] if `length` is out of bounds.
    pub fn filled(value: u8, length: usize, bounds: LengthBounds) -> Result<Self, BoundsViolation> {
        Self::new(vec![value; length], bounds)
    }

    /// Number of nucleotides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nucleotides.len()
    }

    /// Always false for a genome built through [`Genome::new`] with a
    /// positive minimum length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nucleotides.is_empty()
    }

    /// The nucleotide sequence.
    #[must_use]
    pub fn nucleotides(&self) -> &[u8] {
        &self.nucleotides
    }

    /// Mutable access to individual loci. The length cannot change through
    /// this slice.
    pub fn loci_mut(&mut self) -> &mut [u8] {
        &mut self.nucleotides
    }

    /// Copy of the nucleotides in `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    #[must_use]
    pub fn segment(&self, range: Range<usize>) -> Vec<u8> {
        self.nucleotides[range].to_vec()
    }

    /// Insert `segment` before position `at`.
    ///
    /// # Errors
    ///
    /// Returns a [`BoundsViolation`] and leaves the genome untouched if the
    /// result would be longer than `bounds.max`.
    ///
    /// # Panics
    ///
    /// Panics if `at > self.len()`.
    pub fn insert_segment(
        &mut self,
        at: usize,
        segment: &[u8],
        bounds: LengthBounds,
    ) -> Result<(), BoundsViolation> {
        let length = self.len();
        bounds.check(length, length + segment.len())?;
        self.nucleotides.splice(at..at, segment.iter().copied());
        Ok(())
    }

    /// Remove the nucleotides in `range`.
    ///
    /// # Errors
    ///
    /// Returns a [`BoundsViolation`] and leaves the genome untouched if the
    /// result would be shorter than `bounds.min`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn remove_segment(
        &mut self,
        range: Range<usize>,
        bounds: LengthBounds,
    ) -> Result<(), BoundsViolation> {
        let length = self.len();
        bounds.check(length, length.saturating_sub(range.len()))?;
        self.nucleotides.drain(range);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: LengthBounds = LengthBounds { min: 4, max: 8 };

    #[test]
    fn test_new_checks_bounds() {
        assert!(Genome::new(vec![0; 4], BOUNDS).is_ok());
        assert!(Genome::new(vec![0; 8], BOUNDS).is_ok());
        let err = Genome::new(vec![0; 3], BOUNDS).unwrap_err();
        assert_eq!(err.attempted, 3);
        assert!(Genome::new(vec![0; 9], BOUNDS).is_err());
    }

    #[test]
    fn test_insert_segment() {
        let mut genome = Genome::new(vec![1, 2, 3, 4], BOUNDS).unwrap();
        genome.insert_segment(1, &[9, 9], BOUNDS).unwrap();
        assert_eq!(genome.nucleotides(), &[1, 9, 9, 2, 3, 4]);
        genome.insert_segment(6, &[7], BOUNDS).unwrap();
        assert_eq!(genome.nucleotides(), &[1, 9, 9, 2, 3, 4, 7]);
    }

    #[test]
    fn test_insert_past_max_is_refused() {
        let mut genome = Genome::new(vec![1; 7], BOUNDS).unwrap();
        let err = genome.insert_segment(0, &[2, 2], BOUNDS).unwrap_err();
        assert_eq!(err.attempted, 9);
        assert_eq!(genome.len(), 7);
    }

    #[test]
    fn test_remove_below_min_is_refused() {
        let mut genome = Genome::new(vec![1, 2, 3, 4, 5], BOUNDS).unwrap();
        assert!(genome.remove_segment(0..2, BOUNDS).is_err());
        genome.remove_segment(1..2, BOUNDS).unwrap();
        assert_eq!(genome.nucleotides(), &[1, 3, 4, 5]);
    }

    #[test]
    fn test_serializes_as_plain_sequence() {
        let genome = Genome::new(vec![1, 2, 3, 4], BOUNDS).unwrap();
        assert_eq!(serde_json::to_string(&genome).unwrap(), "[1,2,3,4]");
    }
}
