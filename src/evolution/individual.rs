//! Individuals and the pedigree arena that records their ancestry.
//!
//! Parents are referenced by [`IndividualId`], never by owning pointers. The
//! [`Pedigree`] owns every individual that is still reachable and counts the
//! handles keeping each one alive: population slots, hall-of-fame slots and
//! live children. When the last handle goes, the individual is dropped and
//! its own parent loses a handle, so an ancestor lives exactly as long as
//! some descendant or the hall of fame needs it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::evolution::fitness::{Counters, Evaluation};
use crate::evolution::genome::Genome;

/// Handle to an individual in a [`Pedigree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualId(u64);

impl IndividualId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A genome with its lineage metadata and evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Unique id within the run.
    pub id: IndividualId,
    /// The genome.
    pub genome: Genome,
    /// Generation in which the individual was created.
    pub generation: u64,
    /// The individual this one was cloned from (absent in generation 0).
    pub parent: Option<IndividualId>,
    /// Set once, right after creation.
    pub evaluation: Option<Evaluation>,
}

impl Individual {
    /// Fitness, or zero while unevaluated.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.evaluation.map_or(0.0, |e| e.fitness)
    }

    /// Task counters, or zeros while unevaluated.
    #[must_use]
    pub fn counters(&self) -> Counters {
        self.evaluation.map(|e| e.counters).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Node {
    individual: Individual,
    handles: u32,
}

/// Arena of every live individual in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pedigree {
    nodes: BTreeMap<IndividualId, Node>,
    next_id: u64,
}

impl Pedigree {
    /// Create an empty pedigree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live individuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no individual is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a parentless generation-0 individual, returning a handle to it.
    pub fn add_founder(&mut self, genome: Genome) -> IndividualId {
        self.insert(genome, 0, None)
    }

    /// Clone `parent` into `generation` with the given (already mutated)
    /// genome, returning a handle to the unevaluated child.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not alive.
    pub fn add_offspring(
        &mut self,
        parent: IndividualId,
        genome: Genome,
        generation: u64,
    ) -> IndividualId {
        self.node_mut(parent).handles += 1;
        self.insert(genome, generation, Some(parent))
    }

    fn insert(
        &mut self,
        genome: Genome,
        generation: u64,
        parent: Option<IndividualId>,
    ) -> IndividualId {
        let id = IndividualId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                individual: Individual {
                    id,
                    genome,
                    generation,
                    parent,
                    evaluation: None,
                },
                handles: 1,
            },
        );
        id
    }

    /// Look up a live individual.
    #[must_use]
    pub fn get(&self, id: IndividualId) -> Option<&Individual> {
        self.nodes.get(&id).map(|node| &node.individual)
    }

    /// Look up a live individual.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not alive.
    #[must_use]
    pub fn individual(&self, id: IndividualId) -> &Individual {
        &self.node(id).individual
    }

    /// Record the evaluation of a freshly created individual.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not alive or was already evaluated.
    pub fn set_evaluation(&mut self, id: IndividualId, evaluation: Evaluation) {
        let individual = &mut self.node_mut(id).individual;
        assert!(individual.evaluation.is_none(), "individual {id} evaluated twice");
        individual.evaluation = Some(evaluation);
    }

    /// Take an extra handle on `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not alive.
    pub fn retain(&mut self, id: IndividualId) {
        self.node_mut(id).handles += 1;
    }

    /// Give up a handle on `id`, dropping it and walking up its ancestry
    /// while individuals run out of handles.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not alive.
    pub fn release(&mut self, id: IndividualId) {
        let mut next = Some(id);
        while let Some(id) = next {
            let node = self.node_mut(id);
            node.handles -= 1;
            if node.handles > 0 {
                break;
            }
            next = self.nodes.remove(&id).and_then(|node| node.individual.parent);
        }
    }

    /// Ancestor chain of `id`, generation 0 first and `id` itself last.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not alive.
    #[must_use]
    pub fn lineage(&self, id: IndividualId) -> Vec<&Individual> {
        let mut chain = Vec::new();
        let mut next = Some(id);
        while let Some(id) = next {
            let individual = self.individual(id);
            chain.push(individual);
            next = individual.parent;
        }
        chain.reverse();
        chain
    }

    fn node(&self, id: IndividualId) -> &Node {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("individual {id} is not in the pedigree"))
    }

    fn node_mut(&mut self, id: IndividualId) -> &mut Node {
        self.nodes
            .get_mut(&id)
            .unwrap_or_else(|| panic!("individual {id} is not in the pedigree"))
    }
}
