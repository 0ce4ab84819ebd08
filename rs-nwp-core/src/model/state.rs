use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Represents a context in a word n-gram model.
///
/// A `State` corresponds to a fixed sequence of preceding word ids (`key`)
/// and stores every observed next id with its number of occurrences.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct State {
	/// Preceding word ids, oldest first.
	key: Vec<usize>,
	/// Outgoing transitions indexed by the next id.
	/// Ordered so that scoring visits ids deterministically.
	transitions: BTreeMap<usize, usize>,
}

impl State {
	/// Creates a new empty state for the given context.
	pub fn new(key: &[usize]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: BTreeMap::new(),
		}
	}

	/// Records an occurrence of a transition toward `next_id`.
	pub fn add_transition(&mut self, next_id: usize) {
		*self.transitions.entry(next_id).or_insert(0) += 1;
	}

	/// Total number of observed transitions.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Writes the transition distribution into `scores`.
	///
	/// `scores` is cleared to zero first; each observed id receives its
	/// share of the total count. Ids beyond `scores.len()` are ignored.
	///
	/// Returns `false` (leaving `scores` untouched) if the state has no
	/// transitions.
	pub fn distribution(&self, scores: &mut [f32]) -> bool {
		let total = self.total();
		if total == 0 {
			return false;
		}

		scores.iter_mut().for_each(|score| *score = 0.0);
		for (next_id, occurrence) in &self.transitions {
			if let Some(score) = scores.get_mut(*next_id) {
				*score = *occurrence as f32 / total as f32;
			}
		}
		true
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same context. Occurrence counts are summed.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.key != other.key {
			return Err("Key mismatch".to_owned());
		}

		for (next_id, occurrence) in &other.transitions {
			*self.transitions.entry(*next_id).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}
