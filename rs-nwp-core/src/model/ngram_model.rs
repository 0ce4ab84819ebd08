use super::state::State;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Word n-gram table for one fixed context length.
///
/// The `NGramModel` stores one state per observed context of exactly
/// `context_len` word ids and counts which id followed it.
///
/// # Invariants
/// - Each key in `states` has exactly `context_len` ids
/// - All state transitions have occurrence counts >= 1
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramModel {
	/// Number of preceding ids used as context (0 = unigram).
	context_len: usize,

	/// Mapping from a context to its corresponding state
	states: HashMap<Vec<usize>, State>,
}

impl NGramModel {
	/// Creates an empty table for contexts of `context_len` ids.
	pub fn new(context_len: usize) -> Self {
		Self { context_len, states: HashMap::new() }
	}

	pub fn context_len(&self) -> usize {
		self.context_len
	}

	/// Adds one sentence, already mapped to ids.
	///
	/// Every position but the first is a target: a sentence's opening word
	/// is never predicted from nothing. Positions without enough history for
	/// `context_len` are skipped.
	pub fn add_sentence(&mut self, ids: &[usize]) {
		let first_target = self.context_len.max(1);
		if ids.len() <= first_target {
			return;
		}

		for i in first_target..ids.len() {
			let key = &ids[i - self.context_len..i];
			self.states
				.entry(key.to_vec())
				.or_insert_with(|| State::new(key))
				.add_transition(ids[i]);
		}
	}

	/// Returns the state of `context`, if it was observed.
	///
	/// `context` must hold exactly `context_len` ids, otherwise `None`.
	pub fn state(&self, context: &[usize]) -> Option<&State> {
		if context.len() != self.context_len {
			return None;
		}
		self.states.get(context)
	}

	/// Number of observed contexts.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Merges another table into this one.
	///
	/// # Errors
	/// Returns an error if the context lengths do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.context_len != other.context_len {
			return Err("Context length mismatch".to_owned());
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bigram_counts_each_transition() {
		let mut model = NGramModel::new(1);
		model.add_sentence(&[1, 2, 3, 1, 2]);

		let mut scores = vec![0.0; 4];
		assert!(model.state(&[1]).unwrap().distribution(&mut scores));
		assert_eq!(scores, vec![0.0, 0.0, 1.0, 0.0]);
		assert_eq!(model.state(&[2]).unwrap().total(), 1);
		assert!(model.state(&[3, 1]).is_none());
		assert_eq!(model.len(), 3);
	}

	#[test]
	fn unigram_skips_first_word() {
		let mut model = NGramModel::new(0);
		model.add_sentence(&[5, 6]);
		model.add_sentence(&[7]);

		let state = model.state(&[]).unwrap();
		assert_eq!(state.total(), 1);
	}

	#[test]
	fn short_sentences_are_ignored() {
		let mut model = NGramModel::new(3);
		model.add_sentence(&[1, 2, 3]);
		assert!(model.is_empty());
	}

	#[test]
	fn merge_requires_same_context_length() {
		let mut left = NGramModel::new(2);
		left.add_sentence(&[1, 2, 3]);
		let mut right = NGramModel::new(2);
		right.add_sentence(&[1, 2, 3, 4]);

		left.merge(&right).unwrap();
		assert_eq!(left.state(&[1, 2]).unwrap().total(), 2);
		assert_eq!(left.len(), 2);

		assert!(left.merge(&NGramModel::new(1)).is_err());
	}
}
