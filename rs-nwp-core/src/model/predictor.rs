use std::cmp::Ordering;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::scorer::Scorer;
use super::sequence_model::SequenceModel;
use super::vocabulary::{PAD_ID, Vocabulary};
use crate::error::Result;
use crate::io;

/// Default context window (`W`): the model consumes `W - 1` previous words.
pub const DEFAULT_WINDOW: usize = 5;

/// A predicted next word and its probability.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Prediction {
	pub word: String,
	pub probability: f32,
}

/// Inference pipeline over an immutable vocabulary and scorer.
///
/// # Responsibilities
/// - Map text to ids, truncate and pre-pad them to the scorer input length
/// - Rank the scorer output and keep the `k` best real words
/// - Extend a seed text word by word
///
/// Nothing is mutated while predicting: the same input always gives the
/// same output for a deterministic scorer.
#[derive(Debug)]
pub struct Predictor<S: Scorer> {
	vocabulary: Vocabulary,
	scorer: S,
}

impl Predictor<SequenceModel> {
	/// Loads (or builds and caches) the vocabulary and sequence model of a corpus.
	///
	/// # Parameters
	/// - `corpus_path`: text file with one sentence per line (`.dat`).
	///   `<stem>.vocab` and `<stem>.model` are read from, or written to, the
	///   same folder.
	/// - `window`: context window `W`; the model consumes `W - 1` ids.
	///
	/// # Errors
	/// Any startup failure: missing corpus, unreadable artifacts, or a cached
	/// model built for another window or vocabulary.
	pub fn new<P: AsRef<Path>>(corpus_path: P, window: usize) -> Result<Self> {
		let corpus_path = io::normalize_path(&corpus_path.as_ref().to_string_lossy());
		let vocabulary = Vocabulary::new(&corpus_path)?;
		let model = SequenceModel::new(&corpus_path, &vocabulary, window)?;
		info!(
			"Predictor ready: {} words, window {}",
			vocabulary.len(),
			model.window()
		);
		Ok(Self::with_parts(vocabulary, model))
	}
}

impl<S: Scorer> Predictor<S> {
	/// Builds a predictor from an already loaded vocabulary and scorer.
	pub fn with_parts(vocabulary: Vocabulary, scorer: S) -> Self {
		Self { vocabulary, scorer }
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn scorer(&self) -> &S {
		&self.scorer
	}

	/// Context window `W` (scorer input length + 1).
	pub fn window(&self) -> usize {
		self.scorer.input_len() + 1
	}

	/// Maps `text` to the fixed-length id vector the scorer consumes.
	pub fn encode(&self, text: &str) -> Vec<usize> {
		let ids = self.vocabulary.text_to_ids(text);
		pad_sequence(&ids, self.scorer.input_len())
	}

	/// Returns up to `k` next-word predictions, most probable first.
	///
	/// Ties are broken by the lower id. The padding id and ids without a
	/// word are dropped after selection and not replaced, so fewer than `k`
	/// results (possibly none) may come back.
	///
	/// # Errors
	/// Only scorer invocation failures.
	pub fn top_k_predictions(&self, text: &str, k: usize) -> Result<Vec<Prediction>> {
		if k == 0 {
			return Ok(Vec::new());
		}
		self.predict_encoded(&self.encode(text), k)
	}

	/// Extends `seed_text` by at most `steps` words.
	///
	/// Each step predicts the single best word from the whole text generated
	/// so far. Generation stops early when no word is available.
	///
	/// Only the last `W - 1` ids of that text reach the scorer, so they are
	/// carried from step to step instead of re-tokenizing the growing text.
	///
	/// # Errors
	/// Only scorer invocation failures.
	pub fn generate_sentence(&self, seed_text: &str, steps: usize) -> Result<String> {
		let input_len = self.scorer.input_len();
		let mut text = seed_text.to_owned();
		let mut context = self.encode(seed_text);
		for _ in 0..steps {
			let Some(next) = self.predict_encoded(&context, 1)?.into_iter().next() else {
				break;
			};
			text.push(' ');
			text.push_str(&next.word);

			// Tokenizing "text word" yields the ids of text then those of word
			context.extend(self.vocabulary.text_to_ids(&next.word));
			let excess = context.len() - input_len;
			context.drain(..excess);
		}
		Ok(text)
	}

	/// Scores an already padded input and keeps the `k` best real words.
	fn predict_encoded(&self, padded: &[usize], k: usize) -> Result<Vec<Prediction>> {
		let scores = self.scorer.score(padded)?;

		let predictions: Vec<Prediction> = top_k_indices(&scores, k)
			.into_iter()
			.filter(|&id| id != PAD_ID)
			.filter_map(|id| {
				let word = self.vocabulary.id_to_word(id);
				(!word.is_empty()).then(|| Prediction { word: word.to_owned(), probability: scores[id] })
			})
			.collect();

		debug!("{:?} -> {:?}", padded, predictions);
		Ok(predictions)
	}
}

/// Truncates `ids` to its last `len` entries, or left-pads it with the
/// padding id up to `len`.
pub fn pad_sequence(ids: &[usize], len: usize) -> Vec<usize> {
	if ids.len() >= len {
		return ids[ids.len() - len..].to_vec();
	}
	let mut padded = vec![PAD_ID; len - ids.len()];
	padded.extend_from_slice(ids);
	padded
}

/// Orders by score descending, NaN last, then id ascending.
fn rank(scores: &[f32], a: usize, b: usize) -> Ordering {
	let key = |id: usize| {
		let score = scores[id];
		if score.is_nan() { f32::NEG_INFINITY } else { score }
	};
	key(b).total_cmp(&key(a)).then(a.cmp(&b))
}

/// Returns the ids of the `k` best scores in rank order.
fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
	let mut ids: Vec<usize> = (0..scores.len()).collect();
	if k < ids.len() {
		ids.select_nth_unstable_by(k, |&a, &b| rank(scores, a, b));
		ids.truncate(k);
	}
	ids.sort_unstable_by(|&a, &b| rank(scores, a, b));
	ids
}
