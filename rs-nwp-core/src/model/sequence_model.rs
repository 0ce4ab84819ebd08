use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::ngram_model::NGramModel;
use super::scorer::Scorer;
use super::vocabulary::{PAD_ID, Vocabulary};
use crate::error::{Error, Result};
use crate::io::{build_output_path, load_binary, read_file, save_binary};

/// Word-level back-off n-gram model scoring fixed-length id sequences.
///
/// This struct manages:
/// - `ngrams`: one `NGramModel` per context length, from 0 (unigram) to `input_len`.
/// - `input_len`: the declared number of input ids (`W - 1`).
/// - `output_size`: width of every score vector (vocabulary size + padding id).
///
/// Scoring drops the leading padding, then looks for the longest suffix of
/// the remaining ids that was observed during training and returns its
/// normalized transition counts.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SequenceModel {
	input_len: usize,
	output_size: usize,
	/// `Vocabulary::fingerprint` of the vocabulary the model was trained with.
	vocabulary_fingerprint: u64,
	ngrams: Vec<NGramModel>,
}

impl SequenceModel {
	/// Returns an empty model for `input_len` inputs and `output_size` outputs.
	///
	/// An empty model sends all probability mass to the padding id.
	pub fn empty(input_len: usize, output_size: usize) -> Self {
		Self {
			input_len,
			output_size: output_size.max(1),
			vocabulary_fingerprint: 0,
			ngrams: (0..=input_len).map(NGramModel::new).collect(),
		}
	}

	/// Returns an empty model sized and tagged for `vocabulary`.
	pub fn for_vocabulary(input_len: usize, vocabulary: &Vocabulary) -> Self {
		Self {
			vocabulary_fingerprint: vocabulary.fingerprint(),
			..Self::empty(input_len, vocabulary.output_size())
		}
	}

	/// Loads the model for a corpus if a binary exists, otherwise trains it
	/// from the corpus and serializes it next to it as `<stem>.model`.
	///
	/// # Errors
	/// - `InvalidWindow` if `window < 2`
	/// - `WindowMismatch` if a cached model declares another input length
	/// - `VocabularyMismatch` if a cached model scores another number of ids
	/// - `StaleModel` if a cached model was trained with another vocabulary
	/// - `MissingArtifact`, `Io` or `Encoding` if artifacts cannot be read
	pub fn new<P: AsRef<Path>>(corpus_path: P, vocabulary: &Vocabulary, window: usize) -> Result<Self> {
		if window < 2 {
			return Err(Error::InvalidWindow(window));
		}

		let binary_data_path = build_output_path(&corpus_path, "model")?;
		let model = if binary_data_path.exists() {
			debug!("Loading sequence model from {}", binary_data_path.display());
			let model: Self = load_binary(&binary_data_path)?;
			model.check_compatible(vocabulary, window)?;
			model
		} else {
			let lines = read_file(&corpus_path)?;
			let model = Self::train(&lines, vocabulary, window - 1)?;
			save_binary(&model, &binary_data_path)?;
			info!(
				"Trained sequence model (window {}) on {} lines, saved to {}",
				window,
				lines.len(),
				binary_data_path.display()
			);
			model
		};

		Ok(model)
	}

	/// Fails if this model cannot serve `vocabulary` with a window of `window`.
	pub fn check_compatible(&self, vocabulary: &Vocabulary, window: usize) -> Result<()> {
		if self.input_len + 1 != window {
			return Err(Error::WindowMismatch { expected: window - 1, found: self.input_len });
		}
		if self.output_size != vocabulary.output_size() {
			return Err(Error::VocabularyMismatch {
				expected: vocabulary.output_size(),
				found: self.output_size,
			});
		}
		if self.vocabulary_fingerprint != vocabulary.fingerprint() {
			return Err(Error::StaleModel {
				expected: vocabulary.fingerprint(),
				found: self.vocabulary_fingerprint,
			});
		}
		Ok(())
	}

	/// Trains a model on corpus sentences.
	///
	/// # Behavior
	/// - Maps every sentence to ids (unknown words are dropped).
	/// - Splits the sentences into chunks (based on CPU cores * factor).
	/// - Spawns threads to build partial models for each chunk.
	/// - Merges all partial models sequentially.
	pub fn train<S: AsRef<str>>(sentences: &[S], vocabulary: &Vocabulary, input_len: usize) -> Result<Self> {
		let sequences: Vec<Vec<usize>> = sentences
			.iter()
			.map(|sentence| vocabulary.text_to_ids(sentence.as_ref()))
			.filter(|ids| ids.len() > 1)
			.collect();

		let output_size = vocabulary.output_size();
		let mut final_model = Self::for_vocabulary(input_len, vocabulary);
		if sequences.is_empty() {
			return Ok(final_model);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = sequences.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		for chunk in sequences.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<Vec<usize>> = chunk.to_vec();

			thread::spawn(move || {
				let mut partial_model = SequenceModel::empty(input_len, output_size);
				for ids in &chunk {
					partial_model.add_sequence(ids);
				}
				if tx.send(partial_model).is_err() {
					warn!("Training result dropped: receiver closed");
				}
			});
		}
		drop(tx);

		for partial_model in rx.iter() {
			final_model.merge(&partial_model)?;
		}

		Ok(final_model)
	}

	/// Adds one id sequence to every context length.
	pub fn add_sequence(&mut self, ids: &[usize]) {
		for model in &mut self.ngrams {
			model.add_sentence(ids);
		}
	}

	/// Merges another model with the same shape into this one.
	///
	/// # Errors
	/// `Incompatible` if the input length or output size differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.input_len != other.input_len || self.output_size != other.output_size {
			return Err(Error::Incompatible(format!(
				"shape mismatch: self=({}, {}), other=({}, {})",
				self.input_len, self.output_size, other.input_len, other.output_size
			)));
		}

		for (existing, ngram) in self.ngrams.iter_mut().zip(&other.ngrams) {
			existing.merge(ngram).map_err(Error::Incompatible)?;
		}

		Ok(())
	}

	/// Context window this model was built for (`input_len + 1`).
	pub fn window(&self) -> usize {
		self.input_len + 1
	}

	pub fn output_size(&self) -> usize {
		self.output_size
	}
}

impl Scorer for SequenceModel {
	fn input_len(&self) -> usize {
		self.input_len
	}

	/// Scores a padded sequence.
	///
	/// Everything up to the last padding id is ignored, so only the most
	/// recent run of real ids acts as context.
	fn score(&self, padded: &[usize]) -> Result<Vec<f32>> {
		if padded.len() != self.input_len {
			return Err(Error::InputLength { expected: self.input_len, found: padded.len() });
		}
		if let Some(&id) = padded.iter().find(|&&id| id >= self.output_size) {
			return Err(Error::UnknownId { id, output_size: self.output_size });
		}

		let start = padded.iter().rposition(|&id| id == PAD_ID).map_or(0, |position| position + 1);
		let context = &padded[start..];

		let mut scores = vec![0.0; self.output_size];
		for len in (0..=context.len()).rev() {
			let suffix = &context[context.len() - len..];
			if let Some(state) = self.ngrams.get(len).and_then(|model| model.state(suffix)) {
				if state.distribution(&mut scores) {
					return Ok(scores);
				}
			}
		}

		scores[PAD_ID] = 1.0;
		Ok(scores)
	}
}
