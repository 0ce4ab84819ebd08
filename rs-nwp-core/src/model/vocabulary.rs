use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::{build_output_path, load_binary, read_file, save_binary};

/// Id reserved for padding and unknown words.
pub const PAD_ID: usize = 0;

/// Characters replaced by a space before splitting.
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Bidirectional mapping between words and ids.
///
/// Ids are contiguous from 1, ordered by descending corpus frequency
/// (ties keep the order of first appearance). Id 0 is never assigned.
///
/// ## Invariants
/// - `index_word[0]` is the empty string (padding slot)
/// - `word_index[w] == i` iff `index_word[i] == w`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Vocabulary {
	word_index: HashMap<String, usize>,
	index_word: Vec<String>,
}

impl Vocabulary {
	/// Loads the vocabulary for a corpus.
	///
	/// If a cached `<stem>.vocab` exists next to the corpus it is decoded
	/// with `postcard`, otherwise the corpus is read line by line, the
	/// vocabulary is built and the cache is written.
	///
	/// # Errors
	/// `MissingArtifact` if neither the cache nor the corpus exists,
	/// `Io`/`Encoding` if they cannot be read.
	pub fn new<P: AsRef<Path>>(corpus_path: P) -> Result<Self> {
		let binary_path = build_output_path(&corpus_path, "vocab")?;
		if binary_path.exists() {
			debug!("Loading vocabulary from {}", binary_path.display());
			return load_binary(&binary_path);
		}

		let lines = read_file(&corpus_path)?;
		let vocabulary = Self::from_sentences(&lines);
		save_binary(&vocabulary, &binary_path)?;
		info!(
			"Built vocabulary of {} words from {}",
			vocabulary.len(),
			corpus_path.as_ref().display()
		);
		Ok(vocabulary)
	}

	/// Builds a vocabulary from corpus sentences.
	pub fn from_sentences<S: AsRef<str>>(sentences: &[S]) -> Self {
		// word -> (count, first appearance)
		let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
		for sentence in sentences {
			for word in tokenize(sentence.as_ref()) {
				let seen = counts.len();
				counts.entry(word).or_insert((0, seen)).0 += 1;
			}
		}

		let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
		ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
			count_b.cmp(count_a).then(first_a.cmp(first_b))
		});

		let mut index_word = Vec::with_capacity(ranked.len() + 1);
		index_word.push(String::new());
		index_word.extend(ranked.into_iter().map(|(word, _)| word));

		let word_index = index_word
			.iter()
			.enumerate()
			.skip(1)
			.map(|(id, word)| (word.clone(), id))
			.collect();

		Self { word_index, index_word }
	}

	/// Builds a vocabulary from words already in id order (first word gets id 1).
	pub fn from_words<I, S>(words: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut index_word = vec![String::new()];
		let mut word_index = HashMap::new();
		for word in words {
			let word = word.into();
			if word.is_empty() || word_index.contains_key(&word) {
				continue;
			}
			word_index.insert(word.clone(), index_word.len());
			index_word.push(word);
		}
		Self { word_index, index_word }
	}

	/// Number of real words (padding excluded).
	pub fn len(&self) -> usize {
		self.index_word.len() - 1
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Width of a score vector over this vocabulary (padding included).
	pub fn output_size(&self) -> usize {
		self.index_word.len()
	}

	/// Stable 64-bit FNV-1a digest of the words in id order.
	///
	/// Stored in model artifacts so a model is never paired with a
	/// vocabulary it was not trained with.
	pub fn fingerprint(&self) -> u64 {
		const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
		const PRIME: u64 = 0x0000_0100_0000_01b3;

		let mut hash = OFFSET;
		for word in &self.index_word[1..] {
			// 0xff never occurs in UTF-8, so it separates words unambiguously
			for byte in word.bytes().chain(std::iter::once(0xff)) {
				hash ^= u64::from(byte);
				hash = hash.wrapping_mul(PRIME);
			}
		}
		hash
	}

	/// Maps text to ids. Unknown words are dropped, not mapped to 0.
	pub fn text_to_ids(&self, text: &str) -> Vec<usize> {
		tokenize(text)
			.iter()
			.filter_map(|word| self.word_index.get(word).copied())
			.collect()
	}

	/// Returns the word for `id`, or `""` for the padding id and unmapped ids.
	pub fn id_to_word(&self, id: usize) -> &str {
		if id == PAD_ID {
			return "";
		}
		self.index_word.get(id).map(String::as_str).unwrap_or("")
	}

	/// Returns the id of `word`, if known.
	pub fn word_to_id(&self, word: &str) -> Option<usize> {
		self.word_index.get(word).copied()
	}
}

/// Splits text into lower-cased words.
///
/// Punctuation from the filter set is treated as whitespace; apostrophes
/// are kept inside words.
pub fn tokenize(text: &str) -> Vec<String> {
	let cleaned: String = text
		.chars()
		.flat_map(char::to_lowercase)
		.map(|c| if FILTERS.contains(c) { ' ' } else { c })
		.collect();
	cleaned.split_whitespace().map(str::to_owned).collect()
}
