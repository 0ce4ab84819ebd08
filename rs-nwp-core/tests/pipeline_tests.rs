use std::cell::Cell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rs_nwp_core::model::predictor::{Predictor, pad_sequence};
use rs_nwp_core::model::scorer::Scorer;
use rs_nwp_core::model::vocabulary::Vocabulary;
use rs_nwp_core::{Error, Result};

/// Scorer driven by a closure over the padded input.
struct FnScorer<F> {
	input_len: usize,
	score: F,
	calls: Cell<usize>,
}

impl<F: Fn(&[usize]) -> Vec<f32>> FnScorer<F> {
	fn new(input_len: usize, score: F) -> Self {
		Self { input_len, score, calls: Cell::new(0) }
	}
}

impl<F: Fn(&[usize]) -> Vec<f32>> Scorer for FnScorer<F> {
	fn input_len(&self) -> usize {
		self.input_len
	}

	fn score(&self, padded: &[usize]) -> Result<Vec<f32>> {
		self.calls.set(self.calls.get() + 1);
		if padded.len() != self.input_len {
			return Err(Error::InputLength { expected: self.input_len, found: padded.len() });
		}
		Ok((self.score)(padded))
	}
}

/// Always fails, like a model fed with the wrong dimensions.
struct BrokenScorer;

impl Scorer for BrokenScorer {
	fn input_len(&self) -> usize {
		2
	}

	fn score(&self, padded: &[usize]) -> Result<Vec<f32>> {
		Err(Error::InputLength { expected: 3, found: padded.len() })
	}
}

fn cat_vocabulary() -> Vocabulary {
	Vocabulary::from_words(["the", "cat", "sat"])
}

/// "the" -> "cat" -> "sat" -> nothing (padding wins).
fn cat_chain(padded: &[usize]) -> Vec<f32> {
	match padded.last() {
		Some(1) => vec![0.05, 0.05, 0.8, 0.1],
		Some(2) => vec![0.1, 0.1, 0.1, 0.7],
		_ => vec![0.9, 0.05, 0.03, 0.02],
	}
}

#[test]
fn predicts_cat_after_the() {
	let scorer = FnScorer::new(3, |padded: &[usize]| {
		assert_eq!(padded, &[0, 0, 1]);
		vec![0.1, 0.2, 0.6, 0.1]
	});
	let predictor = Predictor::with_parts(cat_vocabulary(), scorer);

	let predictions = predictor.top_k_predictions("the", 1).unwrap();
	assert_eq!(predictions.len(), 1);
	assert_eq!(predictions[0].word, "cat");
	assert_eq!(predictions[0].probability, 0.6);
	assert_eq!(predictor.window(), 4);
}

#[test]
fn generates_until_limit_or_exhaustion() {
	let predictor = Predictor::with_parts(cat_vocabulary(), FnScorer::new(3, cat_chain));

	assert_eq!(predictor.generate_sentence("the", 2).unwrap(), "the cat sat");
	assert_eq!(predictor.generate_sentence("the", 1).unwrap(), "the cat");
	// "sat" is followed by padding only, so generation stops early
	assert_eq!(predictor.generate_sentence("the", 10).unwrap(), "the cat sat");
}

#[test]
fn zero_steps_returns_seed_unchanged() {
	let scorer = FnScorer::new(3, cat_chain);
	let predictor = Predictor::with_parts(cat_vocabulary(), scorer);

	assert_eq!(predictor.generate_sentence("  The, cat?", 0).unwrap(), "  The, cat?");
	assert_eq!(predictor.scorer().calls.get(), 0);
}

#[test]
fn zero_k_is_empty_without_scoring() {
	let predictor = Predictor::with_parts(cat_vocabulary(), FnScorer::new(3, cat_chain));
	assert!(predictor.top_k_predictions("the", 0).unwrap().is_empty());
	assert_eq!(predictor.scorer().calls.get(), 0);
}

#[test]
fn padding_is_excluded_without_backfill() {
	let scorer = FnScorer::new(3, |_: &[usize]| vec![0.7, 0.1, 0.15, 0.05]);
	let predictor = Predictor::with_parts(cat_vocabulary(), scorer);

	let predictions = predictor.top_k_predictions("the", 2).unwrap();
	let words: Vec<&str> = predictions.iter().map(|p| p.word.as_str()).collect();
	assert_eq!(words, vec!["cat"]);

	assert!(predictor.top_k_predictions("the", 1).unwrap().is_empty());
}

#[test]
fn ids_without_words_are_never_returned() {
	// The scorer knows one id more than the vocabulary
	let scorer = FnScorer::new(2, |_: &[usize]| vec![0.0, 0.1, 0.2, 0.3, 0.4]);
	let predictor = Predictor::with_parts(cat_vocabulary(), scorer);

	let predictions = predictor.top_k_predictions("cat", 4).unwrap();
	let words: Vec<&str> = predictions.iter().map(|p| p.word.as_str()).collect();
	assert_eq!(words, vec!["sat", "cat", "the"]);
}

#[test]
fn ties_favour_lower_ids() {
	let scorer = FnScorer::new(2, |_: &[usize]| vec![0.1, 0.3, 0.3, 0.3]);
	let predictor = Predictor::with_parts(cat_vocabulary(), scorer);

	let predictions = predictor.top_k_predictions("sat", 2).unwrap();
	let words: Vec<&str> = predictions.iter().map(|p| p.word.as_str()).collect();
	assert_eq!(words, vec!["the", "cat"]);
}

#[test]
fn unknown_text_scores_an_all_padding_input() {
	let scorer = FnScorer::new(3, |padded: &[usize]| {
		assert_eq!(padded, &[0, 0, 0]);
		vec![0.1, 0.5, 0.2, 0.2]
	});
	let predictor = Predictor::with_parts(cat_vocabulary(), scorer);

	let predictions = predictor.top_k_predictions("dog bird", 3).unwrap();
	assert_eq!(predictions[0].word, "the");
	assert_eq!(predictions.len(), 3);
}

#[test]
fn long_text_keeps_the_most_recent_context() {
	let scorer = FnScorer::new(2, |padded: &[usize]| {
		assert_eq!(padded, &[2, 3]);
		vec![0.0, 1.0, 0.0, 0.0]
	});
	let predictor = Predictor::with_parts(cat_vocabulary(), scorer);
	assert_eq!(predictor.encode("the cat the cat sat"), vec![2, 3]);
	predictor.top_k_predictions("the cat the cat sat", 1).unwrap();
}

#[test]
fn scorer_failures_are_propagated() {
	let predictor = Predictor::with_parts(cat_vocabulary(), BrokenScorer);

	let err = predictor.top_k_predictions("the cat", 3).unwrap_err();
	assert!(!err.is_startup());
	assert!(predictor.generate_sentence("the", 3).is_err());
	// Still usable with k = 0 / steps = 0
	assert_eq!(predictor.generate_sentence("the", 0).unwrap(), "the");
}

/// Extends `seed` the slow way: every step re-encodes the whole text.
fn generate_from_whole_text<S: Scorer>(predictor: &Predictor<S>, seed: &str, steps: usize) -> String {
	let mut text = seed.to_owned();
	for _ in 0..steps {
		let Some(next) = predictor.top_k_predictions(&text, 1).unwrap().into_iter().next() else {
			break;
		};
		text = format!("{text} {}", next.word);
	}
	text
}

#[test]
fn generation_matches_whole_text_reencoding() {
	let mut rng = StdRng::seed_from_u64(0xc0ffee);
	let words = ["the", "cat", "sat", "on", "a", "mat", "and", "dog"];
	let output_size = words.len() + 1;

	for input_len in 0..5 {
		// Never predicts padding, so every run goes the full length
		let scorer = FnScorer::new(input_len, move |padded: &[usize]| {
			let seed = padded.iter().fold(7usize, |acc, id| acc.wrapping_mul(13).wrapping_add(*id));
			(0..output_size).map(|id| if id == 0 { 0.0 } else { (seed.wrapping_add(id * 5) % 9) as f32 }).collect()
		});
		let predictor = Predictor::with_parts(Vocabulary::from_words(words), scorer);

		for _ in 0..20 {
			let token_count = rng.random_range(0..6);
			let seed: Vec<&str> = (0..token_count).map(|_| words[rng.random_range(0..words.len())]).collect();
			let seed = format!("{} unknown, words!", seed.join(" "));
			let steps = rng.random_range(0..30);

			let generated = predictor.generate_sentence(&seed, steps).unwrap();
			assert_eq!(generated, generate_from_whole_text(&predictor, &seed, steps));
			assert_eq!(generated.split_whitespace().count(), seed.split_whitespace().count() + steps);
		}
	}
}

#[test]
fn randomized_pipeline_properties() {
	let mut rng = StdRng::seed_from_u64(0x5eed);
	let words = ["the", "cat", "sat", "on", "a", "mat", "and", "dog"];
	let vocabulary = Vocabulary::from_words(words);
	let output_size = vocabulary.output_size();

	let scorer = FnScorer::new(4, move |padded: &[usize]| {
		// Deterministic pseudo-distribution from the input
		let seed = padded.iter().fold(17usize, |acc, id| acc.wrapping_mul(31).wrapping_add(*id));
		let raw: Vec<f32> = (0..output_size).map(|id| (seed.wrapping_add(id * 7) % 11) as f32 + 1.0).collect();
		let total: f32 = raw.iter().sum();
		raw.into_iter().map(|value| value / total).collect()
	});
	let predictor = Predictor::with_parts(vocabulary, scorer);

	for _ in 0..200 {
		let token_count = rng.random_range(0..10);
		let text: Vec<&str> = (0..token_count).map(|_| words[rng.random_range(0..words.len())]).collect();
		let text = text.join(" ");

		let ids = predictor.vocabulary().text_to_ids(&text);
		let padded = predictor.encode(&text);
		assert_eq!(padded.len(), 4);
		if ids.len() < 4 {
			let zeros = padded.iter().take_while(|&&id| id == 0).count();
			assert_eq!(zeros, 4 - ids.len());
			assert_eq!(&padded[zeros..], ids.as_slice());
		} else {
			assert_eq!(padded.as_slice(), &ids[ids.len() - 4..]);
		}
		assert_eq!(padded, pad_sequence(&ids, 4));

		let k = rng.random_range(0..6);
		let predictions = predictor.top_k_predictions(&text, k).unwrap();
		assert!(predictions.len() <= k);
		assert!(predictions.iter().all(|p| !p.word.is_empty()));
		assert!(predictions.windows(2).all(|pair| pair[0].probability >= pair[1].probability));
		assert_eq!(predictions, predictor.top_k_predictions(&text, k).unwrap());

		let steps = rng.random_range(0..5);
		let generated = predictor.generate_sentence(&text, steps).unwrap();
		let seed_words = text.split_whitespace().count();
		let generated_words = generated.split_whitespace().count();
		assert!(generated_words >= seed_words && generated_words <= seed_words + steps);
		assert!(generated.starts_with(&text));
	}
}
