use crate::error::Result;

/// A sequence-to-distribution function.
///
/// Given exactly `input_len()` ids (left padded with 0), returns one
/// probability per vocabulary id, padding id included. Implementations must
/// not mutate observable state while scoring: the same input always yields
/// the same output.
pub trait Scorer {
	/// Number of ids the scorer consumes per call (`W - 1`).
	fn input_len(&self) -> usize;

	/// Scores a padded sequence.
	///
	/// # Errors
	/// Returns an invocation error if the input does not have the declared
	/// length or holds ids the scorer does not know.
	fn score(&self, padded: &[usize]) -> Result<Vec<f32>>;
}

impl<S: Scorer + ?Sized> Scorer for &S {
	fn input_len(&self) -> usize {
		(**self).input_len()
	}

	fn score(&self, padded: &[usize]) -> Result<Vec<f32>> {
		(**self).score(padded)
	}
}

impl<S: Scorer + ?Sized> Scorer for Box<S> {
	fn input_len(&self) -> usize {
		(**self).input_len()
	}

	fn score(&self, padded: &[usize]) -> Result<Vec<f32>> {
		(**self).score(padded)
	}
}
