use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the prediction core.
///
/// Startup failures (missing or incompatible artifacts) and model invocation
/// failures share this type. An empty prediction is never an error.
#[derive(Debug, Error)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	#[error("Artifact encoding error: {0}")]
	Encoding(#[from] postcard::Error),

	#[error("Artifact not found: {}", .0.display())]
	MissingArtifact(PathBuf),

	#[error("Context window must be >= 2, got {0}")]
	InvalidWindow(usize),

	#[error("Incompatible model parts: {0}")]
	Incompatible(String),

	#[error("Model expects {found} input ids but the window requires {expected}")]
	WindowMismatch { expected: usize, found: usize },

	#[error("Model scores {found} ids but the vocabulary has {expected}")]
	VocabularyMismatch { expected: usize, found: usize },

	#[error("Model was trained with another vocabulary (fingerprint {found:#018x}, expected {expected:#018x})")]
	StaleModel { expected: u64, found: u64 },

	#[error("Model input must hold exactly {expected} ids, got {found}")]
	InputLength { expected: usize, found: usize },

	#[error("Id {id} is outside the model output range (0..{output_size})")]
	UnknownId { id: usize, output_size: usize },
}

impl Error {
	/// Whether the error happened while loading artifacts rather than scoring.
	pub fn is_startup(&self) -> bool {
		!matches!(self, Error::InputLength { .. } | Error::UnknownId { .. })
	}
}

pub type Result<T> = std::result::Result<T, Error>;
