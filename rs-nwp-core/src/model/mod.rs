//! Top-level module for the next-word prediction system.
//!
//! - Word/id mapping (`Vocabulary`)
//! - The scoring capability consumed by the pipeline (`Scorer`)
//! - Fixed-context n-gram tables (`NGramModel`) and their states (`State`)
//! - The bundled back-off model (`SequenceModel`)
//! - The inference pipeline (`Predictor`)

/// Inference pipeline: padding, top-K ranking and sentence generation.
pub mod predictor;

/// Sequence-to-distribution capability the pipeline is generic over.
pub mod scorer;

/// Back-off word n-gram model implementing `Scorer`.
///
/// Supports loading from disk, parallel training and merging.
pub mod sequence_model;

/// Word n-gram table for a single context length.
pub mod ngram_model;

/// Internal representation of a single context and its transitions.
mod state;

/// Bidirectional word/id mapping built from a corpus.
pub mod vocabulary;
