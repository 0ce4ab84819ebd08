//! Next-word prediction library.
//!
//! This crate provides a small word-level inference pipeline including:
//! - A vocabulary mapping words to ids (id 0 is padding/unknown)
//! - A deterministic back-off n-gram sequence model
//! - Top-K next-word ranking and autoregressive sentence generation
//! - Internal utilities for artifact I/O and path handling
//!
//! The pipeline is generic over `Scorer`, so any sequence-to-distribution
//! function can stand in for the bundled model.

/// Errors shared by artifact loading and model invocation.
pub mod error;

/// Vocabulary, sequence model and inference pipeline.
pub mod model;

/// I/O utilities (file loading, artifact caching, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use error::{Error, Result};
