//! Cut-up text engine.
//!
//! This crate provides the building blocks of an experimental writing
//! machine, including:
//! - Cut-up, fold-in, line shuffle, permutation and erasure transforms
//! - Word-level and part-of-speech Markov generators
//! - A syllable counter and syllable-based line breaking
//! - A session keeping inputs, settings, outputs and a history
//! - A pluggable refinement capability for external language models
//!
//! Internal helpers (snapshot files, export names) are not exposed.

/// Text transforms, syllables and output filters.
pub mod text;

/// Markov chain generators.
pub mod markov;

/// Part-of-speech tagging.
///
/// Exposes the `TagProvider` seam and a built-in lexicon tagger.
pub mod tagger;

/// Session orchestration, history and its JSON export format.
pub mod session;

/// Refinement models, their lifecycle and status machine.
pub mod refine;

/// I/O utilities (snapshot files, export files).
///
/// Not exposed
pub(crate) mod io;
