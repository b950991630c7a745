//! Cut-up techniques and line-level text utilities.
//!
//! Everything here is a pure transform from text to text (or to a grid):
//! - The five cut-up techniques (`engine`)
//! - Syllable counting and rebreaking (`syllable`)
//! - Output filters for display (`filter`)
//! - Shared shuffle and counting helpers (`shuffle`)

/// Cut-up, fold-in, line shuffle, permutation and the erasure grid.
pub mod engine;

/// Heuristic English syllable counter and syllable-based line breaking.
pub mod syllable;

/// Substring and part-of-speech filters over output lines.
pub mod filter;

/// Fisher–Yates shuffle and permutation counting.
///
/// Only used by the other modules of `text`.
pub(crate) mod shuffle;
