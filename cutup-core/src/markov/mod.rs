//! Statistical text generation over order-N Markov chains.
//!
//! Two generators share the same options:
//! - Word-level chains keyed on the last `order` words (`WordChain`)
//! - Part-of-speech chains keyed on the last `order` categories, filled
//!   from per-category word buckets (`PosChain`)

use serde::{Deserialize, Serialize};

/// Word-level chain and sentence generation.
///
/// Keys are the last `order` words, successors the word that followed.
pub mod word;

/// POS-level chain with word buckets.
///
/// Depends on a `TagProvider` to split the source into tagged sentences.
pub mod pos;

/// Words generated per sentence when refining a session.
pub const DEFAULT_MAX_WORDS: usize = 30;

/// Parameters shared by both generators.
///
/// - `order`: chain order, 1..=4 (0 is treated as 1)
/// - `count`: number of sentences to generate, 1..=12
/// - `max_words`: upper bound on words per generated sentence
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MarkovOptions {
	pub order: usize,
	pub count: usize,
	pub max_words: usize,
}

impl Default for MarkovOptions {
	fn default() -> Self {
		Self { order: 2, count: 5, max_words: DEFAULT_MAX_WORDS }
	}
}
