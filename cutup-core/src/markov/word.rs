use std::collections::HashMap;

use log::debug;
use rand::Rng;
use rand::prelude::IndexedRandom;

use super::MarkovOptions;

/// Chance of stopping right after a word that ends a sentence.
const SENTENCE_END_STOP: f64 = 0.7;

/// A word-level Markov chain.
///
/// Each key is `order` consecutive words joined by single spaces; its
/// successors are every word that followed that window in the source, in
/// order of appearance and with repetitions (so frequent transitions are
/// drawn more often).
///
/// # Invariants
/// - `order >= 1`
/// - Every key holds exactly `order` words
/// - Every successor list is non-empty
/// - The chain is never modified after `build`
#[derive(Clone, Debug, PartialEq)]
pub struct WordChain {
	order: usize,
	links: HashMap<String, Vec<String>>,
	/// Keys in first-seen order, for uniform seed selection.
	keys: Vec<String>,
}

impl WordChain {
	/// Builds a chain of the given order from a source text.
	///
	/// A source shorter than `order + 1` words gives an empty chain.
	pub fn build(text: &str, order: usize) -> Self {
		let order = order.max(1);
		let words: Vec<&str> = text.split_whitespace().collect();

		let (links, keys) = words.windows(order + 1).fold(
			(HashMap::<String, Vec<String>>::new(), Vec::new()),
			|(mut links, mut keys), window| {
				let key = window[..order].join(" ");
				let next = window[order].to_owned();
				links
					.entry(key)
					.or_insert_with_key(|k| {
						keys.push(k.clone());
						Vec::new()
					})
					.push(next);
				(links, keys)
			},
		);

		debug!("word chain of order {} built with {} keys", order, keys.len());
		Self { order, links, keys }
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Successors recorded for a key, if any.
	pub fn successors(&self, key: &str) -> Option<&[String]> {
		self.links.get(key).map(Vec::as_slice)
	}

	/// Generates one sentence.
	///
	/// # Behavior
	/// - Starts from a uniformly random key and emits its words.
	/// - Appends up to `max_words - order` successors, sliding the window.
	/// - Stops early when the current key has no successor, or (70% of the
	///   time) right after a word ending with `.`, `!` or `?`.
	///
	/// Returns an empty string for an empty chain.
	pub fn generate_sentence<R: Rng + ?Sized>(&self, max_words: usize, rng: &mut R) -> String {
		let Some(seed) = self.keys.choose(rng) else {
			return String::new();
		};

		let mut words: Vec<&str> = seed.split(' ').collect();
		let mut key = seed.clone();

		for _ in 0..max_words.saturating_sub(self.order) {
			let Some(next) = self.links.get(&key).and_then(|s| s.choose(rng)) else {
				break;
			};
			words.push(next);
			key = words[words.len() - self.order..].join(" ");

			if next.ends_with(['.', '!', '?']) && rng.random_bool(SENTENCE_END_STOP) {
				break;
			}
		}

		words.join(" ")
	}
}

/// Generates `count` newline-separated sentences from a word chain built on `text`.
///
/// See [`generate_markov_with_rng`].
pub fn generate_markov(text: &str, options: MarkovOptions) -> String {
	generate_markov_with_rng(text, options, &mut rand::rng())
}

/// Generates `count` newline-separated sentences from a word chain built on `text`.
///
/// # Returns
/// - An empty string when the source has fewer than `order + 1` words.
/// - Otherwise the non-empty generated sentences joined by `\n`.
pub fn generate_markov_with_rng<R: Rng + ?Sized>(text: &str, options: MarkovOptions, rng: &mut R) -> String {
	let chain = WordChain::build(text, options.order);
	if chain.is_empty() {
		return String::new();
	}

	(0..options.count)
		.map(|_| chain.generate_sentence(options.max_words, rng))
		.filter(|s| !s.is_empty())
		.collect::<Vec<_>>()
		.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_build_chain() {
		let chain = WordChain::build("the cat sat on the mat", 1);
		assert_eq!(chain.order(), 1);
		assert_eq!(chain.len(), 4);
		assert_eq!(chain.successors("the"), Some(&["cat".to_owned(), "mat".to_owned()][..]));
		assert_eq!(chain.successors("mat"), None);
	}

	#[test]
	fn test_build_chain_order_two() {
		let chain = WordChain::build("a b c a b d", 2);
		assert_eq!(chain.successors("a b"), Some(&["c".to_owned(), "d".to_owned()][..]));
		assert_eq!(chain.successors("b c"), Some(&["a".to_owned()][..]));
		assert_eq!(chain.successors("b d"), None);
	}

	#[test]
	fn test_build_chain_too_short() {
		assert!(WordChain::build("one two", 2).is_empty());
		assert!(WordChain::build("", 1).is_empty());
		assert_eq!(generate_markov("one two", MarkovOptions { order: 2, count: 3, max_words: 10 }), "");
	}

	#[test]
	fn test_generated_transitions_exist_in_source() {
		let source = "the cat sat on the mat and the dog sat on the cat";
		let chain = WordChain::build(source, 1);
		let mut rng = StdRng::seed_from_u64(17);

		for _ in 0..50 {
			let out = generate_markov_with_rng(source, MarkovOptions { order: 1, count: 1, max_words: 5 }, &mut rng);
			let words: Vec<&str> = out.split(' ').collect();
			assert!(!words.is_empty() && words.len() <= 5);
			for pair in words.windows(2) {
				let successors = chain.successors(pair[0]).expect("key observed in source");
				assert!(successors.iter().any(|s| s == pair[1]), "{} -> {} not in source", pair[0], pair[1]);
			}
		}
	}

	#[test]
	fn test_generate_count_and_bounds() {
		let source = "one two three four five six seven eight nine ten eleven twelve";
		let mut rng = StdRng::seed_from_u64(3);
		let out = generate_markov_with_rng(source, MarkovOptions { order: 2, count: 4, max_words: 6 }, &mut rng);
		let lines: Vec<&str> = out.lines().collect();
		assert_eq!(lines.len(), 4);
		for line in lines {
			let n = line.split(' ').count();
			assert!((2..=6).contains(&n), "unexpected length {n}");
		}
	}

	#[test]
	fn test_chain_exhaustion_stops_sentence() {
		// Every window is unique, so a sentence follows the source until its end
		let source = "alpha beta gamma delta";
		let mut rng = StdRng::seed_from_u64(8);
		for _ in 0..20 {
			let out = generate_markov_with_rng(source, MarkovOptions { order: 1, count: 1, max_words: 30 }, &mut rng);
			assert!(source.ends_with(&out), "{out}");
		}
	}
}
