use std::collections::{HashMap, HashSet};

use log::debug;
use rand::Rng;
use rand::prelude::IndexedRandom;

use super::MarkovOptions;
use crate::tagger::{Category, LexiconTagger, TagProvider, TaggedWord, tag_sentences};

/// One position of a POS chain key: a sentence-start marker or a category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
	Start,
	Tag(Category),
}

/// A POS-level Markov chain with per-category word buckets.
///
/// Each sentence is padded on the left with `order` `Slot::Start` markers,
/// so the all-start key reaches the first categories of every sentence.
/// All sentences feed a single chain: sentence boundaries are only marked
/// by that padding.
///
/// # Invariants
/// - `order >= 1`
/// - Every key holds exactly `order` slots
/// - Every category used as a successor has a non-empty bucket
/// - Buckets hold distinct words, in first-seen order
/// - The chain is never modified after `build`
#[derive(Clone, Debug, PartialEq)]
pub struct PosChain {
	order: usize,
	links: HashMap<Vec<Slot>, Vec<Category>>,
	buckets: HashMap<Category, Vec<String>>,
}

impl PosChain {
	/// Builds the chain and the word buckets from tagged sentences.
	pub fn build(sentences: &[Vec<TaggedWord>], order: usize) -> Self {
		let order = order.max(1);

		let (buckets, _) = sentences.iter().flatten().fold(
			(HashMap::<Category, Vec<String>>::new(), HashSet::<(Category, &str)>::new()),
			|(mut buckets, mut seen), word| {
				if seen.insert((word.pos, word.text.as_str())) {
					buckets.entry(word.pos).or_default().push(word.text.clone());
				}
				(buckets, seen)
			},
		);

		let links = sentences.iter().fold(HashMap::<Vec<Slot>, Vec<Category>>::new(), |mut links, sentence| {
			let padded: Vec<Slot> = std::iter::repeat_n(Slot::Start, order)
				.chain(sentence.iter().map(|w| Slot::Tag(w.pos)))
				.collect();
			for window in padded.windows(order + 1) {
				if let Slot::Tag(next) = window[order] {
					links.entry(window[..order].to_vec()).or_default().push(next);
				}
			}
			links
		});

		debug!(
			"pos chain of order {} built with {} keys and {} buckets",
			order,
			links.len(),
			buckets.len()
		);
		Self { order, links, buckets }
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn is_empty(&self) -> bool {
		self.links.is_empty()
	}

	/// The key every generation starts from.
	pub fn start_key(&self) -> Vec<Slot> {
		vec![Slot::Start; self.order]
	}

	pub fn successors(&self, key: &[Slot]) -> Option<&[Category]> {
		self.links.get(key).map(Vec::as_slice)
	}

	/// Distinct words observed with a category.
	pub fn bucket(&self, category: Category) -> &[String] {
		self.buckets.get(&category).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Generates one run of at most `max_words` words.
	///
	/// Starts at the all-start key; each step picks a random successor
	/// category, then a random word from its bucket, and slides the key.
	/// Stops early when the key has no successor or the bucket is empty.
	pub fn generate_sentence<R: Rng + ?Sized>(&self, max_words: usize, rng: &mut R) -> String {
		let mut key = self.start_key();
		let mut words: Vec<&str> = Vec::new();

		for _ in 0..max_words {
			let Some(&category) = self.successors(&key).and_then(|s| s.choose(rng)) else {
				break;
			};
			let Some(word) = self.bucket(category).choose(rng) else {
				break;
			};
			words.push(word);

			key.remove(0);
			key.push(Slot::Tag(category));
		}

		words.join(" ")
	}
}

/// Generates text from a POS chain built on `text` with the built-in tagger.
pub fn generate_pos_markov(text: &str, options: MarkovOptions) -> String {
	generate_pos_markov_with(&LexiconTagger, text, options, &mut rand::rng())
}

/// Generates text from a POS chain built on `text` tagged by `tagger`.
///
/// # Returns
/// - An empty string when the text has no taggable word.
/// - Otherwise the non-empty runs joined by `\n` (at most `count` lines).
pub fn generate_pos_markov_with<T, R>(tagger: &T, text: &str, options: MarkovOptions, rng: &mut R) -> String
where
	T: TagProvider + ?Sized,
	R: Rng + ?Sized,
{
	let sentences = tag_sentences(tagger, text);
	if sentences.is_empty() {
		return String::new();
	}

	let chain = PosChain::build(&sentences, options.order);
	if chain.is_empty() {
		return String::new();
	}

	(0..options.count)
		.map(|_| chain.generate_sentence(options.max_words, rng))
		.filter(|s| !s.is_empty())
		.collect::<Vec<_>>()
		.join("\n")
}
