use std::collections::HashSet;

use serde::Serialize;

use crate::tagger::{Category, TagProvider, tag_words};

/// Keeps the lines of `text` containing `needle`, case-insensitively.
///
/// The needle is trimmed first; a blank needle keeps every line.
pub fn filter_lines<'a>(text: &'a str, needle: &str) -> Vec<&'a str> {
	let needle = needle.trim().to_lowercase();
	text.split('\n')
		.filter(|line| needle.is_empty() || line.to_lowercase().contains(&needle))
		.collect()
}

/// A word of an output line, flagged when its category is highlighted.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct HighlightedWord {
	pub text: String,
	pub pos: Category,
	pub matched: bool,
}

/// Tags every line of `text` and flags words whose category is in `categories`.
///
/// Returns one entry per line (blank lines give an empty list).
pub fn highlight_pos<T: TagProvider + ?Sized>(
	tagger: &T,
	text: &str,
	categories: &HashSet<Category>,
) -> Vec<Vec<HighlightedWord>> {
	text.split('\n')
		.map(|line| {
			tag_words(tagger, line)
				.into_iter()
				.map(|word| HighlightedWord {
					matched: categories.contains(&word.pos),
					text: word.text,
					pos: word.pos,
				})
				.collect()
		})
		.collect()
}
