use std::collections::HashSet;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::shuffle::{distinct_orderings, factorial, shuffle};

/// Above this many words the permutation technique stops enumerating
/// every ordering and samples instead.
pub const MAX_FULL_PERMUTATION_WORDS: usize = 7;

/// Number of distinct orderings collected when sampling permutations.
pub const MAX_SAMPLED_LINES: usize = 200;

/// Parameters of the cut-up technique.
///
/// - `fragment_size`: words per fragment (UI range 1..=5)
/// - `chaos_level`: number of full shuffle passes (UI range 1..=10)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CutUpOptions {
	pub fragment_size: usize,
	pub chaos_level: usize,
}

/// Parameters of the fold-in technique.
///
/// - `fold_position`: fold column as a percentage of the page width (UI range 10..=90)
/// - `line_width`: page width in characters (UI range 20..=120)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct FoldInOptions {
	pub fold_position: usize,
	pub line_width: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CutUpResult {
	pub text: String,
	pub fragments: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FoldInResult {
	pub text: String,
	pub lines: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineShuffleResult {
	pub text: String,
	pub lines: Vec<String>,
}

/// Result of the permutation technique.
///
/// `total_permutations` is always `n!` for the `n` input words, even when
/// only a sample of the orderings is listed in `lines`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PermutationResult {
	pub text: String,
	pub lines: Vec<String>,
	pub total_permutations: u128,
}

/// Splits a text into whitespace-delimited words.
fn words_of(text: &str) -> Vec<String> {
	text.split_whitespace().map(str::to_owned).collect()
}

/// Groups words into space-joined fragments of `fragment_size` words.
///
/// The last fragment may be shorter. A size of 0 is treated as 1.
fn fragmentize(text: &str, fragment_size: usize) -> Vec<String> {
	let words = words_of(text);
	words
		.chunks(fragment_size.max(1))
		.map(|chunk| chunk.join(" "))
		.collect()
}

/// Target number of words per output line for a given chaos level.
fn words_per_line(chaos_level: usize) -> usize {
	let target = (8.0 + chaos_level as f64 * 0.5).round() as usize;
	target.clamp(6, 12)
}

/// Cuts the input texts into fragments, shuffles them and re-flows them into lines.
///
/// Uses the thread-local random generator. See [`perform_cut_up_with_rng`].
pub fn perform_cut_up<S: AsRef<str>>(texts: &[S], options: CutUpOptions) -> CutUpResult {
	perform_cut_up_with_rng(texts, options, &mut rand::rng())
}

/// Cuts the input texts into fragments, shuffles them and re-flows them into lines.
///
/// # Behavior
/// - Blank texts are ignored, the others are joined with a single space.
/// - The words are grouped into fragments of `fragment_size` words.
/// - Fragments are shuffled `chaos_level` full passes.
/// - Fragments accumulate on a line until its word count reaches
///   `clamp(round(8 + 0.5 * chaos_level), 6, 12)`, then the line is flushed.
///
/// # Returns
/// The joined lines and the shuffled fragments. Empty input gives an empty result.
pub fn perform_cut_up_with_rng<S, R>(texts: &[S], options: CutUpOptions, rng: &mut R) -> CutUpResult
where
	S: AsRef<str>,
	R: Rng + ?Sized,
{
	let combined = texts
		.iter()
		.map(AsRef::as_ref)
		.filter(|t| !t.trim().is_empty())
		.collect::<Vec<_>>()
		.join(" ");
	if combined.trim().is_empty() {
		return CutUpResult::default();
	}

	let fragments = fragmentize(&combined, options.fragment_size);
	let shuffled = shuffle(&fragments, options.chaos_level, rng);

	let target = words_per_line(options.chaos_level);
	let mut lines: Vec<String> = Vec::new();
	let mut current: Vec<&str> = Vec::new();
	let mut word_count = 0;

	for fragment in &shuffled {
		current.push(fragment);
		word_count += fragment.split_whitespace().count();
		if word_count >= target {
			lines.push(current.join(" "));
			current.clear();
			word_count = 0;
		}
	}
	if !current.is_empty() {
		lines.push(current.join(" "));
	}

	CutUpResult {
		text: lines.join("\n"),
		fragments: shuffled,
	}
}

/// Greedy word wrap, paragraph by paragraph.
///
/// A word is appended while `len(current) + 1 + len(word) <= width`,
/// otherwise the line is flushed. A blank paragraph yields an empty line.
/// Lengths are counted in chars.
fn word_wrap(text: &str, width: usize) -> Vec<String> {
	let mut lines = Vec::new();
	for paragraph in text.split('\n') {
		let mut words = paragraph.split_whitespace();
		let Some(first) = words.next() else {
			lines.push(String::new());
			continue;
		};

		let mut current = first.to_owned();
		let mut current_len = current.chars().count();
		for word in words {
			let word_len = word.chars().count();
			if current_len + 1 + word_len <= width {
				current.push(' ');
				current.push_str(word);
				current_len += 1 + word_len;
			} else {
				lines.push(std::mem::replace(&mut current, word.to_owned()));
				current_len = word_len;
			}
		}
		lines.push(current);
	}
	lines
}

/// Right-pads a line with spaces up to `width` chars.
fn pad_end(line: &str, width: usize) -> Vec<char> {
	let mut chars: Vec<char> = line.chars().collect();
	if chars.len() < width {
		chars.resize(width, ' ');
	}
	chars
}

/// Folds two pages into one, Burroughs-style.
///
/// Both texts are wrapped to `line_width` columns. For each line the left
/// part up to the fold column comes from text A and the remainder from
/// text B. The fold column is `round(line_width * fold_position / 100)`.
///
/// # Notes
/// - A text shorter than the other contributes blank (padded) lines.
/// - Trailing whitespace is trimmed from every output line.
/// - If both texts are blank the result is empty.
pub fn perform_fold_in(text_a: &str, text_b: &str, options: FoldInOptions) -> FoldInResult {
	if text_a.trim().is_empty() && text_b.trim().is_empty() {
		return FoldInResult::default();
	}

	let width = options.line_width;
	let lines_a = word_wrap(text_a, width);
	let lines_b = word_wrap(text_b, width);
	let max_lines = lines_a.len().max(lines_b.len());
	let fold_column = (width as f64 * (options.fold_position as f64 / 100.0)).round() as usize;

	let lines: Vec<String> = (0..max_lines)
		.map(|i| {
			let line_a = pad_end(lines_a.get(i).map_or("", String::as_str), width);
			let line_b = pad_end(lines_b.get(i).map_or("", String::as_str), width);
			let left = line_a.iter().take(fold_column);
			let right = line_b.iter().skip(fold_column);
			let folded: String = left.chain(right).collect();
			folded.trim_end().to_owned()
		})
		.collect();

	FoldInResult {
		text: lines.join("\n"),
		lines,
	}
}

/// Shuffles the non-blank lines of a text (one pass).
pub fn perform_line_shuffle(text: &str) -> LineShuffleResult {
	perform_line_shuffle_with_rng(text, &mut rand::rng())
}

/// Shuffles the non-blank lines of a text with the given generator.
///
/// Lines are kept verbatim; only blank ones are dropped.
pub fn perform_line_shuffle_with_rng<R: Rng + ?Sized>(text: &str, rng: &mut R) -> LineShuffleResult {
	let lines: Vec<&str> = text.split('\n').filter(|l| !l.trim().is_empty()).collect();
	if lines.is_empty() {
		return LineShuffleResult::default();
	}
	let shuffled: Vec<String> = shuffle(&lines, 1, rng).into_iter().map(str::to_owned).collect();
	LineShuffleResult {
		text: shuffled.join("\n"),
		lines: shuffled,
	}
}

/// Every ordering of `words`, built by picking each word for the first
/// position and permuting the rest.
fn permute(words: &[String]) -> Vec<Vec<String>> {
	if words.len() <= 1 {
		return vec![words.to_vec()];
	}
	let mut result = Vec::new();
	for i in 0..words.len() {
		let mut rest = words.to_vec();
		let head = rest.remove(i);
		for mut tail in permute(&rest) {
			tail.insert(0, head.clone());
			result.push(tail);
		}
	}
	result
}

/// Lists permutations of the words of a text.
///
/// See [`perform_permutation_with_rng`].
pub fn perform_permutation(text: &str) -> PermutationResult {
	perform_permutation_with_rng(text, &mut rand::rng())
}

/// Lists permutations of the words of a text.
///
/// # Behavior
/// - 0 words: empty result, 0 permutations.
/// - 1 word: the word itself, 1 permutation.
/// - Up to [`MAX_FULL_PERMUTATION_WORDS`] words: all `n!` orderings.
/// - Above: [`MAX_SAMPLED_LINES`] distinct random orderings, in the order
///   they were first drawn.
///
/// # Notes
/// - `total_permutations` is `n!` in every case (saturating).
/// - When the words repeat so much that fewer than [`MAX_SAMPLED_LINES`]
///   distinct orderings exist, sampling stops once all of them are found.
pub fn perform_permutation_with_rng<R: Rng + ?Sized>(text: &str, rng: &mut R) -> PermutationResult {
	let words = words_of(text);
	match words.len() {
		0 => return PermutationResult::default(),
		1 => {
			return PermutationResult {
				text: words[0].clone(),
				lines: words,
				total_permutations: 1,
			};
		}
		_ => (),
	}

	let total_permutations = factorial(words.len());

	let lines: Vec<String> = if words.len() <= MAX_FULL_PERMUTATION_WORDS {
		permute(&words).into_iter().map(|p| p.join(" ")).collect()
	} else {
		let wanted = distinct_orderings(&words).min(MAX_SAMPLED_LINES as u128) as usize;
		let mut seen: HashSet<String> = HashSet::with_capacity(wanted);
		let mut lines = Vec::with_capacity(wanted);
		let mut draws = 0usize;
		while lines.len() < wanted {
			let candidate = shuffle(&words, 1, rng).join(" ");
			draws += 1;
			if seen.insert(candidate.clone()) {
				lines.push(candidate);
			}
		}
		debug!("sampled {} permutations of {} words in {} draws", lines.len(), words.len(), draws);
		lines
	};

	PermutationResult {
		text: lines.join("\n"),
		lines,
		total_permutations,
	}
}

/// Word-level selection grid for erasure ("blackout") poetry.
///
/// # Invariants
/// - `selected[i].len() == lines[i].len()` for every line `i`
/// - A fresh grid has every cell unselected
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ErasureGrid {
	lines: Vec<Vec<String>>,
	selected: Vec<Vec<bool>>,
}

impl ErasureGrid {
	/// Builds a grid from the non-blank lines of a text, nothing selected.
	pub fn from_text(text: &str) -> Self {
		let lines: Vec<Vec<String>> = text
			.split('\n')
			.filter(|l| !l.trim().is_empty())
			.map(words_of)
			.collect();
		let selected = lines.iter().map(|line| vec![false; line.len()]).collect();
		Self { lines, selected }
	}

	pub fn lines(&self) -> &[Vec<String>] {
		&self.lines
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	/// Returns whether a cell is selected; out-of-range cells are not.
	pub fn is_selected(&self, line: usize, word: usize) -> bool {
		self.selected
			.get(line)
			.and_then(|l| l.get(word))
			.copied()
			.unwrap_or(false)
	}

	/// Flips the selection of one word and returns its new state.
	///
	/// Out-of-range coordinates leave the grid untouched and return `false`.
	pub fn toggle(&mut self, line: usize, word: usize) -> bool {
		match self.selected.get_mut(line).and_then(|l| l.get_mut(word)) {
			Some(cell) => {
				*cell = !*cell;
				*cell
			}
			None => false,
		}
	}

	/// The kept words: selected words per line, blank lines dropped.
	pub fn text(&self) -> String {
		self.lines
			.iter()
			.zip(&self.selected)
			.map(|(words, selected)| {
				words
					.iter()
					.zip(selected)
					.filter(|(_, keep)| **keep)
					.map(|(w, _)| w.as_str())
					.collect::<Vec<_>>()
					.join(" ")
			})
			.filter(|line| !line.is_empty())
			.collect::<Vec<_>>()
			.join("\n")
	}
}
