use std::sync::LazyLock;

use regex::Regex;

// Endings that do not add a syllable. Applied in this order.
static SILENT_ES: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?:[^leascx]|(?:[^s]ch)|(?:[^s]sh))es$").expect("valid regex"));
static SILENT_ED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:[^td])ed$").expect("valid regex"));
static SILENT_E: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^laeiouy])e$").expect("valid regex"));
static LEADING_Y: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^y").expect("valid regex"));
static VOWEL_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[aeiouy]+").expect("valid regex"));
static VOWEL_LE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[aeiouy]le$").expect("valid regex"));

/// Estimates the number of syllables of an English word.
///
/// This is a heuristic, not a dictionary lookup:
/// 1. Lower-case and keep ASCII letters only (empty → 0).
/// 2. Words of at most two letters count as one syllable.
/// 3. Strip endings that are usually silent: `-es`, `-ed`, a final `e`.
/// 4. Strip a leading `y` (consonant y).
/// 5. Count vowel groups `[aeiouy]+`.
/// 6. Add one for a consonant + `le` ending ("table", "little").
///
/// The result is never below 1 for a word with letters.
pub fn count_syllables(word: &str) -> usize {
	let original: String = word
		.to_lowercase()
		.chars()
		.filter(|c| c.is_ascii_lowercase())
		.collect();
	if original.is_empty() {
		return 0;
	}
	if original.len() <= 2 {
		return 1;
	}

	let w = SILENT_ES.replace(&original, "");
	let w = SILENT_ED.replace(&w, "");
	let w = SILENT_E.replace(&w, "$1");
	let w = LEADING_Y.replace(&w, "");

	let mut count = VOWEL_GROUP.find_iter(&w).count();
	if original.ends_with("le") && !VOWEL_LE.is_match(&original) {
		count += 1;
	}

	count.max(1)
}

/// Sums [`count_syllables`] over the whitespace-separated words of a line.
pub fn count_line_syllables(line: &str) -> usize {
	line.split_whitespace().map(count_syllables).sum()
}

/// Re-flows a text into lines of roughly `target` syllables.
///
/// All words are flattened (line breaks become spaces) and accumulated
/// greedily. When the next word would overshoot `target`, the line either
/// stops before it or includes it and stops, whichever lands closer to
/// `target`. Ties stop before the word.
///
/// # Notes
/// - `target == 0` or a text without words returns the text unchanged.
/// - The multiset of words is preserved and no empty line is produced.
pub fn break_by_syllables(text: &str, target: usize) -> String {
	let words: Vec<&str> = text.split_whitespace().collect();
	if words.is_empty() || target == 0 {
		return text.to_owned();
	}

	let mut lines: Vec<String> = Vec::new();
	let mut current: Vec<&str> = Vec::new();
	let mut current_count = 0usize;

	for word in words {
		let syllables = count_syllables(word);
		if !current.is_empty() && current_count + syllables > target {
			let without = current_count.abs_diff(target);
			let with_word = (current_count + syllables).abs_diff(target);
			if without <= with_word {
				lines.push(current.join(" "));
				current = vec![word];
				current_count = syllables;
			} else {
				current.push(word);
				lines.push(current.join(" "));
				current.clear();
				current_count = 0;
			}
		} else {
			current.push(word);
			current_count += syllables;
		}
	}
	if !current.is_empty() {
		lines.push(current.join(" "));
	}

	lines.join("\n")
}
