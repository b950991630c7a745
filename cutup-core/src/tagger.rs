use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Simplified part-of-speech category of a word.
///
/// The set is closed: every tagged word maps to exactly one category,
/// `Other` being the catch-all.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
	Noun,
	Verb,
	Adjective,
	Adverb,
	Pronoun,
	Preposition,
	Determiner,
	Conjunction,
	Other,
}

/// Raw tag → category, in priority order. The first raw tag found wins.
const PRIORITY: [(&str, Category); 8] = [
	("Noun", Category::Noun),
	("Verb", Category::Verb),
	("Adjective", Category::Adjective),
	("Adverb", Category::Adverb),
	("Pronoun", Category::Pronoun),
	("Preposition", Category::Preposition),
	("Determiner", Category::Determiner),
	("Conjunction", Category::Conjunction),
];

impl Category {
	pub const ALL: [Category; 9] = [
		Category::Noun,
		Category::Verb,
		Category::Adjective,
		Category::Adverb,
		Category::Pronoun,
		Category::Preposition,
		Category::Determiner,
		Category::Conjunction,
		Category::Other,
	];

	/// Resolves a raw tag set to a single category.
	///
	/// Walks the priority list (Noun, Verb, Adjective, Adverb, Pronoun,
	/// Preposition, Determiner, Conjunction) and returns the first category
	/// whose raw tag is present. Unknown tags are ignored; an empty or
	/// unrecognised set gives `Other`.
	pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
		PRIORITY
			.iter()
			.find(|(tag, _)| tags.iter().any(|t| t.as_ref() == *tag))
			.map(|(_, category)| *category)
			.unwrap_or(Category::Other)
	}

	/// Three-letter key (`NOU`, `VRB`, ...).
	pub fn key(&self) -> &'static str {
		match self {
			Category::Noun => "NOU",
			Category::Verb => "VRB",
			Category::Adjective => "ADJ",
			Category::Adverb => "ADV",
			Category::Pronoun => "PRO",
			Category::Preposition => "PRP",
			Category::Determiner => "DET",
			Category::Conjunction => "CNJ",
			Category::Other => "OTH",
		}
	}

	/// Short display label (`Noun`, `Adj`, `Prep`, ...).
	pub fn label(&self) -> &'static str {
		match self {
			Category::Noun => "Noun",
			Category::Verb => "Verb",
			Category::Adjective => "Adj",
			Category::Adverb => "Adv",
			Category::Pronoun => "Pro",
			Category::Preposition => "Prep",
			Category::Determiner => "Det",
			Category::Conjunction => "Conj",
			Category::Other => "Other",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

impl FromStr for Category {
	type Err = String;

	/// Accepts a key (`ADJ`) or a label (`Adj`), case-insensitive.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		Category::ALL
			.into_iter()
			.find(|c| c.key().eq_ignore_ascii_case(s) || c.label().eq_ignore_ascii_case(s))
			.ok_or_else(|| format!("Unknown POS category: {s}"))
	}
}

/// A term as produced by a tagging capability: its text and raw tag names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTerm {
	pub text: String,
	pub tags: Vec<String>,
}

/// A word with its resolved category.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TaggedWord {
	pub text: String,
	pub pos: Category,
}

/// Sentence segmentation and part-of-speech tagging capability.
///
/// Implementations return, for every sentence of `text`, its terms in
/// order with their raw tags (`"Noun"`, `"Verb"`, `"Punctuation"`, ...).
/// Tags outside the known set are allowed and simply ignored.
pub trait TagProvider {
	fn tag_sentences(&self, text: &str) -> Vec<Vec<RawTerm>>;
}

/// A term is dropped when tagged as punctuation and holding no letter.
fn is_pure_punctuation(term: &RawTerm) -> bool {
	term.tags.iter().any(|t| t == "Punctuation") && !term.text.chars().any(|c| c.is_ascii_alphabetic())
}

/// Tags a text sentence by sentence.
///
/// Pure punctuation terms are dropped, then sentences left empty.
pub fn tag_sentences<T: TagProvider + ?Sized>(provider: &T, text: &str) -> Vec<Vec<TaggedWord>> {
	provider
		.tag_sentences(text)
		.into_iter()
		.map(|sentence| {
			sentence
				.into_iter()
				.filter(|term| !is_pure_punctuation(term))
				.map(|term| TaggedWord {
					pos: Category::from_tags(&term.tags),
					text: term.text,
				})
				.collect::<Vec<_>>()
		})
		.filter(|sentence| !sentence.is_empty())
		.collect()
}

/// Tags a text as one flat list of words.
pub fn tag_words<T: TagProvider + ?Sized>(provider: &T, text: &str) -> Vec<TaggedWord> {
	tag_sentences(provider, text).into_iter().flatten().collect()
}

const PRONOUNS: &[&str] = &[
	"i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him", "his",
	"himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us", "our", "ours",
	"ourselves", "they", "them", "their", "theirs", "themselves", "who", "whom", "whose", "what",
	"someone", "something", "anyone", "anything", "everyone", "everything", "nobody", "nothing",
];

const DETERMINERS: &[&str] = &[
	"the", "a", "an", "this", "that", "these", "those", "each", "every", "some", "any", "no",
	"another", "all", "both", "either", "neither", "such", "which",
];

const PREPOSITIONS: &[&str] = &[
	"about", "above", "across", "after", "against", "along", "among", "around", "as", "at",
	"before", "behind", "below", "beneath", "beside", "between", "beyond", "by", "despite",
	"down", "during", "except", "for", "from", "in", "inside", "into", "like", "near", "of",
	"off", "on", "onto", "out", "outside", "over", "past", "since", "through", "throughout",
	"till", "to", "toward", "towards", "under", "underneath", "until", "up", "upon", "with",
	"within", "without",
];

const CONJUNCTIONS: &[&str] = &[
	"and", "but", "or", "nor", "so", "yet", "because", "although", "though", "while", "whereas",
	"if", "unless", "whether", "than", "that",
];

const MODALS: &[&str] = &["will", "would", "shall", "should", "can", "could", "may", "might", "must"];

const VERBS: &[&str] = &[
	"is", "am", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
	"did", "go", "goes", "went", "gone", "come", "came", "say", "says", "said", "make", "made",
	"see", "saw", "seen", "know", "knew", "take", "took", "get", "got", "give", "gave", "think",
	"thought", "want", "like", "sat", "ran", "ate", "sang", "slept", "fell", "felt", "held",
	"kept", "left", "lost", "met", "paid", "sent", "spent", "stood", "told", "wrote", "became",
	"began", "brought", "bought", "caught", "chose", "drew", "drove", "drank", "flew", "forgot",
	"froze", "grew", "hid", "lay", "led", "rang", "rose", "shook", "shone", "sank", "spoke",
	"stole", "swam", "threw", "wore", "won", "sleep", "dream", "run", "sing", "speak", "fall",
];

const ADVERBS: &[&str] = &[
	"not", "very", "too", "also", "just", "only", "never", "always", "often", "here", "there",
	"now", "then", "soon", "again", "still", "even", "already", "almost", "quite", "rather",
	"perhaps", "ever", "so", "away", "once",
];

const ADJECTIVES: &[&str] = &[
	"good", "bad", "new", "old", "great", "little", "big", "small", "long", "short", "high",
	"low", "young", "dark", "light", "red", "black", "white", "blue", "green", "cold", "warm",
	"strange", "quiet", "empty", "soft", "bright", "deep", "happy", "sad", "lazy", "quick",
	"brown", "last", "first", "other", "same",
];

const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "less", "ish", "ical"];

/// Built-in heuristic English tagger.
///
/// # Behavior
/// - Sentences end after a token whose trailing punctuation holds `.`, `!`
///   or `?`, and at blank lines.
/// - Leading and trailing punctuation is split off each whitespace token;
///   tokens without any alphanumeric character become `Punctuation` terms.
/// - Closed-class words are looked up in small lexicons, open-class words
///   are guessed from their suffix, the previous term, and capitalisation.
///
/// Some lexicon words carry two raw tags (`"like"` is a Verb and a
/// Preposition, `"that"` a Determiner and a Conjunction); the category
/// priority decides between them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LexiconTagger;

impl LexiconTagger {
	/// Splits a whitespace token into (leading punctuation, core, trailing punctuation).
	fn split_token(token: &str) -> (&str, &str, &str) {
		let start = token
			.char_indices()
			.find(|(_, c)| c.is_alphanumeric())
			.map(|(i, _)| i);
		let Some(start) = start else {
			return (token, "", "");
		};
		// A char was found above, so the reverse search finds one too
		let end = token
			.char_indices()
			.rev()
			.find(|(_, c)| c.is_alphanumeric())
			.map(|(i, c)| i + c.len_utf8())
			.unwrap_or(token.len());
		(&token[..start], &token[start..end], &token[end..])
	}

	/// Raw tags for a single word given the tags of the previous word.
	fn tag_word(word: &str, previous: Option<&[String]>, sentence_start: bool) -> Vec<String> {
		let lower = word.to_lowercase();
		let lower = lower.as_str();
		let mut tags: Vec<&str> = Vec::new();

		if !lower.chars().any(|c| c.is_alphabetic()) {
			return vec!["Value".to_owned()];
		}

		if VERBS.contains(&lower) {
			tags.push("Verb");
		}
		if MODALS.contains(&lower) {
			tags.extend(["Verb", "Modal"]);
		}
		if ADJECTIVES.contains(&lower) {
			tags.push("Adjective");
		}
		if ADVERBS.contains(&lower) {
			tags.push("Adverb");
		}
		if PRONOUNS.contains(&lower) {
			tags.push("Pronoun");
		}
		if PREPOSITIONS.contains(&lower) {
			tags.push("Preposition");
		}
		if DETERMINERS.contains(&lower) {
			tags.push("Determiner");
		}
		if CONJUNCTIONS.contains(&lower) {
			tags.push("Conjunction");
		}
		if !tags.is_empty() {
			return tags.into_iter().map(str::to_owned).collect();
		}

		let chars = lower.chars().count();
		let previous_has = |tag: &str| previous.is_some_and(|p| p.iter().any(|t| t == tag));

		if chars > 3 && lower.ends_with("ly") {
			tags.push("Adverb");
		} else if chars > 4 && lower.ends_with("ing") {
			tags.extend(["Verb", "Gerund"]);
		} else if chars > 3 && lower.ends_with("ed") {
			tags.extend(["Verb", "PastTense"]);
		} else if ["ize", "ise", "ify"].iter().any(|s| lower.ends_with(s)) && chars > 4 {
			tags.push("Verb");
		} else if ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) && chars > 4 {
			tags.push("Adjective");
		} else if !sentence_start && word.starts_with(|c: char| c.is_uppercase()) {
			tags.extend(["Noun", "ProperNoun"]);
		} else if previous_has("Determiner") || previous_has("Adjective") {
			tags.extend(["Noun", "Singular"]);
		} else if previous_has("Modal") || previous_has("Pronoun") || previous.is_some_and(|p| p.iter().any(|t| t == "Infinitive")) {
			tags.push("Verb");
		} else {
			tags.push("Noun");
		}

		if lower.ends_with('s') && tags.first() == Some(&"Noun") {
			tags.push("Plural");
		}
		tags.into_iter().map(str::to_owned).collect()
	}
}

impl TagProvider for LexiconTagger {
	fn tag_sentences(&self, text: &str) -> Vec<Vec<RawTerm>> {
		let mut sentences: Vec<Vec<RawTerm>> = Vec::new();
		let mut current: Vec<RawTerm> = Vec::new();

		for line in text.lines() {
			if line.trim().is_empty() {
				if !current.is_empty() {
					sentences.push(std::mem::take(&mut current));
				}
				continue;
			}

			for token in line.split_whitespace() {
				let (leading, core, trailing) = Self::split_token(token);
				if !leading.is_empty() {
					current.push(RawTerm { text: leading.to_owned(), tags: vec!["Punctuation".to_owned()] });
				}
				if !core.is_empty() {
					let previous = current.last().map(|t| t.tags.as_slice());
					let sentence_start = current.iter().all(|t| t.tags.iter().any(|tag| tag == "Punctuation"));
					let mut tags = Self::tag_word(core, previous, sentence_start);
					if core.eq_ignore_ascii_case("to") {
						tags.push("Infinitive".to_owned());
					}
					current.push(RawTerm { text: core.to_owned(), tags });
				}
				if !trailing.is_empty() {
					current.push(RawTerm { text: trailing.to_owned(), tags: vec!["Punctuation".to_owned()] });
					if trailing.contains(['.', '!', '?']) {
						sentences.push(std::mem::take(&mut current));
					}
				}
			}
		}
		if !current.is_empty() {
			sentences.push(current);
		}

		sentences
	}
}
