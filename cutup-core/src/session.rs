use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::io::{export_filename, read_binary, write_binary, write_text_in};
use crate::markov::pos::generate_pos_markov_with;
use crate::markov::word::generate_markov_with_rng;
use crate::markov::{DEFAULT_MAX_WORDS, MarkovOptions};
use crate::tagger::LexiconTagger;
use crate::text::engine::{
	CutUpOptions, ErasureGrid, FoldInOptions, perform_cut_up_with_rng, perform_fold_in, perform_line_shuffle_with_rng,
	perform_permutation_with_rng,
};
use crate::text::syllable::break_by_syllables;

/// Maximum number of history entries kept by a session.
pub const MAX_HISTORY: usize = 50;

/// Version written in (and required from) history exports.
pub const EXPORT_VERSION: u32 = 1;

/// Text transformation applied by [`Session::cut`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Technique {
	#[default]
	CutUp,
	FoldIn,
	Permutation,
	LineShuffle,
	Erasure,
}

impl Technique {
	pub const ALL: [Technique; 5] = [
		Technique::CutUp,
		Technique::FoldIn,
		Technique::Permutation,
		Technique::LineShuffle,
		Technique::Erasure,
	];

	/// Name used in exports and query strings.
	pub fn name(self) -> &'static str {
		match self {
			Technique::CutUp => "cutup",
			Technique::FoldIn => "foldin",
			Technique::Permutation => "permutation",
			Technique::LineShuffle => "lineshuffle",
			Technique::Erasure => "erasure",
		}
	}

	/// Whether the second input takes part in this technique.
	pub fn uses_second_text(self) -> bool {
		matches!(self, Technique::CutUp | Technique::FoldIn)
	}
}

impl fmt::Display for Technique {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Technique {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim().to_ascii_lowercase();
		Technique::ALL
			.into_iter()
			.find(|t| t.name() == s)
			.ok_or_else(|| format!("Unknown technique: {s}"))
	}
}

/// Generator used by [`Session::refine`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkovMode {
	Word,
	#[default]
	Pos,
}

impl FromStr for MarkovMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"word" => Ok(MarkovMode::Word),
			"pos" => Ok(MarkovMode::Pos),
			other => Err(format!("Unknown markov mode: {other}")),
		}
	}
}

/// Parameters of a session. Setters on [`Session`] keep them in range.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	pub technique: Technique,
	/// 1..=5
	pub fragment_size: usize,
	/// 1..=10
	pub chaos_level: usize,
	/// 10..=90
	pub fold_position: usize,
	/// 20..=120
	pub line_width: usize,
	/// 0..=16, 0 disables syllable line breaking
	pub target_syllables: usize,
	pub markov_mode: MarkovMode,
	/// 1..=4
	pub markov_order: usize,
	/// 1..=12
	pub markov_count: usize,
	pub show_syllables: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			technique: Technique::CutUp,
			fragment_size: 2,
			chaos_level: 5,
			fold_position: 50,
			line_width: 60,
			target_syllables: 0,
			markov_mode: MarkovMode::Pos,
			markov_order: 2,
			markov_count: 5,
			show_syllables: false,
		}
	}
}

impl Settings {
	/// Returns a copy with every numeric field clamped to its range.
	pub fn clamped(self) -> Self {
		Self {
			fragment_size: self.fragment_size.clamp(1, 5),
			chaos_level: self.chaos_level.clamp(1, 10),
			fold_position: self.fold_position.clamp(10, 90),
			line_width: self.line_width.clamp(20, 120),
			target_syllables: self.target_syllables.min(16),
			markov_order: self.markov_order.clamp(1, 4),
			markov_count: self.markov_count.clamp(1, 12),
			..self
		}
	}

	pub fn cut_up_options(&self) -> CutUpOptions {
		CutUpOptions { fragment_size: self.fragment_size, chaos_level: self.chaos_level }
	}

	pub fn fold_in_options(&self) -> FoldInOptions {
		FoldInOptions { fold_position: self.fold_position, line_width: self.line_width }
	}

	pub fn markov_options(&self) -> MarkovOptions {
		MarkovOptions { order: self.markov_order, count: self.markov_count, max_words: DEFAULT_MAX_WORDS }
	}
}

/// A recorded cut.
///
/// `second_input_text` is only set for techniques using both inputs,
/// `fold_position` and `line_width` only for fold-ins.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
	pub id: String,
	/// Unix time in milliseconds
	pub timestamp: i64,
	pub input_text: String,
	#[serde(default)]
	pub second_input_text: Option<String>,
	pub output_text: String,
	pub technique: Technique,
	pub fragment_size: usize,
	pub chaos_level: usize,
	#[serde(default)]
	pub fold_position: Option<usize>,
	#[serde(default)]
	pub line_width: Option<usize>,
	#[serde(default)]
	pub label: Option<String>,
}

/// JSON document produced by [`Session::export_history`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
	pub version: u32,
	#[serde(default)]
	pub exported_at: i64,
	pub entries: Vec<HistoryEntry>,
}

/// The persisted part of a session.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
	pub settings: Settings,
	pub history: Vec<HistoryEntry>,
}

/// Interactive state around the engine: inputs, settings, outputs and history.
///
/// # Invariants
/// - Settings are always within their ranges
/// - `history` is newest first and never longer than [`MAX_HISTORY`]
/// - An erasure grid only exists while the technique is `Erasure`
#[derive(Clone, Debug, Default)]
pub struct Session {
	input_text: String,
	second_input_text: String,
	settings: Settings,
	output_text: String,
	refined_text: String,
	erasure: Option<ErasureGrid>,
	history: Vec<HistoryEntry>,
}

impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	/// Restores settings and history from a snapshot.
	pub fn from_snapshot(snapshot: Snapshot) -> Self {
		let mut history = snapshot.history;
		history.truncate(MAX_HISTORY);
		Self {
			settings: snapshot.settings.clamped(),
			history,
			..Self::default()
		}
	}

	pub fn snapshot(&self) -> Snapshot {
		Snapshot { settings: self.settings, history: self.history.clone() }
	}

	/// Loads a session from a snapshot file.
	///
	/// A missing file gives a fresh session.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
		let snapshot = read_binary::<Snapshot, _>(&path)?;
		match snapshot {
			Some(snapshot) => {
				debug!("session restored with {} history entries", snapshot.history.len());
				Ok(Self::from_snapshot(snapshot))
			}
			None => Ok(Self::default()),
		}
	}

	/// Writes settings and history to a snapshot file.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
		write_binary(path, &self.snapshot())
	}

	// Inputs and settings

	pub fn input_text(&self) -> &str {
		&self.input_text
	}

	pub fn set_input_text(&mut self, text: impl Into<String>) {
		self.input_text = text.into();
	}

	pub fn second_input_text(&self) -> &str {
		&self.second_input_text
	}

	pub fn set_second_input_text(&mut self, text: impl Into<String>) {
		self.second_input_text = text.into();
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Replaces all settings at once, clamping them.
	pub fn set_settings(&mut self, settings: Settings) {
		if settings.technique != self.settings.technique {
			self.erasure = None;
		}
		self.settings = settings.clamped();
	}

	/// Changes the technique and discards any erasure grid.
	pub fn set_technique(&mut self, technique: Technique) {
		self.settings.technique = technique;
		self.erasure = None;
	}

	pub fn set_fragment_size(&mut self, size: usize) {
		self.settings.fragment_size = size.clamp(1, 5);
	}

	pub fn set_chaos_level(&mut self, level: usize) {
		self.settings.chaos_level = level.clamp(1, 10);
	}

	pub fn set_fold_position(&mut self, position: usize) {
		self.settings.fold_position = position.clamp(10, 90);
	}

	pub fn set_line_width(&mut self, width: usize) {
		self.settings.line_width = width.clamp(20, 120);
	}

	pub fn set_target_syllables(&mut self, count: usize) {
		self.settings.target_syllables = count.min(16);
	}

	pub fn set_markov_mode(&mut self, mode: MarkovMode) {
		self.settings.markov_mode = mode;
	}

	pub fn set_markov_order(&mut self, order: usize) {
		self.settings.markov_order = order.clamp(1, 4);
	}

	pub fn set_markov_count(&mut self, count: usize) {
		self.settings.markov_count = count.clamp(1, 12);
	}

	pub fn toggle_syllables(&mut self) {
		self.settings.show_syllables = !self.settings.show_syllables;
	}

	// Outputs

	pub fn output_text(&self) -> &str {
		&self.output_text
	}

	pub fn refined_text(&self) -> &str {
		&self.refined_text
	}

	pub fn erasure(&self) -> Option<&ErasureGrid> {
		self.erasure.as_ref()
	}

	/// Runs the current technique. See [`Session::cut_with_rng`].
	pub fn cut(&mut self) -> bool {
		self.cut_with_rng(&mut rand::rng())
	}

	/// Runs the current technique on the inputs.
	///
	/// # Behavior
	/// - Does nothing when the input is blank, or for a fold-in without a
	///   second text.
	/// - Erasure builds a fresh grid and clears the outputs.
	/// - Other techniques replace the output (re-broken by syllables for
	///   cut-up and permutation when a target is set) and record it in
	///   the history.
	///
	/// Returns `false` when nothing was done.
	pub fn cut_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
		let technique = self.settings.technique;
		if self.input_text.trim().is_empty() {
			return false;
		}
		if technique == Technique::FoldIn && self.second_input_text.trim().is_empty() {
			return false;
		}

		self.refined_text.clear();
		self.erasure = None;

		let mut output = match technique {
			Technique::Erasure => {
				self.erasure = Some(ErasureGrid::from_text(&self.input_text));
				self.output_text.clear();
				return true;
			}
			Technique::CutUp => {
				let mut texts = vec![self.input_text.as_str()];
				if !self.second_input_text.trim().is_empty() {
					texts.push(&self.second_input_text);
				}
				perform_cut_up_with_rng(&texts, self.settings.cut_up_options(), rng).text
			}
			Technique::FoldIn => {
				perform_fold_in(&self.input_text, &self.second_input_text, self.settings.fold_in_options()).text
			}
			Technique::LineShuffle => perform_line_shuffle_with_rng(&self.input_text, rng).text,
			Technique::Permutation => perform_permutation_with_rng(&self.input_text, rng).text,
		};

		let target = self.settings.target_syllables;
		if target > 0 && matches!(technique, Technique::CutUp | Technique::Permutation) {
			output = break_by_syllables(&output, target);
		}
		self.output_text = output;
		self.add_to_history();
		true
	}

	/// Cuts again with the same inputs and settings.
	pub fn re_cut(&mut self) -> bool {
		self.cut()
	}

	/// Generates Markov text from the inputs. See [`Session::refine_with_rng`].
	pub fn refine(&mut self) -> bool {
		self.refine_with_rng(&mut rand::rng())
	}

	/// Replaces the refined text with Markov output built on the non-blank inputs.
	///
	/// Uses the word or POS generator depending on the markov mode, with
	/// sentences of at most [`DEFAULT_MAX_WORDS`] words, re-broken by
	/// syllables when a target is set. Returns `false` if both inputs are blank.
	pub fn refine_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
		let source = [self.input_text.as_str(), self.second_input_text.as_str()]
			.into_iter()
			.filter(|t| !t.trim().is_empty())
			.collect::<Vec<_>>()
			.join(" ");
		if source.is_empty() {
			return false;
		}

		let options = self.settings.markov_options();
		let mut result = match self.settings.markov_mode {
			MarkovMode::Word => generate_markov_with_rng(&source, options, rng),
			MarkovMode::Pos => generate_pos_markov_with(&LexiconTagger, &source, options, rng),
		};
		if self.settings.target_syllables > 0 {
			result = break_by_syllables(&result, self.settings.target_syllables);
		}
		self.refined_text = result;
		true
	}

	/// Toggles one erasure word. Returns `false` without a grid or out of range.
	pub fn toggle_erasure_word(&mut self, line: usize, word: usize) -> bool {
		self.erasure.as_mut().is_some_and(|grid| grid.toggle(line, word))
	}

	/// The selected erasure words, one line per grid line that kept any.
	pub fn erasure_text(&self) -> String {
		self.erasure.as_ref().map(ErasureGrid::text).unwrap_or_default()
	}

	/// The text a user sees as output: the erasure read-out or the cut output.
	pub fn current_text(&self) -> String {
		match self.settings.technique {
			Technique::Erasure => self.erasure_text(),
			_ => self.output_text.clone(),
		}
	}

	/// Moves the current text into the input and clears every output.
	pub fn use_output_as_input(&mut self) -> bool {
		let text = self.current_text();
		if text.is_empty() {
			return false;
		}
		self.input_text = text;
		self.output_text.clear();
		self.refined_text.clear();
		self.erasure = None;
		true
	}

	// History

	pub fn history(&self) -> &[HistoryEntry] {
		&self.history
	}

	/// Records the current output as the newest history entry.
	///
	/// Returns the new entry, or `None` if there is no output.
	pub fn add_to_history(&mut self) -> Option<&HistoryEntry> {
		if self.output_text.is_empty() {
			return None;
		}

		let technique = self.settings.technique;
		let is_fold_in = technique == Technique::FoldIn;
		let entry = HistoryEntry {
			id: Ulid::new().to_string(),
			timestamp: Utc::now().timestamp_millis(),
			input_text: self.input_text.clone(),
			second_input_text: (technique.uses_second_text() && !self.second_input_text.trim().is_empty())
				.then(|| self.second_input_text.clone()),
			output_text: self.output_text.clone(),
			technique,
			fragment_size: self.settings.fragment_size,
			chaos_level: self.settings.chaos_level,
			fold_position: is_fold_in.then_some(self.settings.fold_position),
			line_width: is_fold_in.then_some(self.settings.line_width),
			label: None,
		};

		self.history.insert(0, entry);
		self.history.truncate(MAX_HISTORY);
		self.history.first()
	}

	/// Removes an entry. Returns `false` if no entry has this id.
	pub fn delete_history_entry(&mut self, id: &str) -> bool {
		let before = self.history.len();
		self.history.retain(|e| e.id != id);
		self.history.len() != before
	}

	/// Sets or clears the label of an entry. Returns `false` if no entry has this id.
	pub fn label_history_entry(&mut self, id: &str, label: Option<String>) -> bool {
		match self.history.iter_mut().find(|e| e.id == id) {
			Some(entry) => {
				entry.label = label.filter(|l| !l.trim().is_empty());
				true
			}
			None => false,
		}
	}

	pub fn clear_history(&mut self) {
		self.history.clear();
	}

	/// Restores the inputs, output and parameters of an entry.
	///
	/// Missing fold parameters fall back to their defaults.
	pub fn load_from_history(&mut self, id: &str) -> Result<(), String> {
		let entry = self
			.history
			.iter()
			.find(|e| e.id == id)
			.cloned()
			.ok_or_else(|| format!("Unknown history entry: {id}"))?;

		let defaults = Settings::default();
		self.input_text = entry.input_text;
		self.second_input_text = entry.second_input_text.unwrap_or_default();
		self.output_text = entry.output_text;
		self.refined_text.clear();
		self.set_technique(entry.technique);
		self.set_fragment_size(entry.fragment_size);
		self.set_chaos_level(entry.chaos_level);
		self.set_fold_position(entry.fold_position.unwrap_or(defaults.fold_position));
		self.set_line_width(entry.line_width.unwrap_or(defaults.line_width));
		Ok(())
	}

	/// Serializes the history as a pretty-printed, versioned JSON document.
	pub fn export_history(&self) -> serde_json::Result<String> {
		let data = ExportData {
			version: EXPORT_VERSION,
			exported_at: Utc::now().timestamp_millis(),
			entries: self.history.clone(),
		};
		serde_json::to_string_pretty(&data)
	}

	/// File name for an export made today, e.g. `cutup-history-2024-03-09.json`.
	pub fn export_filename() -> String {
		export_filename(Utc::now().date_naive())
	}

	/// Writes [`Session::export_history`] into `folder` under
	/// [`Session::export_filename`] and returns the written path.
	pub fn export_history_to<P: AsRef<Path>>(&self, folder: P) -> Result<PathBuf, Box<dyn std::error::Error>> {
		let json = self.export_history()?;
		Ok(write_text_in(folder, &Self::export_filename(), &json)?)
	}

	/// Merges an exported history document into the history.
	///
	/// Entries whose id is already known are skipped; the others are put in
	/// front, then the history is capped at [`MAX_HISTORY`].
	///
	/// Returns `false`, leaving the history untouched, if the document is not
	/// valid JSON, has another version, or its `entries` is not a list of
	/// history entries.
	pub fn import_history(&mut self, json: &str) -> bool {
		let data: ExportData = match serde_json::from_str(json) {
			Ok(data) => data,
			Err(e) => {
				warn!("history import rejected: {e}");
				return false;
			}
		};
		if data.version != EXPORT_VERSION {
			warn!("history import rejected: unsupported version {}", data.version);
			return false;
		}

		let known: HashSet<&str> = self.history.iter().map(|e| e.id.as_str()).collect();
		let mut merged: Vec<HistoryEntry> = data
			.entries
			.into_iter()
			.filter(|e| !known.contains(e.id.as_str()))
			.collect();
		debug!("importing {} new history entries", merged.len());

		merged.append(&mut self.history);
		merged.truncate(MAX_HISTORY);
		self.history = merged;
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn session_with(input: &str, technique: Technique) -> Session {
		let mut session = Session::new();
		session.set_input_text(input);
		session.set_technique(technique);
		session
	}

	fn sorted_words(text: &str) -> Vec<&str> {
		let mut words: Vec<&str> = text.split_whitespace().collect();
		words.sort_unstable();
		words
	}

	#[test]
	fn test_default_settings() {
		let s = Settings::default();
		assert_eq!(s.technique, Technique::CutUp);
		assert_eq!((s.fragment_size, s.chaos_level), (2, 5));
		assert_eq!((s.fold_position, s.line_width), (50, 60));
		assert_eq!(s.target_syllables, 0);
		assert_eq!(s.markov_mode, MarkovMode::Pos);
		assert_eq!((s.markov_order, s.markov_count), (2, 5));
		assert!(!s.show_syllables);
	}

	#[test]
	fn test_setters_clamp() {
		let mut session = Session::new();
		session.set_fragment_size(0);
		session.set_chaos_level(99);
		session.set_fold_position(5);
		session.set_line_width(500);
		session.set_target_syllables(40);
		session.set_markov_order(0);
		session.set_markov_count(20);

		let s = session.settings();
		assert_eq!((s.fragment_size, s.chaos_level), (1, 10));
		assert_eq!((s.fold_position, s.line_width), (10, 120));
		assert_eq!(s.target_syllables, 16);
		assert_eq!((s.markov_order, s.markov_count), (1, 12));
	}

	#[test]
	fn test_technique_names() {
		for technique in Technique::ALL {
			assert_eq!(technique.to_string().parse::<Technique>(), Ok(technique));
			let json = serde_json::to_string(&technique).unwrap();
			assert_eq!(json, format!("\"{}\"", technique.name()));
		}
		assert_eq!(" FoldIn ".parse::<Technique>(), Ok(Technique::FoldIn));
		assert!("collage".parse::<Technique>().is_err());
		assert_eq!("word".parse::<MarkovMode>(), Ok(MarkovMode::Word));
		assert!("chars".parse::<MarkovMode>().is_err());
	}

	#[test]
	fn test_cut_requires_input() {
		let mut session = session_with("   ", Technique::CutUp);
		assert!(!session.cut());
		assert!(session.history().is_empty());

		let mut session = session_with("some text", Technique::FoldIn);
		assert!(!session.cut());
		assert_eq!(session.output_text(), "");
	}

	#[test]
	fn test_cut_up_records_history() {
		let mut session = session_with("the cat sat on the mat", Technique::CutUp);
		session.set_second_input_text("a dog ran");
		let mut rng = StdRng::seed_from_u64(5);
		assert!(session.cut_with_rng(&mut rng));

		assert_eq!(
			sorted_words(session.output_text()),
			sorted_words("the cat sat on the mat a dog ran")
		);
		let entry = &session.history()[0];
		assert_eq!(entry.technique, Technique::CutUp);
		assert_eq!(entry.second_input_text.as_deref(), Some("a dog ran"));
		assert_eq!(entry.output_text, session.output_text());
		assert_eq!((entry.fold_position, entry.line_width), (None, None));
	}

	#[test]
	fn test_permutation_ignores_second_text() {
		let mut session = session_with("one two three", Technique::Permutation);
		session.set_second_input_text("ignored");
		session.cut_with_rng(&mut StdRng::seed_from_u64(1));
		assert_eq!(session.output_text().lines().count(), 6);
		assert_eq!(session.history()[0].second_input_text, None);
	}

	#[test]
	fn test_fold_in_records_parameters() {
		let mut session = session_with("aaaa aaaa", Technique::FoldIn);
		session.set_second_input_text("bbbb bbbb");
		session.set_line_width(20);
		assert!(session.cut());
		let entry = &session.history()[0];
		assert_eq!(entry.fold_position, Some(50));
		assert_eq!(entry.line_width, Some(20));
		assert_eq!(entry.second_input_text.as_deref(), Some("bbbb bbbb"));
	}

	#[test]
	fn test_syllable_breaking_on_cut_up() {
		let mut session = session_with("cat dog cat dog cat dog", Technique::CutUp);
		session.set_target_syllables(2);
		session.cut_with_rng(&mut StdRng::seed_from_u64(2));
		for line in session.output_text().lines() {
			assert_eq!(line.split(' ').count(), 2, "{line}");
		}
	}

	#[test]
	fn test_erasure_flow() {
		let mut session = session_with("the quiet sea\n\nholds a bell", Technique::Erasure);
		assert!(session.cut());
		assert_eq!(session.output_text(), "");
		assert!(session.history().is_empty());
		assert_eq!(session.erasure().map(|g| g.lines().len()), Some(2));

		assert!(session.toggle_erasure_word(0, 1));
		assert!(session.toggle_erasure_word(1, 2));
		assert!(!session.toggle_erasure_word(4, 0));
		assert_eq!(session.erasure_text(), "quiet\nbell");
		assert_eq!(session.current_text(), "quiet\nbell");

		assert!(session.use_output_as_input());
		assert_eq!(session.input_text(), "quiet\nbell");
		assert!(session.erasure().is_none());
	}

	#[test]
	fn test_erasure_cut_replaces_previous_output() {
		let mut session = session_with("one two three", Technique::Permutation);
		session.cut();
		assert_eq!(session.history().len(), 1);

		session.set_technique(Technique::Erasure);
		assert!(session.cut());
		assert_eq!(session.output_text(), "");
		assert_eq!(session.erasure().map(|g| g.lines()[0].len()), Some(3));
		assert_eq!(session.erasure_text(), "");
		assert_eq!(session.history().len(), 1);
	}

	#[test]
	fn test_set_technique_discards_erasure() {
		let mut session = session_with("a b c", Technique::Erasure);
		session.cut();
		assert!(session.erasure().is_some());
		session.set_technique(Technique::CutUp);
		assert!(session.erasure().is_none());
		assert!(!session.toggle_erasure_word(0, 0));
	}

	#[test]
	fn test_use_output_as_input_needs_output() {
		let mut session = session_with("text", Technique::CutUp);
		assert!(!session.use_output_as_input());
		session.cut();
		assert!(session.use_output_as_input());
		assert_eq!(session.output_text(), "");
		assert_eq!(session.input_text(), "text");
	}

	#[test]
	fn test_refine_word_mode() {
		let source = "the cat sat on the mat and the dog sat on the rug";
		let mut session = session_with("", Technique::CutUp);
		assert!(!session.refine());

		session.set_input_text(source);
		session.set_markov_mode(MarkovMode::Word);
		session.set_markov_order(1);
		session.set_markov_count(3);
		assert!(session.refine_with_rng(&mut StdRng::seed_from_u64(9)));

		let refined = session.refined_text();
		assert_eq!(refined.lines().count(), 3);
		for word in refined.split_whitespace() {
			assert!(source.split(' ').any(|w| w == word), "{word}");
		}
	}

	#[test]
	fn test_refine_pos_mode_uses_both_inputs() {
		let mut session = session_with("The cat sleeps.", Technique::CutUp);
		session.set_second_input_text("A dog barks.");
		assert!(session.refine_with_rng(&mut StdRng::seed_from_u64(3)));
		assert!(!session.refined_text().is_empty());
		for word in session.refined_text().split_whitespace() {
			assert!(["The", "cat", "sleeps", "A", "dog", "barks"].contains(&word), "{word}");
		}
	}

	#[test]
	fn test_history_cap_and_edit() {
		let mut session = session_with("alpha beta gamma", Technique::LineShuffle);
		for _ in 0..(MAX_HISTORY + 5) {
			session.cut();
		}
		assert_eq!(session.history().len(), MAX_HISTORY);

		let newest = session.history()[0].id.clone();
		assert!(session.label_history_entry(&newest, Some("keep".into())));
		assert_eq!(session.history()[0].label.as_deref(), Some("keep"));
		assert!(session.delete_history_entry(&newest));
		assert!(!session.delete_history_entry(&newest));
		assert_eq!(session.history().len(), MAX_HISTORY - 1);

		session.clear_history();
		assert!(session.history().is_empty());
	}

	#[test]
	fn test_load_from_history() {
		let mut session = session_with("left side words", Technique::FoldIn);
		session.set_second_input_text("right side words");
		session.set_fold_position(30);
		session.cut();
		let id = session.history()[0].id.clone();
		let output = session.output_text().to_owned();

		session.set_technique(Technique::Permutation);
		session.set_input_text("something else");
		session.set_fold_position(80);

		session.load_from_history(&id).unwrap();
		assert_eq!(session.settings().technique, Technique::FoldIn);
		assert_eq!(session.settings().fold_position, 30);
		assert_eq!(session.input_text(), "left side words");
		assert_eq!(session.second_input_text(), "right side words");
		assert_eq!(session.output_text(), output);
		assert!(session.load_from_history("missing").is_err());
	}

	#[test]
	fn test_export_import_round_trip() {
		let mut source = session_with("a b c d", Technique::CutUp);
		source.cut();
		source.cut();
		let json = source.export_history().unwrap();

		let value: serde_json::Value = serde_json::from_str(&json).unwrap();
		assert_eq!(value["version"], 1);
		assert!(value["exportedAt"].is_i64());
		assert_eq!(value["entries"][0]["inputText"], "a b c d");
		assert_eq!(value["entries"][0]["technique"], "cutup");

		let mut target = Session::new();
		assert!(target.import_history(&json));
		assert_eq!(target.history(), source.history());

		// Known ids are skipped
		assert!(target.import_history(&json));
		assert_eq!(target.history().len(), 2);
	}

	#[test]
	fn test_import_prepends_new_entries() {
		let mut target = session_with("x y", Technique::LineShuffle);
		target.cut();
		let local = target.history()[0].id.clone();

		let json = r#"{"version":1,"exportedAt":0,"entries":[
			{"id":"imported","timestamp":1,"inputText":"in","outputText":"out",
			 "technique":"foldin","fragmentSize":2,"chaosLevel":5,"foldPosition":40,"lineWidth":30}
		]}"#;
		assert!(target.import_history(json));
		assert_eq!(target.history()[0].id, "imported");
		assert_eq!(target.history()[0].fold_position, Some(40));
		assert_eq!(target.history()[0].second_input_text, None);
		assert_eq!(target.history()[1].id, local);
	}

	#[test]
	fn test_import_rejections() {
		let mut session = session_with("x y", Technique::LineShuffle);
		session.cut();
		let before = session.history().to_vec();

		assert!(!session.import_history("not json"));
		assert!(!session.import_history(r#"{"version":2,"exportedAt":0,"entries":[]}"#));
		assert!(!session.import_history(r#"{"version":1,"exportedAt":0,"entries":{}}"#));
		assert!(!session.import_history(r#"{"version":1,"entries":[{"id":"x"}]}"#));
		assert_eq!(session.history(), before);
	}

	#[test]
	fn test_export_history_to_folder() {
		let dir = tempfile::tempdir().unwrap();
		let mut session = session_with("a b", Technique::CutUp);
		session.cut();
		let path = session.export_history_to(dir.path()).unwrap();

		let name = path.file_name().unwrap().to_string_lossy().to_string();
		assert!(name.starts_with("cutup-history-") && name.ends_with(".json"));
		let mut restored = Session::new();
		assert!(restored.import_history(&std::fs::read_to_string(path).unwrap()));
		assert_eq!(restored.history().len(), 1);
	}

	#[test]
	fn test_snapshot_save_load() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("data/session.bin");

		let fresh = Session::load(&path).unwrap();
		assert_eq!(fresh.settings(), &Settings::default());

		let mut session = session_with("one two three", Technique::Permutation);
		session.set_chaos_level(8);
		session.set_markov_mode(MarkovMode::Word);
		session.cut();
		session.save(&path).unwrap();

		let restored = Session::load(&path).unwrap();
		assert_eq!(restored.settings(), session.settings());
		assert_eq!(restored.history(), session.history());
		assert_eq!(restored.input_text(), "");
	}

	#[test]
	fn test_from_snapshot_clamps() {
		let snapshot = Snapshot {
			settings: Settings { line_width: 3, markov_count: 0, ..Settings::default() },
			history: Vec::new(),
		};
		let session = Session::from_snapshot(snapshot);
		assert_eq!(session.settings().line_width, 20);
		assert_eq!(session.settings().markov_count, 1);
	}
}
