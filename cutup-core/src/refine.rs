use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Longest text (in chars) sent to a refinement model.
pub const MAX_INPUT_CHARS: usize = 800;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a literary editor working with experimental cut-up texts. \
	Rewrite the following text fragments into poetic, grammatically coherent sentences. \
	Preserve the surreal imagery and unexpected juxtapositions. \
	Do not explain or comment. Output only the rewritten text.";

/// A model a refinement capability can be asked to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelOption {
	pub id: &'static str,
	pub label: &'static str,
	pub size: &'static str,
}

pub const MODELS: &[ModelOption] = &[
	ModelOption { id: "onnx-community/Qwen2.5-0.5B-Instruct", label: "Qwen 2.5 0.5B", size: "~350MB" },
	ModelOption { id: "onnx-community/Qwen2.5-1.5B-Instruct", label: "Qwen 2.5 1.5B", size: "~1GB" },
];

/// Truncates a text to [`MAX_INPUT_CHARS`] chars, marking the cut with `...`.
pub fn prepare_prompt(text: &str) -> String {
	match text.char_indices().nth(MAX_INPUT_CHARS) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_owned(),
	}
}

/// Status of a refinement capability.
///
/// ```text
/// Idle ──Load──▶ Downloading ──Generate──▶ Generating ──Complete──▶ Idle
///  │                 │                        │
///  └───Generate──────┼────────────────────────┘
///                    └──Fail──▶ Error    Abort ──▶ Idle
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub enum RefineStatus {
	#[default]
	Idle,
	Downloading,
	Generating,
	Error(String),
}

/// Events driving [`RefineStatus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefineEvent {
	/// A model must be fetched before generating.
	Load,
	/// Generation starts (the model is ready).
	Generate,
	Complete,
	Fail(String),
	Abort,
}

impl RefineStatus {
	/// Returns the status reached from `self` on `event`.
	///
	/// # Errors
	/// Returns an error for a transition the machine does not allow, e.g.
	/// completing while downloading or aborting while idle.
	pub fn next(&self, event: RefineEvent) -> Result<RefineStatus, String> {
		use RefineEvent as E;
		use RefineStatus as S;

		match (self, event) {
			(S::Idle | S::Error(_), E::Load) => Ok(S::Downloading),
			(S::Idle | S::Error(_) | S::Downloading, E::Generate) => Ok(S::Generating),
			(S::Generating, E::Complete) => Ok(S::Idle),
			(S::Downloading | S::Generating, E::Fail(e)) => Ok(S::Error(e)),
			(S::Downloading | S::Generating, E::Abort) => Ok(S::Idle),
			(status, event) => Err(format!("Invalid refine transition: {status:?} on {event:?}")),
		}
	}

	pub fn is_busy(&self) -> bool {
		matches!(self, RefineStatus::Downloading | RefineStatus::Generating)
	}
}

/// Shared flag used to abort a running refinement from another thread.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
	pub fn abort(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_aborted(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}

	fn reset(&self) {
		self.0.store(false, Ordering::SeqCst);
	}
}

/// A text-to-text refinement model (typically a local language model).
///
/// The engine only relies on "accepts arbitrary text, returns arbitrary
/// text"; how the model is fetched or run is up to the implementation.
pub trait RefineModel {
	/// Fetches and prepares the model. Called once per model id.
	fn load(&mut self, model_id: &str) -> Result<(), String>;

	/// Rewrites `text` following `system_prompt`.
	///
	/// Long-running implementations should poll `abort` and return early.
	fn generate(&mut self, system_prompt: &str, text: &str, abort: &AbortHandle) -> Result<String, String>;

	/// Releases the model's resources.
	fn dispose(&mut self) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefineOutcome {
	Complete(String),
	Aborted,
}

/// Owns a refinement model and its lifecycle.
///
/// # Lifecycle
/// - The model is created by `factory` and loaded on the first `refine`.
/// - Later calls with the same model id reuse it.
/// - Asking for another model id disposes the current one first.
/// - `dispose` releases it explicitly; the next `refine` creates a new one.
pub struct Refiner<M, F>
where
	M: RefineModel,
	F: FnMut() -> M,
{
	factory: F,
	model: Option<(String, M)>,
	status: RefineStatus,
	abort: AbortHandle,
}

impl<M, F> Refiner<M, F>
where
	M: RefineModel,
	F: FnMut() -> M,
{
	pub fn new(factory: F) -> Self {
		Self {
			factory,
			model: None,
			status: RefineStatus::Idle,
			abort: AbortHandle::default(),
		}
	}

	pub fn status(&self) -> &RefineStatus {
		&self.status
	}

	/// Id of the loaded model, if any.
	pub fn loaded_model(&self) -> Option<&str> {
		self.model.as_ref().map(|(id, _)| id.as_str())
	}

	/// A handle that aborts the current (or next) `refine` call.
	pub fn abort_handle(&self) -> AbortHandle {
		self.abort.clone()
	}

	fn transition(&mut self, event: RefineEvent) -> Result<(), String> {
		self.status = self.status.next(event)?;
		Ok(())
	}

	/// Stops on abort: moves back to idle and reports it.
	fn aborted(&mut self) -> Result<RefineOutcome, String> {
		self.transition(RefineEvent::Abort)?;
		Ok(RefineOutcome::Aborted)
	}

	fn fail(&mut self, error: String) -> Result<RefineOutcome, String> {
		warn!("refinement failed: {error}");
		self.transition(RefineEvent::Fail(error.clone()))?;
		Err(error)
	}

	/// Rewrites `text` with the model `model_id`.
	///
	/// # Returns
	/// - `Ok(Complete(text))` with the trimmed model output
	/// - `Ok(Aborted)` if the abort handle fired during the call
	///
	/// # Errors
	/// Returns the model's error when loading or generation fails; the
	/// status is then `Error` until the next call.
	pub fn refine(&mut self, model_id: &str, system_prompt: &str, text: &str) -> Result<RefineOutcome, String> {
		if self.status.is_busy() {
			return Err("A refinement is already running".to_owned());
		}
		self.abort.reset();

		if self.loaded_model() != Some(model_id) {
			self.dispose();
			self.transition(RefineEvent::Load)?;
			debug!("loading refinement model {model_id}");

			let mut model = (self.factory)();
			if let Err(e) = model.load(model_id) {
				return self.fail(e);
			}
			self.model = Some((model_id.to_owned(), model));

			if self.abort.is_aborted() {
				return self.aborted();
			}
		}

		self.transition(RefineEvent::Generate)?;
		let prompt = prepare_prompt(text);
		let abort = self.abort.clone();
		let result = match self.model.as_mut() {
			Some((_, model)) => model.generate(system_prompt, &prompt, &abort),
			None => Err("No refinement model loaded".to_owned()),
		};

		if self.abort.is_aborted() {
			return self.aborted();
		}
		match result {
			Ok(output) => {
				self.transition(RefineEvent::Complete)?;
				Ok(RefineOutcome::Complete(output.trim().to_owned()))
			}
			Err(e) => self.fail(e),
		}
	}

	/// Disposes the loaded model, if any.
	pub fn dispose(&mut self) {
		if let Some((id, mut model)) = self.model.take() {
			debug!("disposing refinement model {id}");
			model.dispose();
		}
	}
}

impl<M, F> Drop for Refiner<M, F>
where
	M: RefineModel,
	F: FnMut() -> M,
{
	fn drop(&mut self) {
		self.dispose();
	}
}
