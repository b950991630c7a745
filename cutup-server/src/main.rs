use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use actix_cors::Cors;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, delete, get, put, web};
use log::{info, warn};
use serde::Deserialize;

use cutup_core::refine::MODELS;
use cutup_core::session::{MarkovMode, Session, Settings, Technique};
use cutup_core::tagger::{Category, LexiconTagger};
use cutup_core::text::filter::{filter_lines, highlight_pos};
use cutup_core::text::syllable::count_line_syllables;

/// Server configuration, read from the environment.
///
/// - `CUTUP_HOST` (default `127.0.0.1`)
/// - `CUTUP_PORT` (default `5000`)
/// - `CUTUP_STATE`: snapshot file (default `./data/session.bin`)
struct Config {
	host: String,
	port: u16,
	state_path: PathBuf,
}

impl Config {
	fn from_env() -> Self {
		let port = match env::var("CUTUP_PORT") {
			Ok(p) => p.parse().unwrap_or_else(|_| {
				warn!("invalid CUTUP_PORT '{p}', using 5000");
				5000
			}),
			Err(_) => 5000,
		};
		Self {
			host: env::var("CUTUP_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned()),
			port,
			state_path: env::var("CUTUP_STATE")
				.map(PathBuf::from)
				.unwrap_or_else(|_| PathBuf::from("./data/session.bin")),
		}
	}
}

/// Body of the `/v1/input` endpoint
#[derive(Deserialize)]
struct InputBody {
	text: String,
	second_text: Option<String>,
}

/// Query parameters of the `PUT /v1/settings` endpoint, all optional
#[derive(Deserialize, Default)]
struct SettingsParams {
	technique: Option<String>,
	fragment_size: Option<usize>,
	chaos_level: Option<usize>,
	fold_position: Option<usize>,
	line_width: Option<usize>,
	target_syllables: Option<usize>,
	markov_mode: Option<String>,
	markov_order: Option<usize>,
	markov_count: Option<usize>,
	show_syllables: Option<bool>,
}

impl SettingsParams {
	/// Applies the given parameters over `current`.
	fn apply(&self, current: &Settings) -> Result<Settings, String> {
		let technique = match &self.technique {
			Some(t) => t.parse::<Technique>()?,
			None => current.technique,
		};
		let markov_mode = match &self.markov_mode {
			Some(m) => m.parse::<MarkovMode>()?,
			None => current.markov_mode,
		};
		Ok(Settings {
			technique,
			fragment_size: self.fragment_size.unwrap_or(current.fragment_size),
			chaos_level: self.chaos_level.unwrap_or(current.chaos_level),
			fold_position: self.fold_position.unwrap_or(current.fold_position),
			line_width: self.line_width.unwrap_or(current.line_width),
			target_syllables: self.target_syllables.unwrap_or(current.target_syllables),
			markov_mode,
			markov_order: self.markov_order.unwrap_or(current.markov_order),
			markov_count: self.markov_count.unwrap_or(current.markov_count),
			show_syllables: self.show_syllables.unwrap_or(current.show_syllables),
		})
	}
}

#[derive(Deserialize)]
struct ToggleQuery {
	line: Option<usize>,
	word: Option<usize>,
}

#[derive(Deserialize)]
struct FilterQuery {
	word: Option<String>,
}

#[derive(Deserialize)]
struct HighlightQuery {
	tags: Option<String>,
}

#[derive(Deserialize)]
struct EntryQuery {
	id: Option<String>,
}

struct SharedData {
	session: Session,
	state_path: PathBuf,
}

impl SharedData {
	/// Writes the session snapshot; failures are logged, not returned.
	fn persist(&self) {
		if let Err(e) = self.session.save(&self.state_path) {
			warn!("failed to save session to {}: {e}", self.state_path.display());
		}
	}
}

type Shared = web::Data<Mutex<SharedData>>;

fn lock(data: &Shared) -> Result<MutexGuard<'_, SharedData>, HttpResponse> {
	data.lock()
		.map_err(|_| HttpResponse::InternalServerError().body("Session lock failed"))
}

/// HTTP PUT endpoint `/v1/input`
///
/// Replaces both inputs; a missing `second_text` clears the second input.
#[put("/v1/input")]
async fn put_input(data: Shared, body: web::Json<InputBody>) -> impl Responder {
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	let body = body.into_inner();
	shared.session.set_input_text(body.text);
	shared.session.set_second_input_text(body.second_text.unwrap_or_default());
	HttpResponse::Ok().body("Input updated")
}

#[get("/v1/settings")]
async fn get_settings(data: Shared) -> impl Responder {
	match lock(&data) {
		Ok(shared) => HttpResponse::Ok().json(shared.session.settings()),
		Err(e) => e,
	}
}

/// HTTP PUT endpoint `/v1/settings`
///
/// Updates the settings given as query parameters and returns them all,
/// clamped to their ranges.
#[put("/v1/settings")]
async fn put_settings(data: Shared, query: web::Query<SettingsParams>) -> impl Responder {
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	let settings = match query.apply(shared.session.settings()) {
		Ok(s) => s,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	shared.session.set_settings(settings);
	shared.persist();
	HttpResponse::Ok().json(shared.session.settings())
}

/// HTTP GET endpoint `/v1/cut`
///
/// Runs the current technique and returns the current text (empty for a
/// fresh erasure grid).
#[get("/v1/cut")]
async fn get_cut(data: Shared) -> impl Responder {
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	if !shared.session.cut() {
		return HttpResponse::BadRequest().body("Nothing to cut");
	}
	shared.persist();
	HttpResponse::Ok().body(shared.session.current_text())
}

#[get("/v1/refine")]
async fn get_refine(data: Shared) -> impl Responder {
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	if !shared.session.refine() {
		return HttpResponse::BadRequest().body("Nothing to refine");
	}
	HttpResponse::Ok().body(shared.session.refined_text().to_owned())
}

#[put("/v1/use_output")]
async fn put_use_output(data: Shared) -> impl Responder {
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	if shared.session.use_output_as_input() {
		HttpResponse::Ok().body(shared.session.input_text().to_owned())
	} else {
		HttpResponse::BadRequest().body("No output to reuse")
	}
}

/// HTTP PUT endpoint `/v1/erasure/toggle`
///
/// Toggles the word at `line`/`word` and returns the erasure text.
/// Out-of-range coordinates are ignored.
#[put("/v1/erasure/toggle")]
async fn put_erasure_toggle(data: Shared, query: web::Query<ToggleQuery>) -> impl Responder {
	let (Some(line), Some(word)) = (query.line, query.word) else {
		return HttpResponse::BadRequest().body("Missing line or word index");
	};
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	if shared.session.erasure().is_none() {
		return HttpResponse::BadRequest().body("No erasure grid, cut with the erasure technique first");
	}
	shared.session.toggle_erasure_word(line, word);
	HttpResponse::Ok().body(shared.session.erasure_text())
}

/// HTTP GET endpoint `/v1/syllables`
///
/// Returns one syllable count per line of the current text.
#[get("/v1/syllables")]
async fn get_syllables(data: Shared) -> impl Responder {
	let shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	let counts: Vec<String> = shared
		.session
		.current_text()
		.split('\n')
		.map(|line| count_line_syllables(line).to_string())
		.collect();
	HttpResponse::Ok().body(counts.join("\n"))
}

#[get("/v1/filter")]
async fn get_filter(data: Shared, query: web::Query<FilterQuery>) -> impl Responder {
	let shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	let text = shared.session.current_text();
	let needle = query.word.as_deref().unwrap_or("");
	HttpResponse::Ok().body(filter_lines(&text, needle).join("\n"))
}

/// HTTP GET endpoint `/v1/highlight`
///
/// Tags the current text and flags words whose category is listed in
/// `tags` (comma-separated keys or labels, e.g. `NOU,Verb`).
#[get("/v1/highlight")]
async fn get_highlight(data: Shared, query: web::Query<HighlightQuery>) -> impl Responder {
	let categories: HashSet<Category> = match query
		.tags
		.as_deref()
		.unwrap_or("")
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::parse)
		.collect::<Result<_, String>>()
	{
		Ok(c) => c,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	let text = shared.session.current_text();
	HttpResponse::Ok().json(highlight_pos(&LexiconTagger, &text, &categories))
}

/// HTTP GET endpoint `/v1/history`
///
/// Returns the history export document as a JSON attachment.
#[get("/v1/history")]
async fn get_history(data: Shared) -> impl Responder {
	let shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	match shared.session.export_history() {
		Ok(json) => HttpResponse::Ok()
			.content_type("application/json")
			.insert_header(ContentDisposition {
				disposition: DispositionType::Attachment,
				parameters: vec![DispositionParam::Filename(Session::export_filename())],
			})
			.body(json),
		Err(e) => HttpResponse::InternalServerError().body(format!("Failed to export history: {e}")),
	}
}

#[put("/v1/history")]
async fn put_history(data: Shared, body: String) -> impl Responder {
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	if !shared.session.import_history(&body) {
		return HttpResponse::BadRequest().body("Invalid history file");
	}
	shared.persist();
	HttpResponse::Ok().body(format!("{} history entries", shared.session.history().len()))
}

#[delete("/v1/history")]
async fn delete_history(data: Shared) -> impl Responder {
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	shared.session.clear_history();
	shared.persist();
	HttpResponse::Ok().body("History cleared")
}

#[delete("/v1/history/entry")]
async fn delete_history_entry(data: Shared, query: web::Query<EntryQuery>) -> impl Responder {
	let Some(id) = query.id.as_deref() else {
		return HttpResponse::BadRequest().body("Missing entry id");
	};
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	if !shared.session.delete_history_entry(id) {
		return HttpResponse::NotFound().body(format!("Unknown history entry: {id}"));
	}
	shared.persist();
	HttpResponse::Ok().body("Entry deleted")
}

/// HTTP PUT endpoint `/v1/history/load`
///
/// Restores an entry's inputs and parameters and returns its output.
#[put("/v1/history/load")]
async fn put_history_load(data: Shared, query: web::Query<EntryQuery>) -> impl Responder {
	let Some(id) = query.id.as_deref() else {
		return HttpResponse::BadRequest().body("Missing entry id");
	};
	let mut shared = match lock(&data) {
		Ok(s) => s,
		Err(e) => return e,
	};
	if let Err(e) = shared.session.load_from_history(id) {
		return HttpResponse::NotFound().body(e);
	}
	shared.persist();
	HttpResponse::Ok().body(shared.session.output_text().to_owned())
}

/// Lists the refinement models, one `id<TAB>label<TAB>size` per line.
#[get("/v1/models")]
async fn get_models() -> impl Responder {
	let lines: Vec<String> = MODELS
		.iter()
		.map(|m| format!("{}\t{}\t{}", m.id, m.label, m.size))
		.collect();
	HttpResponse::Ok().body(lines.join("\n"))
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(put_input)
		.service(get_settings)
		.service(put_settings)
		.service(get_cut)
		.service(get_refine)
		.service(put_use_output)
		.service(put_erasure_toggle)
		.service(get_syllables)
		.service(get_filter)
		.service(get_highlight)
		.service(get_history)
		.service(put_history)
		.service(delete_history)
		.service(delete_history_entry)
		.service(put_history_load)
		.service(get_models);
}

/// Main entry point for the server.
///
/// Restores the session snapshot, wraps it in a `Mutex` for thread safety,
/// and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let config = Config::from_env();

	let session = match Session::load(&config.state_path) {
		Ok(s) => s,
		Err(e) => {
			warn!("failed to restore session from {}: {e}", config.state_path.display());
			Session::new()
		}
	};
	let shared_data = SharedData { session, state_path: config.state_path };
	let shared_session = web::Data::new(Mutex::new(shared_data));

	info!("listening on {}:{}", config.host, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_session.clone())
			.configure(routes)
	})
	.bind((config.host.as_str(), config.port))?
	.run()
	.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;

	fn shared(dir: &tempfile::TempDir) -> Shared {
		web::Data::new(Mutex::new(SharedData {
			session: Session::new(),
			state_path: dir.path().join("session.bin"),
		}))
	}

	async fn body_string(resp: actix_web::dev::ServiceResponse) -> String {
		let bytes = test::read_body(resp).await;
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	#[actix_web::test]
	async fn test_settings_params_apply() {
		let current = Settings::default();
		let params = SettingsParams {
			technique: Some("foldin".into()),
			line_width: Some(40),
			..SettingsParams::default()
		};
		let settings = params.apply(&current).unwrap();
		assert_eq!(settings.technique, Technique::FoldIn);
		assert_eq!(settings.line_width, 40);
		assert_eq!(settings.chaos_level, current.chaos_level);

		let bad = SettingsParams { markov_mode: Some("letters".into()), ..SettingsParams::default() };
		assert!(bad.apply(&current).is_err());
	}

	#[actix_web::test]
	async fn test_cut_flow() {
		let dir = tempfile::tempdir().unwrap();
		let data = shared(&dir);
		let app = test::init_service(App::new().app_data(data.clone()).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/cut").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put()
			.uri("/v1/input")
			.set_json(serde_json::json!({ "text": "one two three" }))
			.to_request();
		assert!(test::call_service(&app, req).await.status().is_success());

		let req = test::TestRequest::put().uri("/v1/settings?technique=permutation").to_request();
		let resp = test::call_service(&app, req).await;
		assert!(resp.status().is_success());
		let settings: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
		assert_eq!(settings["technique"], "permutation");

		let req = test::TestRequest::get().uri("/v1/cut").to_request();
		let text = body_string(test::call_service(&app, req).await).await;
		assert_eq!(text.lines().count(), 6);

		let req = test::TestRequest::get().uri("/v1/syllables").to_request();
		let counts = body_string(test::call_service(&app, req).await).await;
		assert!(counts.lines().all(|c| c == "3"), "{counts}");

		// The cut was recorded and persisted
		assert!(dir.path().join("session.bin").exists());
		let restored = Session::load(dir.path().join("session.bin")).unwrap();
		assert_eq!(restored.history().len(), 1);
	}

	#[actix_web::test]
	async fn test_bad_settings() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared(&dir)).configure(routes)).await;

		let req = test::TestRequest::put().uri("/v1/settings?technique=collage").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/settings?chaos_level=50").to_request();
		let resp = test::call_service(&app, req).await;
		let settings: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
		assert_eq!(settings["chaosLevel"], 10);
	}

	#[actix_web::test]
	async fn test_erasure_and_filters() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared(&dir)).configure(routes)).await;

		let req = test::TestRequest::put().uri("/v1/erasure/toggle?line=0&word=0").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put()
			.uri("/v1/input")
			.set_json(serde_json::json!({ "text": "the moon rose\nover the sea" }))
			.to_request();
		test::call_service(&app, req).await;
		let req = test::TestRequest::put().uri("/v1/settings?technique=erasure").to_request();
		test::call_service(&app, req).await;
		let req = test::TestRequest::get().uri("/v1/cut").to_request();
		assert_eq!(body_string(test::call_service(&app, req).await).await, "");

		for (line, word) in [(0, 1), (1, 2), (1, 2), (1, 0)] {
			let req = test::TestRequest::put()
				.uri(&format!("/v1/erasure/toggle?line={line}&word={word}"))
				.to_request();
			test::call_service(&app, req).await;
		}
		let req = test::TestRequest::put().uri("/v1/erasure/toggle?line=9&word=9").to_request();
		let text = body_string(test::call_service(&app, req).await).await;
		assert_eq!(text, "moon\nover");

		let req = test::TestRequest::get().uri("/v1/filter?word=MOON").to_request();
		assert_eq!(body_string(test::call_service(&app, req).await).await, "moon");

		let req = test::TestRequest::get().uri("/v1/highlight?tags=NOU").to_request();
		let resp = test::call_service(&app, req).await;
		assert!(resp.status().is_success());
		let lines: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
		assert_eq!(lines[0][0]["text"], "moon");
		assert_eq!(lines[0][0]["matched"], true);

		let req = test::TestRequest::get().uri("/v1/highlight?tags=XYZ").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn test_history_endpoints() {
		let dir = tempfile::tempdir().unwrap();
		let data = shared(&dir);
		let app = test::init_service(App::new().app_data(data.clone()).configure(routes)).await;

		let req = test::TestRequest::put()
			.uri("/v1/input")
			.set_json(serde_json::json!({ "text": "a b c d", "second_text": "e f" }))
			.to_request();
		test::call_service(&app, req).await;
		for _ in 0..2 {
			let req = test::TestRequest::get().uri("/v1/cut").to_request();
			test::call_service(&app, req).await;
		}

		let req = test::TestRequest::get().uri("/v1/history").to_request();
		let resp = test::call_service(&app, req).await;
		assert!(resp.headers().contains_key("content-disposition"));
		let export = body_string(resp).await;

		let req = test::TestRequest::delete().uri("/v1/history").to_request();
		test::call_service(&app, req).await;
		assert!(data.lock().unwrap().session.history().is_empty());

		let req = test::TestRequest::put().uri("/v1/history").set_payload("{\"version\":3}").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/history").set_payload(export).to_request();
		assert!(test::call_service(&app, req).await.status().is_success());
		let id = data.lock().unwrap().session.history()[1].id.clone();

		let req = test::TestRequest::put().uri(&format!("/v1/history/load?id={id}")).to_request();
		assert!(test::call_service(&app, req).await.status().is_success());
		assert_eq!(data.lock().unwrap().session.second_input_text(), "e f");

		let req = test::TestRequest::delete().uri(&format!("/v1/history/entry?id={id}")).to_request();
		assert!(test::call_service(&app, req).await.status().is_success());
		let req = test::TestRequest::delete().uri(&format!("/v1/history/entry?id={id}")).to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
		assert_eq!(data.lock().unwrap().session.history().len(), 1);
	}

	#[actix_web::test]
	async fn test_refine_and_models() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared(&dir)).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/refine").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put()
			.uri("/v1/input")
			.set_json(serde_json::json!({ "text": "the cat sat on the mat and the dog sat on the rug" }))
			.to_request();
		test::call_service(&app, req).await;
		let req = test::TestRequest::put().uri("/v1/settings?markov_mode=word&markov_count=2").to_request();
		test::call_service(&app, req).await;

		let req = test::TestRequest::get().uri("/v1/refine").to_request();
		let refined = body_string(test::call_service(&app, req).await).await;
		assert_eq!(refined.lines().count(), 2);

		let req = test::TestRequest::get().uri("/v1/models").to_request();
		let models = body_string(test::call_service(&app, req).await).await;
		assert_eq!(models.lines().count(), MODELS.len());
	}
}
