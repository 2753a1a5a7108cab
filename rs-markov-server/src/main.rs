mod config;

use std::path::Path;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, put, web};
use log::{info, warn};
use serde::Deserialize;

use config::ServerConfig;
use rs_markov_core::io::CORPUS_EXTENSION;
use rs_markov_core::{GenerationInput, MarkovModel, ModelCatalog, ModelError, Snapshot};

/// Lengths used when a generate request gives neither bound.
const DEFAULT_MIN_LENGTH: usize = 4;
const DEFAULT_MAX_LENGTH: usize = 16;

/// Query parameters of `/v1/generate`
#[derive(Deserialize)]
struct GenerateParams {
	model: String,
	min_length: Option<usize>,
	max_length: Option<usize>, // defaults to min_length when only that one is set
	seed: Option<u64>,
}

#[derive(Deserialize)]
struct ModelQuery {
	model: String,
}

#[derive(Deserialize)]
struct ModelsQuery {
	names: Option<String>,
}

#[derive(Deserialize)]
struct ScoreRequest {
	model: String,
	text: String,
}

#[derive(Deserialize)]
struct TrainRequest {
	model: String,
	lines: Vec<String>,
}

struct SharedData {
	catalog: ModelCatalog,
	data_dir: String,
}

impl GenerateParams {
	/// Builds the validated generation input.
	fn input(&self) -> Result<GenerationInput, ModelError> {
		let (min_length, max_length) = match (self.min_length, self.max_length) {
			(None, None) => (DEFAULT_MIN_LENGTH, DEFAULT_MAX_LENGTH),
			(Some(min), None) => (min, min),
			(None, Some(max)) => (DEFAULT_MIN_LENGTH.min(max), max),
			(Some(min), Some(max)) => (min, max),
		};
		let input = GenerationInput::new(min_length, max_length)?;
		Ok(match self.seed {
			Some(seed) => input.with_seed(seed),
			None => input,
		})
	}
}

/// Maps a library error to an HTTP response.
fn error_response(e: ModelError) -> HttpResponse {
	match e {
		ModelError::UnknownModel(_) => HttpResponse::NotFound().body(e.to_string()),
		ModelError::InvalidDepth(_)
		| ModelError::InvalidLengthRange { .. }
		| ModelError::MalformedSnapshot(_)
		| ModelError::DepthMismatch { .. }
		| ModelError::ModelAlreadyLoaded(_)
		| ModelError::InvalidTokenization(_) => HttpResponse::BadRequest().body(e.to_string()),
		_ => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// Whether `name` is a bare corpus stem that stays inside the data directory.
fn is_corpus_name(name: &str) -> bool {
	!name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

macro_rules! lock_or_500 {
	($data:expr) => {
		match $data.lock() {
			Ok(guard) => guard,
			Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
		}
	};
}

/// HTTP GET endpoint `/v1/generate`
///
/// Samples a sequence from the named model and returns it as text.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let input = match query.input() {
		Ok(input) => input,
		Err(e) => return error_response(e),
	};
	let mut shared_data = lock_or_500!(data);
	match shared_data.catalog.generate(&query.model, &input) {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(e) => error_response(e),
	}
}

/// HTTP POST endpoint `/v1/score`
#[post("/v1/score")]
async fn post_score(data: web::Data<Mutex<SharedData>>, request: web::Json<ScoreRequest>) -> impl Responder {
	let shared_data = lock_or_500!(data);
	match shared_data.catalog.score(&request.model, &request.text) {
		Ok(score) => HttpResponse::Ok().body(score.to_string()),
		Err(e) => error_response(e),
	}
}

/// HTTP POST endpoint `/v1/train`
///
/// Trains the named model (created if absent) and returns the number of lines learned.
#[post("/v1/train")]
async fn post_train(data: web::Data<Mutex<SharedData>>, request: web::Json<TrainRequest>) -> impl Responder {
	let mut shared_data = lock_or_500!(data);
	let trained = shared_data.catalog.train(&request.model, request.lines.iter().map(String::as_str));
	HttpResponse::Ok().body(trained.to_string())
}

#[get("/v1/models")]
async fn get_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = lock_or_500!(data);
	HttpResponse::Ok().body(shared_data.catalog.names().join("\n"))
}

/// HTTP PUT endpoint `/v1/load_models?names=a,b`
///
/// Replaces the catalog with the named corpora. On failure the previous
/// catalog is kept.
#[put("/v1/load_models")]
async fn put_models(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelsQuery>) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};
	let names: Vec<&str> = query_names.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
	if let Some(name) = names.iter().find(|name| !is_corpus_name(name)) {
		warn!("rejected corpus name '{name}'");
		return HttpResponse::BadRequest().body(format!("Invalid model name '{name}'"));
	}

	let mut shared_data = lock_or_500!(data);
	let mut catalog = match ModelCatalog::new(shared_data.catalog.depth(), shared_data.catalog.tokenization()) {
		Ok(catalog) => catalog,
		Err(e) => return error_response(e),
	};

	for name in names {
		let corpus = Path::new(&shared_data.data_dir).join(format!("{name}.{CORPUS_EXTENSION}"));
		if let Err(e) = catalog.load_model(&corpus) {
			return HttpResponse::InternalServerError().body(format!("Failed to load model '{name}': {e}"));
		}
	}

	shared_data.catalog = catalog;
	HttpResponse::Ok().body("Models loaded successfully")
}

/// HTTP GET endpoint `/v1/snapshot?model=`
#[get("/v1/snapshot")]
async fn get_snapshot(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let shared_data = lock_or_500!(data);
	match shared_data.catalog.get(&query.model).and_then(|model| model.to_snapshot().to_json()) {
		Ok(json) => HttpResponse::Ok().content_type("application/json").body(json),
		Err(e) => error_response(e),
	}
}

/// HTTP PUT endpoint `/v1/snapshot?model=`
///
/// Replaces (or creates) the named model from a JSON snapshot body.
#[put("/v1/snapshot")]
async fn put_snapshot(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>, body: String) -> impl Responder {
	let model = match Snapshot::<String>::from_json(&body).and_then(MarkovModel::from_snapshot) {
		Ok(model) => model,
		Err(e) => return error_response(e),
	};
	let mut shared_data = lock_or_500!(data);
	match shared_data.catalog.insert(&query.model, model) {
		Ok(()) => HttpResponse::Ok().body("Snapshot loaded successfully"),
		Err(e) => error_response(e),
	}
}

fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(post_score)
		.service(post_train)
		.service(get_models)
		.service(put_models)
		.service(get_snapshot)
		.service(put_snapshot);
}

/// Main entry point for the server.
///
/// Reads `ServerConfig` from the environment, loads every corpus of the
/// data directory into a catalog wrapped in a `Mutex`, and starts the
/// Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env().map_err(std::io::Error::other)?;

	let catalog = if Path::new(&config.data_dir).is_dir() {
		ModelCatalog::from_folder(&config.data_dir, config.depth, config.tokenization).map_err(std::io::Error::other)?
	} else {
		warn!("data directory {} not found, starting with an empty catalog", config.data_dir);
		ModelCatalog::new(config.depth, config.tokenization).map_err(std::io::Error::other)?
	};

	let shared_data = SharedData { catalog, data_dir: config.data_dir.clone() };
	let shared_data = web::Data::new(Mutex::new(shared_data));

	info!("listening on {}:{}", config.host, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.configure(configure)
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
	use rs_markov_core::Tokenization;

	fn shared(depth: usize) -> web::Data<Mutex<SharedData>> {
		let catalog = ModelCatalog::new(depth, Tokenization::Words).unwrap();
		web::Data::new(Mutex::new(SharedData { catalog, data_dir: "./data".to_owned() }))
	}

	#[actix_web::test]
	async fn train_then_generate_and_score() {
		let data = shared(1);
		let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

		let request = test::TestRequest::post()
			.uri("/v1/train")
			.set_json(serde_json::json!({ "model": "greet", "lines": ["hello world", "hello there"] }))
			.to_request();
		let body = test::call_and_read_body(&app, request).await;
		assert_eq!(&body[..], b"2");

		let request = test::TestRequest::get().uri("/v1/generate?model=greet&min_length=1&max_length=4&seed=9").to_request();
		let body = test::call_and_read_body(&app, request).await;
		assert!(std::str::from_utf8(&body).unwrap().starts_with("hello"));

		let request = test::TestRequest::post()
			.uri("/v1/score")
			.set_json(serde_json::json!({ "model": "greet", "text": "hello world" }))
			.to_request();
		let body = test::call_and_read_body(&app, request).await;
		let score: f64 = std::str::from_utf8(&body).unwrap().parse().unwrap();
		assert!(score > 0.0);
	}

	#[actix_web::test]
	async fn errors_map_to_status_codes() {
		let app = test::init_service(App::new().app_data(shared(1)).configure(configure)).await;

		let request = test::TestRequest::get().uri("/v1/generate?model=missing").to_request();
		assert_eq!(test::call_service(&app, request).await.status(), StatusCode::NOT_FOUND);

		let request = test::TestRequest::get().uri("/v1/generate?model=x&min_length=5&max_length=2").to_request();
		assert_eq!(test::call_service(&app, request).await.status(), StatusCode::BAD_REQUEST);

		let request = test::TestRequest::put().uri("/v1/snapshot?model=x").set_payload("{\"depth\": 1}").to_request();
		assert_eq!(test::call_service(&app, request).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn load_models_rejects_paths_outside_data_dir() {
		let data = shared(1);
		data.lock().unwrap().catalog.train("kept", ["a b"]);
		let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

		for uri in [
			"/v1/load_models?names=../../tmp/x",
			"/v1/load_models?names=..%2F..%2Ftmp%2Fx",
			"/v1/load_models?names=kept,/etc/passwd",
			"/v1/load_models?names=a.b",
			"/v1/load_models?names=..",
		] {
			let request = test::TestRequest::put().uri(uri).to_request();
			assert_eq!(test::call_service(&app, request).await.status(), StatusCode::BAD_REQUEST, "{uri}");
		}
		assert_eq!(data.lock().unwrap().catalog.names(), vec!["kept"]);

		assert!(is_corpus_name("names_en-2"));
		assert!(!is_corpus_name("..\\x"));
	}

	#[actix_web::test]
	async fn snapshot_round_trip_over_http() {
		let data = shared(1);
		data.lock().unwrap().catalog.train("abc", ["a b c"]);
		let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

		let request = test::TestRequest::get().uri("/v1/snapshot?model=abc").to_request();
		let json = test::call_and_read_body(&app, request).await;

		let request = test::TestRequest::put().uri("/v1/snapshot?model=copy").set_payload(json).to_request();
		assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

		let shared_data = data.lock().unwrap();
		let catalog = &shared_data.catalog;
		assert_eq!(catalog.names(), vec!["abc", "copy"]);
		assert_eq!(catalog.score("copy", "a b c").unwrap(), catalog.score("abc", "a b c").unwrap());
	}
}
