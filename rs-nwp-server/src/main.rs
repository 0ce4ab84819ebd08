use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};

use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};
use rs_nwp_core::model::predictor::{Predictor, DEFAULT_WINDOW};
use rs_nwp_core::model::sequence_model::SequenceModel;

/// Number of predictions returned when `k` is omitted.
const DEFAULT_K: i64 = 3;

/// Number of generated words when `steps` is omitted.
const DEFAULT_STEPS: i64 = 14;

/// Upper bound on `steps` when `--max-steps` is omitted.
const DEFAULT_MAX_STEPS: usize = 100;

/// Command line configuration.
#[derive(Parser, Debug)]
#[command(name = "rs-nwp-server", about = "HTTP surface for next-word prediction")]
struct Args {
	/// Address to bind to
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	/// Port to listen on
	#[arg(long, default_value_t = 5000)]
	port: u16,

	/// Corpus file (one sentence per line); .vocab and .model are cached next to it
	#[arg(long, default_value = "./data/hamlet.dat")]
	corpus: String,

	/// Context window W (the model consumes W - 1 previous words)
	#[arg(long, default_value_t = DEFAULT_WINDOW)]
	window: usize,

	/// Largest number of words a single /v1/generate request may add
	#[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
	max_steps: usize,

	/// Allowed CORS origin; any origin is accepted when omitted
	#[arg(long)]
	allowed_origin: Option<String>,
}

/// Query parameters for the `/v1/predict` endpoint
#[derive(Deserialize)]
struct PredictParams {
	text: Option<String>,
	k: Option<i64>,
}

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	text: Option<String>,
	steps: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Generated {
	text: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Info {
	window: usize,
	vocabulary_size: usize,
}

/// Per-request bounds shared with the handlers.
#[derive(Debug, Clone, Copy)]
struct Limits {
	max_steps: usize,
}

type SharedPredictor = web::Data<Predictor<SequenceModel>>;

/// Returns the text if it holds something other than whitespace.
fn non_empty(text: &Option<String>) -> Option<&str> {
	text.as_deref().filter(|t| !t.trim().is_empty())
}

/// Negative counts mean "nothing"; counts above `max` are cut to `max`.
fn clamp(value: Option<i64>, default: i64, max: usize) -> usize {
	usize::try_from(value.unwrap_or(default)).unwrap_or(0).min(max)
}

/// Runs inference on the blocking thread pool so workers keep serving.
async fn run_blocking<T, F>(job: F) -> Result<T, String>
where
	F: FnOnce() -> rs_nwp_core::Result<T> + Send + 'static,
	T: Send + 'static,
{
	match web::block(job).await {
		Ok(result) => result.map_err(|e| e.to_string()),
		Err(e) => Err(e.to_string()),
	}
}

/// HTTP GET endpoint `/v1/predict`
///
/// Returns the `k` most likely next words as a JSON array of
/// `{ "word", "probability" }`, most likely first.
#[get("/v1/predict")]
async fn get_predictions(data: SharedPredictor, query: web::Query<PredictParams>) -> impl Responder {
	let text = match non_empty(&query.text) {
		Some(t) => t.to_owned(),
		None => return HttpResponse::BadRequest().body("Please enter some text."),
	};
	// More than one pick per scored id can never be returned
	let k = clamp(query.k, DEFAULT_K, data.vocabulary().output_size());

	let input = text.clone();
	match run_blocking(move || data.top_k_predictions(&input, k)).await {
		Ok(predictions) => HttpResponse::Ok().json(predictions),
		Err(e) => {
			error!("Prediction failed for {text:?}: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Extends the text by up to `steps` words (at most `--max-steps`) and
/// returns `{ "text" }`.
#[get("/v1/generate")]
async fn get_generated(
	data: SharedPredictor,
	limits: web::Data<Limits>,
	query: web::Query<GenerateParams>,
) -> impl Responder {
	let text = match non_empty(&query.text) {
		Some(t) => t.to_owned(),
		None => return HttpResponse::BadRequest().body("Please enter some text."),
	};
	let steps = clamp(query.steps, DEFAULT_STEPS, limits.max_steps);

	let seed = text.clone();
	match run_blocking(move || data.generate_sentence(&seed, steps)).await {
		Ok(text) => HttpResponse::Ok().json(Generated { text }),
		Err(e) => {
			error!("Generation failed for {text:?}: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

#[get("/v1/info")]
async fn get_info(data: SharedPredictor) -> impl Responder {
	HttpResponse::Ok().json(Info {
		window: data.window(),
		vocabulary_size: data.vocabulary().len(),
	})
}

/// Registers the API endpoints.
fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_predictions)
		.service(get_generated)
		.service(get_info);
}

/// Main entry point for the server.
///
/// Loads the vocabulary and the sequence model once, then shares the
/// read-only predictor between workers.
///
/// # Notes
/// - Startup fails (non-zero exit) if the artifacts are missing or incompatible.
/// - Logging is configured through `RUST_LOG` (defaults to `info`).
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let predictor = match Predictor::new(&args.corpus, args.window) {
		Ok(p) => p,
		Err(e) => {
			error!("Failed to load artifacts from {}: {e}", args.corpus);
			return Err(std::io::Error::other(e));
		}
	};
	let shared_predictor = web::Data::new(predictor);
	let limits = web::Data::new(Limits { max_steps: args.max_steps });

	info!("Listening on {}:{}", args.host, args.port);
	let allowed_origin = args.allowed_origin.clone();
	HttpServer::new(move || {
		let cors = match &allowed_origin {
			Some(origin) => Cors::default().allowed_origin(origin).allowed_methods(vec!["GET"]),
			None => Cors::permissive(),
		};
		App::new()
			.wrap(Logger::default())
			.wrap(cors)
			.app_data(shared_predictor.clone())
			.app_data(limits.clone())
			.configure(configure)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
