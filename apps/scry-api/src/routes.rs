use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use scry_pipeline::{Error as PipelineError, RecommendRequest, RecommendResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/models", get(models))
		.route("/v1/recommend", post(recommend))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
	generation_models: Vec<String>,
	rerank_models: Vec<String>,
	embedding_models: Vec<String>,
}

/// Configuration echo for UI model pickers; these are exactly the identities
/// the pipeline accepts per request.
async fn models(State(state): State<AppState>) -> Json<ModelsResponse> {
	let cfg = &state.recommender.cfg;
	let mut embedding_models: Vec<String> =
		cfg.providers.embedding.models.keys().cloned().collect();

	embedding_models.sort_unstable();

	Json(ModelsResponse {
		generation_models: cfg.providers.generation.models.clone(),
		rerank_models: cfg.rerank_identities(),
		embedding_models,
	})
}

async fn recommend(
	State(state): State<AppState>,
	Json(payload): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
	let response = state.recommender.recommend(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	stage: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	stage: Option<String>,
}

impl From<PipelineError> for ApiError {
	fn from(err: PipelineError) -> Self {
		match err {
			PipelineError::InvalidRequest { message } => Self {
				status: StatusCode::BAD_REQUEST,
				error_code: "invalid_request".to_string(),
				message,
				stage: None,
			},
			PipelineError::Stage { stage, message } => Self {
				status: StatusCode::INTERNAL_SERVER_ERROR,
				error_code: "pipeline_failure".to_string(),
				message,
				stage: Some(stage.as_str().to_string()),
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, stage: self.stage };

		(self.status, Json(body)).into_response()
	}
}
