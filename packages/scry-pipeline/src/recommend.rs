use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use scry_catalogue::CatalogueItem;
use scry_config::EmbeddingModelConfig;

use crate::{
	Error, Recommender, Result, Stage,
	generate::{self, GeneratedCandidates},
	rerank::{self, Strategy},
	retrieve,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
	pub user_context: String,
	#[serde(default)]
	pub generation_model: Option<String>,
	#[serde(default)]
	pub rerank_model: Option<String>,
	#[serde(default)]
	pub embedding_model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
	pub item_id: String,
	pub title: String,
	pub text: String,
	pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyBreakdown {
	pub candidate_generation_ms: f64,
	pub embedding_ms: f64,
	pub vector_search_ms: f64,
	pub reranking_ms: f64,
	pub total_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
	pub trace_id: Uuid,
	pub synthetic_candidates: Vec<String>,
	pub num_retrieved: usize,
	pub generation_model_used: String,
	pub rerank_model_used: String,
	pub embedding_model_used: String,
	pub generation_fallback: bool,
	pub rerank_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
	pub recommendations: Vec<Recommendation>,
	pub latency: LatencyBreakdown,
	pub debug: DebugInfo,
}

impl Recommender {
	/// Runs the full pipeline for one request. Request validation happens
	/// before any upstream call; every stage failure names its stage.
	pub async fn recommend(&self, req: RecommendRequest) -> Result<RecommendResponse> {
		let total_start = Instant::now();
		let user_context = req.user_context.trim();

		if user_context.is_empty() {
			return Err(Error::InvalidRequest {
				message: "user_context must be a non-empty string.".to_string(),
			});
		}

		let generation_model = self.resolve_generation_model(req.generation_model.as_deref())?;
		let strategy = Strategy::resolve(&self.cfg, req.rerank_model.as_deref())?;
		let (embedding_key, embedding_model) =
			self.resolve_embedding_model(req.embedding_model.as_deref())?;
		let trace_id = Uuid::new_v4();

		let generation_start = Instant::now();
		let GeneratedCandidates { candidates, fallback: generation_fallback } =
			generate::generate_candidates(
				&self.providers,
				&self.cfg.providers.generation,
				&self.cfg.recommend,
				&generation_model,
				user_context,
			)
			.await;
		let candidate_generation_ms = elapsed_ms(generation_start);

		let embedding_start = Instant::now();
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, embedding_model, &candidates)
			.await
			.map_err(|err| Error::Stage { stage: Stage::Embedding, message: err.to_string() })?;

		if vectors.len() != candidates.len() {
			return Err(Error::Stage {
				stage: Stage::Embedding,
				message: "Embedding provider returned mismatched vector count.".to_string(),
			});
		}

		let dimensions = embedding_model.dimensions as usize;

		if let Some(vector) = vectors.iter().find(|vector| vector.len() != dimensions) {
			return Err(Error::Stage {
				stage: Stage::Embedding,
				message: format!(
					"Embedding vector dimension mismatch: expected {dimensions}, found {}.",
					vector.len()
				),
			});
		}

		let embedding_ms = elapsed_ms(embedding_start);

		let search_start = Instant::now();
		let pool = retrieve::fuse(
			&self.store,
			&embedding_key,
			&vectors,
			self.cfg.recommend.effective_probe_depth() as usize,
			self.cfg.recommend.num_candidates as usize,
		)
		.map_err(|err| Error::Stage { stage: Stage::VectorSearch, message: err.to_string() })?;
		let vector_search_ms = elapsed_ms(search_start);
		let num_retrieved = pool.len();

		if pool.is_empty() {
			return Ok(RecommendResponse {
				recommendations: Vec::new(),
				latency: LatencyBreakdown {
					candidate_generation_ms,
					embedding_ms,
					vector_search_ms,
					reranking_ms: 0.0,
					total_ms: elapsed_ms(total_start),
				},
				debug: DebugInfo {
					trace_id,
					synthetic_candidates: candidates,
					num_retrieved,
					generation_model_used: generation_model,
					rerank_model_used: strategy.model().to_string(),
					embedding_model_used: embedding_key,
					generation_fallback,
					rerank_fallback: false,
				},
			});
		}

		let rerank_start = Instant::now();
		let pool_items: Vec<&CatalogueItem> =
			pool.iter().filter_map(|hit| self.store.item(hit.index)).collect();
		let desired_count = self.cfg.recommend.num_results as usize;
		let (ranked, rerank_fallback) = match rerank::rerank(
			&self.providers,
			&self.cfg,
			&strategy,
			user_context,
			&pool_items,
			desired_count,
		)
		.await
		{
			Ok(ranked) => (ranked, false),
			Err(err) if self.cfg.recommend.rerank_fallback => {
				warn!(error = %err, "Reranking failed; falling back to fused order.");

				let fallback = pool
					.iter()
					.take(desired_count)
					.enumerate()
					.map(|(position, hit)| (position, hit.score))
					.collect();

				(fallback, true)
			},
			Err(err) => return Err(err),
		};
		let reranking_ms = elapsed_ms(rerank_start);

		let recommendations = ranked
			.into_iter()
			.filter_map(|(position, score)| {
				pool_items.get(position).map(|item| Recommendation {
					item_id: item.item_id.clone(),
					title: item.title.clone(),
					text: item.text.clone(),
					score,
				})
			})
			.collect();

		Ok(RecommendResponse {
			recommendations,
			latency: LatencyBreakdown {
				candidate_generation_ms,
				embedding_ms,
				vector_search_ms,
				reranking_ms,
				total_ms: elapsed_ms(total_start),
			},
			debug: DebugInfo {
				trace_id,
				synthetic_candidates: candidates,
				num_retrieved,
				generation_model_used: generation_model,
				rerank_model_used: strategy.model().to_string(),
				embedding_model_used: embedding_key,
				generation_fallback,
				rerank_fallback,
			},
		})
	}

	fn resolve_generation_model(&self, requested: Option<&str>) -> Result<String> {
		let models = &self.cfg.providers.generation.models;

		match requested {
			Some(model) if models.iter().any(|candidate| candidate == model) =>
				Ok(model.to_string()),
			Some(model) => Err(Error::InvalidRequest {
				message: format!(
					"Unknown generation model {model:?}; configured: {}.",
					models.join(", ")
				),
			}),
			None => models.first().cloned().ok_or_else(|| Error::InvalidRequest {
				message: "No generation models are configured.".to_string(),
			}),
		}
	}

	fn resolve_embedding_model(
		&self,
		requested: Option<&str>,
	) -> Result<(String, &EmbeddingModelConfig)> {
		let cfg = &self.cfg.providers.embedding;
		let key = requested.unwrap_or(&cfg.default_model);
		let model = cfg.models.get(key).ok_or_else(|| {
			let mut available: Vec<&str> = cfg.models.keys().map(String::as_str).collect();

			available.sort_unstable();

			Error::InvalidRequest {
				message: format!(
					"Unknown embedding model {key:?}; configured: {}.",
					available.join(", ")
				),
			}
		})?;

		Ok((key.to_string(), model))
	}
}

fn elapsed_ms(start: Instant) -> f64 {
	start.elapsed().as_secs_f64() * 1_000.0
}
