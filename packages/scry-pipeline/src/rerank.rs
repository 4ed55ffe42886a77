use std::collections::HashSet;

use ahash::AHashMap;
use serde_json::Value;
use tracing::warn;

use scry_catalogue::{CatalogueItem, cmp_f32_desc};
use scry_config::{Config, Recommend};

use crate::{Error, Providers, Result, Stage};

const MAX_ITEM_TEXT_CHARS: usize = 200;

/// How the fused pool gets reordered, resolved from the requested rerank
/// identity: dedicated rerank models score documents, generation models pick
/// ids via a deterministic chat call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
	Relevance { model: String },
	Generative { model: String },
}
impl Strategy {
	pub fn resolve(cfg: &Config, requested: Option<&str>) -> Result<Self> {
		let identity = match requested {
			Some(identity) => identity.to_string(),
			None =>
				cfg.rerank_identities().into_iter().next().ok_or_else(|| Error::InvalidRequest {
					message: "No rerank models are configured.".to_string(),
				})?,
		};

		if cfg.providers.rerank.models.contains(&identity) {
			return Ok(Self::Relevance { model: identity });
		}
		if cfg.providers.generation.models.contains(&identity) {
			return Ok(Self::Generative { model: identity });
		}

		Err(Error::InvalidRequest {
			message: format!(
				"Unknown rerank model {identity:?}; configured: {}.",
				cfg.rerank_identities().join(", ")
			),
		})
	}

	pub fn model(&self) -> &str {
		match self {
			Self::Relevance { model } | Self::Generative { model } => model,
		}
	}
}

/// Reorders the pool against the user context, returning `(position, score)`
/// pairs into `pool`, at most `desired_count` of them.
pub async fn rerank(
	providers: &Providers,
	cfg: &Config,
	strategy: &Strategy,
	user_context: &str,
	pool: &[&CatalogueItem],
	desired_count: usize,
) -> Result<Vec<(usize, f32)>> {
	match strategy {
		Strategy::Relevance { model } =>
			relevance_rerank(providers, cfg, model, user_context, pool, desired_count).await,
		Strategy::Generative { model } =>
			generative_rerank(providers, cfg, model, user_context, pool, desired_count).await,
	}
}

async fn relevance_rerank(
	providers: &Providers,
	cfg: &Config,
	model: &str,
	user_context: &str,
	pool: &[&CatalogueItem],
	desired_count: usize,
) -> Result<Vec<(usize, f32)>> {
	let docs: Vec<String> =
		pool.iter().map(|item| format!("{}: {}", item.title, item.text)).collect();
	let scores = providers
		.rerank
		.rerank(&cfg.providers.rerank, model, user_context, &docs)
		.await
		.map_err(|err| Error::Stage { stage: Stage::Reranking, message: err.to_string() })?;

	if scores.len() != pool.len() {
		return Err(Error::Stage {
			stage: Stage::Reranking,
			message: "Rerank provider returned mismatched score count.".to_string(),
		});
	}

	let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();

	ranked.sort_by(|a, b| {
		cmp_f32_desc(a.1, b.1).then_with(|| pool[a.0].item_id.cmp(&pool[b.0].item_id))
	});
	ranked.truncate(desired_count);

	Ok(ranked)
}

async fn generative_rerank(
	providers: &Providers,
	cfg: &Config,
	model: &str,
	user_context: &str,
	pool: &[&CatalogueItem],
	desired_count: usize,
) -> Result<Vec<(usize, f32)>> {
	let messages = build_rerank_messages(&cfg.recommend, user_context, pool, desired_count);
	// Temperature 0: choice ranking must be deterministic, not sampled.
	let json = providers
		.chat
		.chat(&cfg.providers.generation, model, 0.0, &messages)
		.await
		.map_err(|err| Error::Stage { stage: Stage::Reranking, message: err.to_string() })?;
	let ranked_ids = parse_ranked_ids(&json).ok_or_else(|| Error::Stage {
		stage: Stage::Reranking,
		message: "Rerank response is not an array of item ids.".to_string(),
	})?;

	Ok(select_ranked(&ranked_ids, pool, desired_count))
}

fn build_rerank_messages(
	recommend: &Recommend,
	user_context: &str,
	pool: &[&CatalogueItem],
	desired_count: usize,
) -> Vec<Value> {
	let listing = pool
		.iter()
		.enumerate()
		.map(|(position, item)| {
			format!(
				"{}. [{}] {}: {}",
				position + 1,
				item.item_id,
				item.title,
				clip_text(&item.text, MAX_ITEM_TEXT_CHARS)
			)
		})
		.collect::<Vec<_>>()
		.join("\n");
	let user_prompt = format!(
		"User context:\n{user_context}\n\n\
		Available items:\n{listing}\n\n\
		Select the top {desired_count} most relevant items for this user.\n\
		Return ONLY a JSON array of the item ids in order of relevance, most relevant first.\n\n\
		Response format: [\"item_id_1\", \"item_id_2\", ...]"
	);

	vec![
		serde_json::json!({ "role": "system", "content": recommend.system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn parse_ranked_ids(json: &Value) -> Option<Vec<String>> {
	let values = json.as_array()?;
	let mut ids = Vec::with_capacity(values.len());

	for value in values {
		match value {
			Value::String(id) => ids.push(id.clone()),
			// Models echo numeric ids as bare integers now and then.
			Value::Number(number) => ids.push(number.to_string()),
			_ => return None,
		}
	}

	Some(ids)
}

/// Validates model-chosen ids against the pool. Unknown ids are dropped,
/// duplicates keep their first occurrence, and the result is never topped up
/// beyond what the model actually ranked.
fn select_ranked(ids: &[String], pool: &[&CatalogueItem], desired_count: usize) -> Vec<(usize, f32)> {
	let id_to_position: AHashMap<&str, usize> =
		pool.iter().enumerate().map(|(position, item)| (item.item_id.as_str(), position)).collect();
	let mut seen = HashSet::new();
	let mut ranked = Vec::new();

	for id in ids {
		if ranked.len() >= desired_count {
			break;
		}

		let Some(&position) = id_to_position.get(id.as_str()) else {
			warn!(item_id = %id, "Rerank model referenced an unknown item id; dropping it.");

			continue;
		};

		if seen.insert(position) {
			let score = 1.0 - 0.1 * ranked.len() as f32;

			ranked.push((position, score));
		}
	}

	ranked
}

fn clip_text(text: &str, limit: usize) -> &str {
	match text.char_indices().nth(limit) {
		Some((offset, _)) => &text[..offset],
		None => text,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pool_items() -> Vec<CatalogueItem> {
		["a", "b", "c"]
			.iter()
			.map(|id| CatalogueItem {
				item_id: id.to_string(),
				title: format!("title {id}"),
				text: format!("text {id}"),
			})
			.collect()
	}

	#[test]
	fn parses_string_and_integer_ids() {
		let json = serde_json::json!(["a", 7, "b"]);
		let ids = parse_ranked_ids(&json).expect("parse failed");

		assert_eq!(ids, vec!["a".to_string(), "7".to_string(), "b".to_string()]);
	}

	#[test]
	fn rejects_non_scalar_id_entries() {
		assert!(parse_ranked_ids(&serde_json::json!(["a", {"id": "b"}])).is_none());
		assert!(parse_ranked_ids(&serde_json::json!({"ids": ["a"]})).is_none());
	}

	#[test]
	fn select_ranked_drops_unknown_and_duplicate_ids() {
		let items = pool_items();
		let pool: Vec<&CatalogueItem> = items.iter().collect();
		let ids = vec![
			"b".to_string(),
			"missing".to_string(),
			"a".to_string(),
			"b".to_string(),
			"c".to_string(),
		];
		let ranked = select_ranked(&ids, &pool, 2);

		assert_eq!(ranked.len(), 2);
		assert_eq!(ranked[0], (1, 1.0));
		assert_eq!(ranked[1], (0, 0.9));
	}

	#[test]
	fn select_ranked_returns_short_results_unmodified() {
		let items = pool_items();
		let pool: Vec<&CatalogueItem> = items.iter().collect();
		let ids = vec!["ghost".to_string(), "c".to_string()];
		let ranked = select_ranked(&ids, &pool, 3);

		assert_eq!(ranked, vec![(2, 1.0)]);
	}

	#[test]
	fn rerank_messages_number_and_clip_items() {
		let long_text = "x".repeat(400);
		let items = vec![CatalogueItem {
			item_id: "long".to_string(),
			title: "Long".to_string(),
			text: long_text,
		}];
		let pool: Vec<&CatalogueItem> = items.iter().collect();
		let recommend = Recommend {
			system_prompt: "You are a recommendation engine.".to_string(),
			item_type: "job".to_string(),
			num_synthetic: 2,
			num_candidates: 10,
			num_results: 5,
			probe_depth: 0,
			rerank_fallback: true,
		};
		let messages = build_rerank_messages(&recommend, "context", &pool, 5);
		let user = messages[1]["content"].as_str().expect("user prompt missing");

		assert!(user.contains("1. [long] Long: "));
		assert!(user.contains(&"x".repeat(MAX_ITEM_TEXT_CHARS)));
		assert!(!user.contains(&"x".repeat(MAX_ITEM_TEXT_CHARS + 1)));
		assert!(user.contains("Select the top 5"));
	}

	#[test]
	fn clip_text_respects_char_boundaries() {
		assert_eq!(clip_text("héllo", 2), "hé");
		assert_eq!(clip_text("ab", 5), "ab");
	}
}
