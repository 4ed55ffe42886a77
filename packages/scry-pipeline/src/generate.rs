use serde_json::Value;
use tracing::warn;

use scry_config::{GenerationProviderConfig, Recommend};

use crate::Providers;

pub struct GeneratedCandidates {
	pub candidates: Vec<String>,
	pub fallback: bool,
}

/// Expands the user context into synthetic item descriptions. Generation is
/// best-effort: any upstream or parse failure falls back to the raw context
/// as the sole candidate instead of failing the request.
pub async fn generate_candidates(
	providers: &Providers,
	cfg: &GenerationProviderConfig,
	recommend: &Recommend,
	model: &str,
	user_context: &str,
) -> GeneratedCandidates {
	let messages = build_generation_messages(recommend, user_context);
	let candidates = match providers.chat.chat(cfg, model, cfg.temperature, &messages).await {
		Ok(json) => normalize_candidates(parse_candidates(&json), recommend.num_synthetic),
		Err(err) => {
			warn!(error = %err, "Candidate generation failed; falling back to the raw context.");

			return GeneratedCandidates {
				candidates: vec![user_context.to_string()],
				fallback: true,
			};
		},
	};

	if candidates.is_empty() {
		warn!("Candidate generation returned nothing usable; falling back to the raw context.");

		return GeneratedCandidates { candidates: vec![user_context.to_string()], fallback: true };
	}

	GeneratedCandidates { candidates, fallback: false }
}

fn build_generation_messages(recommend: &Recommend, user_context: &str) -> Vec<Value> {
	let user_prompt = format!(
		"Generate {count} {item_type} recommendations for the following user context.\n\
		Return ONLY a JSON array of strings, each being a short {item_type} title or name.\n\n\
		User context:\n{user_context}\n\n\
		Response format: [\"candidate1\", \"candidate2\", ...]",
		count = recommend.num_synthetic,
		item_type = recommend.item_type,
	);

	vec![
		serde_json::json!({ "role": "system", "content": recommend.system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn parse_candidates(json: &Value) -> Vec<String> {
	json.as_array()
		.map(|values| {
			values.iter().filter_map(|value| value.as_str().map(str::to_string)).collect()
		})
		.unwrap_or_default()
}

fn normalize_candidates(raw: Vec<String>, limit: u32) -> Vec<String> {
	let mut seen = std::collections::HashSet::new();
	let mut out = Vec::new();

	for candidate in raw {
		if out.len() >= limit as usize {
			break;
		}

		let trimmed = candidate.trim();

		if trimmed.is_empty() {
			continue;
		}
		if seen.insert(trimmed.to_lowercase()) {
			out.push(trimmed.to_string());
		}
	}

	out
}
