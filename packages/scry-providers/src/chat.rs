use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use scry_config::GenerationProviderConfig;

use crate::{Error, Result};

/// Chat call that expects JSON content back. Sampling occasionally yields
/// malformed JSON, so a failed parse gets one fresh request.
pub async fn chat(
	cfg: &GenerationProviderConfig,
	model: &str,
	temperature: f32,
	messages: &[Value],
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);

	for _ in 0..2 {
		let body = serde_json::json!({
			"model": model,
			"temperature": temperature,
			"messages": messages,
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		if let Ok(parsed) = parse_chat_json(json) {
			return Ok(parsed);
		}
	}

	Err(Error::InvalidResponse { message: "Chat content is not valid JSON.".to_string() })
}

fn parse_chat_json(json: Value) -> Result<Value> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing message content.".to_string(),
		})?;

	serde_json::from_str(strip_code_fences(content)).map_err(|_| Error::InvalidResponse {
		message: "Chat content is not valid JSON.".to_string(),
	})
}

/// Models wrap JSON in markdown fences no matter how firmly the prompt says
/// not to.
fn strip_code_fences(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);

	rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "[\"alpha\", \"beta\"]" } }
			]
		});
		let parsed = parse_chat_json(json).expect("parse failed");
		assert_eq!(parsed, serde_json::json!(["alpha", "beta"]));
	}

	#[test]
	fn strips_markdown_fences() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n[\"alpha\"]\n```" } }
			]
		});
		let parsed = parse_chat_json(json).expect("parse failed");
		assert_eq!(parsed, serde_json::json!(["alpha"]));
	}

	#[test]
	fn rejects_non_json_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "Here are some ideas: alpha, beta." } }
			]
		});
		assert!(parse_chat_json(json).is_err());
	}

	#[test]
	fn rejects_missing_content() {
		let json = serde_json::json!({ "choices": [] });
		assert!(parse_chat_json(json).is_err());
	}
}
