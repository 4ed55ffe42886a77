use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub catalogue: Catalogue,
	pub recommend: Recommend,
	pub providers: Providers,
}
impl Config {
	/// Rerank identities in selection-priority order: dedicated rerank models
	/// first, then generation models usable as generative rerankers.
	pub fn rerank_identities(&self) -> Vec<String> {
		let mut out = Vec::new();

		for model in self.providers.rerank.models.iter().chain(&self.providers.generation.models) {
			if !out.contains(model) {
				out.push(model.clone());
			}
		}

		out
	}
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Catalogue {
	pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Recommend {
	pub system_prompt: String,
	pub item_type: String,
	pub num_synthetic: u32,
	pub num_candidates: u32,
	pub num_results: u32,
	/// Neighbors fetched per synthetic candidate; 0 falls back to num_candidates.
	#[serde(default)]
	pub probe_depth: u32,
	#[serde(default = "default_rerank_fallback")]
	pub rerank_fallback: bool,
}
impl Recommend {
	pub fn effective_probe_depth(&self) -> u32 {
		if self.probe_depth == 0 { self.num_candidates } else { self.probe_depth }
	}
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: GenerationProviderConfig,
	pub rerank: RerankProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	pub default_model: String,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	pub models: HashMap<String, EmbeddingModelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingModelConfig {
	pub model: String,
	pub dimensions: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerationProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	pub models: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RerankProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub models: Vec<String>,
}

fn default_rerank_fallback() -> bool {
	true
}
