//! Scripted providers and store builders for exercising the pipeline
//! without network access.

use std::{collections::HashMap, sync::Mutex};

use serde_json::Value;

use scry_catalogue::{CatalogueItem, ItemStore};
use scry_config::{
	EmbeddingModelConfig, EmbeddingProviderConfig, GenerationProviderConfig, RerankProviderConfig,
};
use scry_pipeline::{BoxFuture, ChatProvider, EmbeddingProvider, RerankProvider};
use scry_providers::Error as ProviderError;

/// Chat provider that pops pre-scripted responses in order. A drained script
/// yields an error, which keeps call counts honest in tests.
pub struct ScriptedChat {
	responses: Mutex<Vec<scry_providers::Result<Value>>>,
}
impl ScriptedChat {
	pub fn new(responses: Vec<scry_providers::Result<Value>>) -> Self {
		Self { responses: Mutex::new(responses) }
	}

	pub fn replying(values: &[Value]) -> Self {
		Self::new(values.iter().cloned().map(Ok).collect())
	}

	pub fn failing(message: &str) -> Self {
		Self::new(vec![Err(ProviderError::InvalidResponse { message: message.to_string() })])
	}
}
impl ChatProvider for ScriptedChat {
	fn chat<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		_model: &'a str,
		_temperature: f32,
		_messages: &'a [Value],
	) -> BoxFuture<'a, scry_providers::Result<Value>> {
		let mut responses = self.responses.lock().unwrap_or_else(|err| err.into_inner());
		let response = if responses.is_empty() {
			Err(ProviderError::InvalidResponse { message: "Chat script exhausted.".to_string() })
		} else {
			responses.remove(0)
		};

		Box::pin(async move { response })
	}
}

/// Embedding provider backed by a fixed text-to-vector table. Unknown texts
/// fail, so tests notice unexpected embedding inputs.
pub struct MappedEmbeddings {
	vectors: HashMap<String, Vec<f32>>,
}
impl MappedEmbeddings {
	pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
		Self {
			vectors: entries
				.iter()
				.map(|(text, vector)| (text.to_string(), vector.clone()))
				.collect(),
		}
	}
}
impl EmbeddingProvider for MappedEmbeddings {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_model: &'a EmbeddingModelConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, scry_providers::Result<Vec<Vec<f32>>>> {
		let result = texts
			.iter()
			.map(|text| {
				self.vectors.get(text).cloned().ok_or_else(|| ProviderError::InvalidResponse {
					message: format!("No scripted embedding for {text:?}."),
				})
			})
			.collect();

		Box::pin(async move { result })
	}
}

pub struct RerankCall {
	pub model: String,
	pub query: String,
	pub docs: Vec<String>,
}

/// Rerank provider returning fixed scores while recording every call.
pub struct ScriptedRerank {
	scores: scry_providers::Result<Vec<f32>>,
	pub calls: Mutex<Vec<RerankCall>>,
}
impl ScriptedRerank {
	pub fn scoring(scores: Vec<f32>) -> Self {
		Self { scores: Ok(scores), calls: Mutex::new(Vec::new()) }
	}

	pub fn failing(message: &str) -> Self {
		Self {
			scores: Err(ProviderError::InvalidResponse { message: message.to_string() }),
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}
impl RerankProvider for ScriptedRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a RerankProviderConfig,
		model: &'a str,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, scry_providers::Result<Vec<f32>>> {
		let mut calls = self.calls.lock().unwrap_or_else(|err| err.into_inner());

		calls.push(RerankCall {
			model: model.to_string(),
			query: query.to_string(),
			docs: docs.to_vec(),
		});

		let result = match &self.scores {
			Ok(scores) => Ok(scores.clone()),
			Err(err) => Err(ProviderError::InvalidResponse { message: err.to_string() }),
		};

		Box::pin(async move { result })
	}
}

/// Provider whose every call fails with the given message.
pub struct FailingProvider {
	message: String,
}
impl FailingProvider {
	pub fn new(message: &str) -> Self {
		Self { message: message.to_string() }
	}

	fn error(&self) -> ProviderError {
		ProviderError::InvalidResponse { message: self.message.clone() }
	}
}
impl ChatProvider for FailingProvider {
	fn chat<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		_model: &'a str,
		_temperature: f32,
		_messages: &'a [Value],
	) -> BoxFuture<'a, scry_providers::Result<Value>> {
		let err = self.error();

		Box::pin(async move { Err(err) })
	}
}
impl EmbeddingProvider for FailingProvider {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_model: &'a EmbeddingModelConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, scry_providers::Result<Vec<Vec<f32>>>> {
		let err = self.error();

		Box::pin(async move { Err(err) })
	}
}
impl RerankProvider for FailingProvider {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a RerankProviderConfig,
		_model: &'a str,
		_query: &'a str,
		_docs: &'a [String],
	) -> BoxFuture<'a, scry_providers::Result<Vec<f32>>> {
		let err = self.error();

		Box::pin(async move { Err(err) })
	}
}

/// Builds an item store with the given rows under one model key.
pub fn build_store(
	model_key: &str,
	dimensions: u32,
	items: &[(&str, &str, &str)],
	rows: Vec<Vec<f32>>,
) -> scry_catalogue::Result<ItemStore> {
	let items = items
		.iter()
		.map(|(item_id, title, text)| CatalogueItem {
			item_id: item_id.to_string(),
			title: title.to_string(),
			text: text.to_string(),
		})
		.collect();
	let mut embeddings = HashMap::new();

	embeddings.insert(model_key.to_string(), (dimensions, rows));

	ItemStore::build(items, embeddings)
}

/// Store whose rows are one-hot vectors in item order, which makes expected
/// similarities easy to reason about in tests.
pub fn one_hot_store(
	model_key: &str,
	items: &[(&str, &str, &str)],
) -> scry_catalogue::Result<ItemStore> {
	let count = items.len();
	let rows = (0..count)
		.map(|row| {
			let mut vector = vec![0.0; count];

			vector[row] = 1.0;

			vector
		})
		.collect();

	build_store(model_key, count as u32, items, rows)
}
