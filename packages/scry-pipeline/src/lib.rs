//! Retrieval-and-ranking pipeline: synthetic candidate generation, batch
//! embedding, multi-probe vector search with score fusion, and reranking.

pub mod generate;
pub mod recommend;
pub mod rerank;
pub mod retrieve;

mod error;
pub use error::{Error, Result, Stage};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use scry_catalogue::ItemStore;
use scry_config::{
	Config, EmbeddingModelConfig, EmbeddingProviderConfig, GenerationProviderConfig,
	RerankProviderConfig,
};

pub use generate::GeneratedCandidates;
pub use recommend::{
	DebugInfo, LatencyBreakdown, RecommendRequest, RecommendResponse, Recommendation,
};
pub use rerank::Strategy;
pub use retrieve::FusedHit;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn chat<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		model: &'a str,
		temperature: f32,
		messages: &'a [Value],
	) -> BoxFuture<'a, scry_providers::Result<Value>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		model: &'a EmbeddingModelConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, scry_providers::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		model: &'a str,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, scry_providers::Result<Vec<f32>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub chat: Arc<dyn ChatProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
}

/// Shared pipeline entry point. Holds the immutable item store and provider
/// handles; safe to share across concurrent requests without locking.
pub struct Recommender {
	pub cfg: Config,
	pub store: ItemStore,
	pub providers: Providers,
}

struct DefaultProviders;

impl ChatProvider for DefaultProviders {
	fn chat<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		model: &'a str,
		temperature: f32,
		messages: &'a [Value],
	) -> BoxFuture<'a, scry_providers::Result<Value>> {
		Box::pin(scry_providers::chat::chat(cfg, model, temperature, messages))
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		model: &'a EmbeddingModelConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, scry_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(scry_providers::embedding::embed(cfg, model, texts))
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		model: &'a str,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, scry_providers::Result<Vec<f32>>> {
		Box::pin(scry_providers::rerank::rerank(cfg, model, query, docs))
	}
}

impl Providers {
	pub fn new(
		chat: Arc<dyn ChatProvider>,
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
	) -> Self {
		Self { chat, embedding, rerank }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { chat: provider.clone(), embedding: provider.clone(), rerank: provider }
	}
}

impl Recommender {
	pub fn new(cfg: Config, store: ItemStore) -> Self {
		Self { cfg, store, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, store: ItemStore, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}
}
