//! Offline catalogue embedding. Writes one embeddings file per configured
//! model so the API server can build its indexes at startup.

use std::{fs, path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::eyre::{self, eyre};
use tracing_subscriber::EnvFilter;

use scry_catalogue::{CATALOGUE_FILE, embeddings_file, load_catalogue};
use scry_config::{EmbeddingModelConfig, EmbeddingProviderConfig};

const BATCH_SIZE: usize = 100;
// Breather between batches; embedding APIs rate-limit bursty clients.
const BATCH_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(
	version = scry_cli::VERSION,
	rename_all = "kebab",
	styles = scry_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Embedding model key to precompute; defaults to every configured model.
	#[arg(long, short = 'm', value_name = "KEY")]
	pub model: Option<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = scry_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let data_dir = &config.catalogue.data_dir;
	let items = load_catalogue(&data_dir.join(CATALOGUE_FILE))?;

	if items.is_empty() {
		return Err(eyre!("Catalogue at {:?} holds no items.", data_dir.join(CATALOGUE_FILE)));
	}

	let texts: Vec<String> = items.iter().map(|item| item.text.clone()).collect();
	let mut model_keys: Vec<&String> = match &args.model {
		Some(key) => {
			if !config.providers.embedding.models.contains_key(key) {
				return Err(eyre!("Unknown embedding model key {key:?}."));
			}

			vec![key]
		},
		None => config.providers.embedding.models.keys().collect(),
	};

	model_keys.sort_unstable();

	for key in model_keys {
		let model = &config.providers.embedding.models[key];

		tracing::info!(
			model_key = %key,
			model = %model.model,
			items = texts.len(),
			"Embedding catalogue."
		);

		let rows = embed_all(&config.providers.embedding, model, &texts).await?;
		let path = data_dir.join(embeddings_file(key));

		fs::write(&path, serde_json::to_string(&rows)?)?;
		tracing::info!(path = %path.display(), rows = rows.len(), "Embeddings written.");
	}

	Ok(())
}

async fn embed_all(
	cfg: &EmbeddingProviderConfig,
	model: &EmbeddingModelConfig,
	texts: &[String],
) -> color_eyre::Result<Vec<Vec<f32>>> {
	let mut rows = Vec::with_capacity(texts.len());

	for (batch_index, batch) in texts.chunks(BATCH_SIZE).enumerate() {
		if batch_index > 0 {
			tokio::time::sleep(BATCH_PAUSE).await;
		}

		let vectors = scry_providers::embedding::embed(cfg, model, batch).await?;

		check_batch(&vectors, batch.len(), model.dimensions as usize)?;
		rows.extend(vectors);
		tracing::info!(embedded = rows.len(), total = texts.len(), "Batch embedded.");
	}

	Ok(rows)
}

fn check_batch(vectors: &[Vec<f32>], expected_count: usize, dimensions: usize) -> eyre::Result<()> {
	if vectors.len() != expected_count {
		return Err(eyre!(
			"Embedding provider returned {} vectors for a batch of {expected_count}.",
			vectors.len()
		));
	}
	if let Some(vector) = vectors.iter().find(|vector| vector.len() != dimensions) {
		return Err(eyre!(
			"Embedding vector dimension mismatch: expected {dimensions}, found {}.",
			vector.len()
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn check_batch_accepts_matching_vectors() {
		let vectors = vec![vec![0.1, 0.2], vec![0.3, 0.4]];

		assert!(check_batch(&vectors, 2, 2).is_ok());
	}

	#[test]
	fn check_batch_rejects_count_mismatch() {
		let vectors = vec![vec![0.1, 0.2]];

		assert!(check_batch(&vectors, 2, 2).is_err());
	}

	#[test]
	fn check_batch_rejects_dimension_mismatch() {
		let vectors = vec![vec![0.1, 0.2], vec![0.3]];

		assert!(check_batch(&vectors, 2, 2).is_err());
	}
}
