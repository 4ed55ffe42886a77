use std::{collections::HashMap, fs, path::Path};

use tracing::{info, warn};

use scry_config::EmbeddingModelConfig;

use crate::{CatalogueItem, Error, ItemStore, Result};

pub const CATALOGUE_FILE: &str = "catalogue.jsonl";

/// Embeddings are stored per model key so re-embedding one model never
/// touches the others.
pub fn embeddings_file(model_key: &str) -> String {
	format!("embeddings_{model_key}.json")
}

pub fn load_catalogue(path: &Path) -> Result<Vec<CatalogueItem>> {
	let raw = fs::read_to_string(path)
		.map_err(|e| Error::ReadFile { path: path.to_path_buf(), source: e })?;
	let mut items = Vec::new();

	for (index, line) in raw.lines().enumerate() {
		if line.trim().is_empty() {
			continue;
		}

		let item = serde_json::from_str::<CatalogueItem>(line).map_err(|e| Error::ParseLine {
			path: path.to_path_buf(),
			line: index + 1,
			source: e,
		})?;

		items.push(item);
	}

	Ok(items)
}

pub fn load_embeddings(path: &Path) -> Result<Vec<Vec<f32>>> {
	let raw = fs::read_to_string(path)
		.map_err(|e| Error::ReadFile { path: path.to_path_buf(), source: e })?;

	serde_json::from_str(&raw)
		.map_err(|e| Error::ParseFile { path: path.to_path_buf(), source: e })
}

/// Builds the item store from a data directory. Models without a matching
/// embeddings file are skipped with a warning; at least one must load.
pub fn load_store(
	data_dir: &Path,
	models: &HashMap<String, EmbeddingModelConfig>,
) -> Result<ItemStore> {
	let items = load_catalogue(&data_dir.join(CATALOGUE_FILE))?;
	let mut embeddings = HashMap::new();

	for (model_key, model) in models {
		let path = data_dir.join(embeddings_file(model_key));

		if !path.is_file() {
			warn!(
				model_key = %model_key,
				path = %path.display(),
				"Embeddings file not found; skipping model."
			);

			continue;
		}

		embeddings.insert(model_key.clone(), (model.dimensions, load_embeddings(&path)?));
	}

	if embeddings.is_empty() {
		return Err(Error::NoEmbeddings { data_dir: data_dir.to_path_buf() });
	}

	let store = ItemStore::build(items, embeddings)?;

	info!(items = store.len(), models = ?store.model_keys(), "Item store built.");

	Ok(store)
}
