mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalogue, Config, EmbeddingModelConfig, EmbeddingProviderConfig, GenerationProviderConfig,
	Providers, Recommend, RerankProviderConfig, Service,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.catalogue.data_dir.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "catalogue.data_dir must be non-empty.".to_string(),
		});
	}
	if cfg.recommend.system_prompt.trim().is_empty() {
		return Err(Error::Validation {
			message: "recommend.system_prompt must be non-empty.".to_string(),
		});
	}
	if cfg.recommend.item_type.trim().is_empty() {
		return Err(Error::Validation {
			message: "recommend.item_type must be non-empty.".to_string(),
		});
	}
	if cfg.recommend.num_synthetic == 0 {
		return Err(Error::Validation {
			message: "recommend.num_synthetic must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.num_candidates == 0 {
		return Err(Error::Validation {
			message: "recommend.num_candidates must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.num_results == 0 {
		return Err(Error::Validation {
			message: "recommend.num_results must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.num_results > cfg.recommend.num_candidates {
		return Err(Error::Validation {
			message: "recommend.num_results must not exceed recommend.num_candidates.".to_string(),
		});
	}

	if cfg.providers.embedding.models.is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.models must have at least one entry.".to_string(),
		});
	}

	for (key, model) in &cfg.providers.embedding.models {
		if model.model.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.embedding.models.{key}.model must be non-empty."),
			});
		}
		if model.dimensions == 0 {
			return Err(Error::Validation {
				message: format!(
					"providers.embedding.models.{key}.dimensions must be greater than zero."
				),
			});
		}
	}

	if !cfg.providers.embedding.models.contains_key(&cfg.providers.embedding.default_model) {
		return Err(Error::Validation {
			message: "providers.embedding.default_model must name a configured embedding model."
				.to_string(),
		});
	}
	if cfg.providers.generation.models.is_empty() {
		return Err(Error::Validation {
			message: "providers.generation.models must be non-empty.".to_string(),
		});
	}
	if !cfg.providers.generation.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&cfg.providers.generation.temperature) {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}

	for (label, timeout_ms) in [
		("embedding", cfg.providers.embedding.timeout_ms),
		("generation", cfg.providers.generation.timeout_ms),
		("rerank", cfg.providers.rerank.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("generation", &cfg.providers.generation.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if !cfg.providers.rerank.models.is_empty() && cfg.providers.rerank.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider rerank api_key must be non-empty when rerank models are configured."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_base in [
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.generation.api_base,
		&mut cfg.providers.rerank.api_base,
	] {
		while api_base.ends_with('/') {
			api_base.pop();
		}
	}

	dedup_preserving_order(&mut cfg.providers.generation.models);
	dedup_preserving_order(&mut cfg.providers.rerank.models);
}

fn dedup_preserving_order(models: &mut Vec<String>) {
	let mut seen = HashSet::new();

	models.retain(|model| seen.insert(model.clone()));
}
