use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use scry_config::Config;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render template config.")
}

fn recommend_table(value: &mut Value) -> &mut toml::Table {
	value
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut("recommend")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [recommend].")
}

fn provider_table<'a>(value: &'a mut Value, provider: &str) -> &'a mut toml::Table {
	value
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut("providers")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [providers].")
		.get_mut(provider)
		.and_then(Value::as_table_mut)
		.expect("Template config must include the provider table.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("scry_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> scry_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = scry_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn scry_example_toml_is_valid() {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../scry.example.toml");

	scry_config::load(&path).expect("Expected scry.example.toml to be a valid config.");
}

#[test]
fn num_synthetic_must_be_positive() {
	let mut value = sample_value();

	recommend_table(&mut value).insert("num_synthetic".to_string(), Value::Integer(0));

	let err = load_payload(render(&value)).expect_err("Expected num_synthetic validation error.");

	assert!(
		err.to_string().contains("recommend.num_synthetic must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn num_results_cannot_exceed_num_candidates() {
	let mut value = sample_value();
	let recommend = recommend_table(&mut value);

	recommend.insert("num_candidates".to_string(), Value::Integer(10));
	recommend.insert("num_results".to_string(), Value::Integer(100));

	let err = load_payload(render(&value)).expect_err("Expected num_results validation error.");

	assert!(
		err.to_string().contains("recommend.num_results must not exceed recommend.num_candidates."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_default_model_must_be_configured() {
	let mut value = sample_value();

	provider_table(&mut value, "embedding")
		.insert("default_model".to_string(), Value::String("missing".to_string()));

	let err = load_payload(render(&value)).expect_err("Expected default_model validation error.");

	assert!(
		err.to_string()
			.contains("providers.embedding.default_model must name a configured embedding model."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_dimensions_must_be_positive() {
	let mut value = sample_value();

	provider_table(&mut value, "embedding")
		.get_mut("models")
		.and_then(Value::as_table_mut)
		.expect("Template config must include embedding models.")
		.get_mut("small")
		.and_then(Value::as_table_mut)
		.expect("Template config must include the small embedding model.")
		.insert("dimensions".to_string(), Value::Integer(0));

	let err = load_payload(render(&value)).expect_err("Expected dimensions validation error.");

	assert!(
		err.to_string()
			.contains("providers.embedding.models.small.dimensions must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn generation_models_must_be_non_empty() {
	let mut value = sample_value();

	provider_table(&mut value, "generation").insert("models".to_string(), Value::Array(vec![]));

	let err = load_payload(render(&value)).expect_err("Expected generation models validation error.");

	assert!(
		err.to_string().contains("providers.generation.models must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn rerank_api_key_required_when_models_configured() {
	let mut value = sample_value();

	provider_table(&mut value, "rerank")
		.insert("api_key".to_string(), Value::String("  ".to_string()));

	let err = load_payload(render(&value)).expect_err("Expected rerank api_key validation error.");

	assert!(
		err.to_string().contains(
			"Provider rerank api_key must be non-empty when rerank models are configured."
		),
		"Unexpected error: {err}"
	);
}

#[test]
fn rerank_models_may_be_empty() {
	let mut value = sample_value();
	let rerank = provider_table(&mut value, "rerank");

	rerank.insert("models".to_string(), Value::Array(vec![]));
	rerank.insert("api_key".to_string(), Value::String(String::new()));

	let cfg = load_payload(render(&value)).expect("Expected config without rerank models to load.");

	assert!(cfg.providers.rerank.models.is_empty());
	assert_eq!(cfg.rerank_identities(), cfg.providers.generation.models);
}

#[test]
fn api_base_trailing_slashes_are_normalized() {
	let mut value = sample_value();

	provider_table(&mut value, "embedding")
		.insert("api_base".to_string(), Value::String("https://openrouter.ai/api/v1//".to_string()));

	let cfg = load_payload(render(&value)).expect("Expected config to load.");

	assert_eq!(cfg.providers.embedding.api_base, "https://openrouter.ai/api/v1");
}

#[test]
fn duplicate_model_entries_are_deduplicated() {
	let mut value = sample_value();

	provider_table(&mut value, "generation").insert(
		"models".to_string(),
		Value::Array(vec![
			Value::String("openai/gpt-4o-mini".to_string()),
			Value::String("openai/gpt-4o-mini".to_string()),
			Value::String("anthropic/claude-3-haiku".to_string()),
		]),
	);

	let cfg = load_payload(render(&value)).expect("Expected config to load.");

	assert_eq!(
		cfg.providers.generation.models,
		vec!["openai/gpt-4o-mini".to_string(), "anthropic/claude-3-haiku".to_string()]
	);
}

#[test]
fn rerank_identities_prioritize_dedicated_models() {
	let mut value = sample_value();

	provider_table(&mut value, "rerank").insert(
		"models".to_string(),
		Value::Array(vec![
			Value::String("zerank-2".to_string()),
			Value::String("openai/gpt-4o-mini".to_string()),
		]),
	);

	let cfg = load_payload(render(&value)).expect("Expected config to load.");

	assert_eq!(
		cfg.rerank_identities(),
		vec![
			"zerank-2".to_string(),
			"openai/gpt-4o-mini".to_string(),
			"anthropic/claude-3-haiku".to_string(),
		]
	);
}

#[test]
fn generation_temperature_must_be_finite() {
	let mut cfg = base_config();

	cfg.providers.generation.temperature = f32::NAN;

	let err = scry_config::validate(&cfg).expect_err("Expected temperature validation error.");

	assert!(
		err.to_string().contains("providers.generation.temperature must be a finite number."),
		"Unexpected error: {err}"
	);
}

#[test]
fn generation_temperature_must_be_in_range() {
	let mut cfg = base_config();

	cfg.providers.generation.temperature = 2.5;

	let err = scry_config::validate(&cfg).expect_err("Expected temperature range validation error.");

	assert!(
		err.to_string().contains("providers.generation.temperature must be in the range 0.0-2.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn probe_depth_zero_falls_back_to_num_candidates() {
	let cfg = base_config();

	assert_eq!(cfg.recommend.probe_depth, 0);
	assert_eq!(cfg.recommend.effective_probe_depth(), cfg.recommend.num_candidates);

	let mut cfg = base_config();

	cfg.recommend.probe_depth = 10;

	assert_eq!(cfg.recommend.effective_probe_depth(), 10);
}

#[test]
fn timeout_must_be_positive() {
	let mut value = sample_value();

	provider_table(&mut value, "generation").insert("timeout_ms".to_string(), Value::Integer(0));

	let err = load_payload(render(&value)).expect_err("Expected timeout validation error.");

	assert!(
		err.to_string().contains("Provider generation timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}
