pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read {path:?}.")]
	ReadFile { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse {path:?} at line {line}.")]
	ParseLine { path: std::path::PathBuf, line: usize, source: serde_json::Error },
	#[error("Failed to parse {path:?}.")]
	ParseFile { path: std::path::PathBuf, source: serde_json::Error },
	#[error("Duplicate item_id {item_id:?} in catalogue.")]
	DuplicateItemId { item_id: String },
	#[error(
		"Embedding rows for model {model_key:?} do not match the catalogue: expected {expected}, found {found}."
	)]
	RowCountMismatch { model_key: String, expected: usize, found: usize },
	#[error("Embedding vector dimension mismatch: expected {expected}, found {found}.")]
	DimensionMismatch { expected: usize, found: usize },
	#[error("Unknown embedding model {model_key:?}.")]
	UnknownEmbeddingModel { model_key: String },
	#[error("Item store holds no items.")]
	EmptyStore,
	#[error("No embeddings files could be loaded from {data_dir:?}.")]
	NoEmbeddings { data_dir: std::path::PathBuf },
}
