pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Stage {stage} failed: {message}")]
	Stage { stage: Stage, message: String },
}

/// Pipeline stages in execution order; labels appear verbatim in error
/// payloads and the latency breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	CandidateGeneration,
	Embedding,
	VectorSearch,
	Reranking,
}
impl Stage {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::CandidateGeneration => "candidate_generation",
			Self::Embedding => "embedding",
			Self::VectorSearch => "vector_search",
			Self::Reranking => "reranking",
		}
	}
}
impl std::fmt::Display for Stage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
