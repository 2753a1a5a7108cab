use thiserror::Error;

/// Errors surfaced by the model, its snapshots and the corpus helpers.
///
/// Only structural or input problems end up here. Statistical edge cases
/// met while generating or scoring (unseen prefix, absorbing loop, empty
/// input) have defined fallback outputs and never produce an error.
#[derive(Debug, Error)]
pub enum ModelError {
	#[error("depth must be >= 1, got {0}")]
	InvalidDepth(usize),

	#[error("max_length ({max}) must be >= min_length ({min})")]
	InvalidLengthRange { min: usize, max: usize },

	#[error("malformed snapshot: {0}")]
	MalformedSnapshot(String),

	#[error("depth mismatch: expected {expected}, found {found}")]
	DepthMismatch { expected: usize, found: usize },

	#[error("model '{0}' already loaded")]
	ModelAlreadyLoaded(String),

	#[error("model '{0}' not found")]
	UnknownModel(String),

	#[error("unknown tokenization '{0}', expected 'chars' or 'words'")]
	InvalidTokenization(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Postcard(#[from] postcard::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
