use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{ModelError, Result};

/// Parameters of one generation request.
///
/// # Invariants
/// - `max_length >= min_length`
///
/// The length contract is best effort: the output may be shorter than
/// `min_length` when the chain keeps drawing the boundary symbol or reaches
/// an unseen prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationInput {
	min_length: usize,
	max_length: usize,

	/// Optional RNG seed. `None` uses the thread-local generator.
	pub seed: Option<u64>,
}

impl GenerationInput {
	/// Creates an input for lengths in `[min_length, max_length]`.
	///
	/// # Errors
	/// Returns `InvalidLengthRange` if `max_length < min_length`.
	pub fn new(min_length: usize, max_length: usize) -> Result<Self> {
		if max_length < min_length {
			return Err(ModelError::InvalidLengthRange { min: min_length, max: max_length });
		}
		Ok(Self { min_length, max_length, seed: None })
	}

	/// Input where `max_length` defaults to `min_length`.
	pub fn exact(length: usize) -> Self {
		Self { min_length: length, max_length: length, seed: None }
	}

	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	pub fn min_length(&self) -> usize {
		self.min_length
	}

	pub fn max_length(&self) -> usize {
		self.max_length
	}

	/// Seeded RNG if a seed is set.
	pub(crate) fn seeded_rng(&self) -> Option<StdRng> {
		self.seed.map(StdRng::seed_from_u64)
	}
}
