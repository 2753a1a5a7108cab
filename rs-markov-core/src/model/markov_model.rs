use std::iter;

use log::debug;
use rand::Rng;

use super::Symbol;
use super::chain_counter::ChainCounter;
use super::generation_input::GenerationInput;
use super::generator::sample_indexes;
use super::probability_index::ProbabilityCache;
use super::symbol_table::{BOUNDARY, SymbolTable};
use crate::error::{ModelError, Result};

/// Largest accepted depth. Every prefix holds `depth` indexes, so an
/// unbounded value read from a snapshot could not even be allocated.
pub const MAX_DEPTH: usize = 64;

/// Order-k Markov chain over symbols of type `S`.
///
/// The probability of the next symbol depends only on the `depth` symbols
/// before it. Sequences are padded with `depth` boundary symbols in front and
/// one boundary symbol at the end, so the model also learns how sequences
/// start and stop.
///
/// # Responsibilities
/// - Learn transition counts from sequences (`train`, `merge`)
/// - Sample new sequences (`generate`, `generate_with`, `generate_from`)
/// - Score how well a sequence fits the learned counts (`score`)
///
/// # Invariants
/// - `1 <= depth <= MAX_DEPTH`, fixed at construction
/// - every index stored in the counter resolves in the symbol table
/// - the probability cache is either `Stale` or built from the current counts
///
/// The model has no internal synchronization. Training is exclusive with
/// respect to generation on the same instance; callers sharing a model must
/// serialize access themselves (for example behind a `Mutex`).
#[derive(Clone, Debug)]
pub struct MarkovModel<S: Symbol> {
	depth: usize,
	symbols: SymbolTable<S>,
	counter: ChainCounter,
	probabilities: ProbabilityCache,
}

impl<S: Symbol> MarkovModel<S> {
	/// Creates an empty model of the given depth.
	///
	/// # Errors
	/// Returns `InvalidDepth` if `depth` is outside `1..=MAX_DEPTH`.
	pub fn new(depth: usize) -> Result<Self> {
		if depth == 0 || depth > MAX_DEPTH {
			return Err(ModelError::InvalidDepth(depth));
		}
		Ok(Self::from_parts(depth, SymbolTable::new(), ChainCounter::default()))
	}

	pub(crate) fn from_parts(depth: usize, symbols: SymbolTable<S>, counter: ChainCounter) -> Self {
		Self { depth, symbols, counter, probabilities: ProbabilityCache::Stale }
	}

	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn symbol_table(&self) -> &SymbolTable<S> {
		&self.symbols
	}

	/// Number of interned symbols, boundary included.
	pub fn symbol_count(&self) -> usize {
		self.symbols.len()
	}

	/// Number of distinct prefixes observed so far.
	pub fn prefix_count(&self) -> usize {
		self.counter.len()
	}

	/// Whether the cumulative tables are built and match the current counts.
	pub fn is_index_fresh(&self) -> bool {
		self.probabilities.is_fresh()
	}

	pub(crate) fn counter(&self) -> &ChainCounter {
		&self.counter
	}

	/// How many times `suffix` followed `prefix`.
	///
	/// Use `S::default()` for boundary positions. Returns 0 when the prefix
	/// does not have exactly `depth` symbols or any symbol is unknown.
	pub fn count(&self, prefix: &[S], suffix: &S) -> u64 {
		if prefix.len() != self.depth {
			return 0;
		}
		let Some(prefix) = prefix.iter().map(|s| self.symbols.lookup(s)).collect::<Option<Vec<_>>>() else {
			return 0;
		};
		match (self.counter.get(&prefix), self.symbols.lookup(suffix)) {
			(Some(entry), Some(suffix)) => entry.count(suffix),
			_ => 0,
		}
	}

	/// Learns one sequence.
	///
	/// New symbols are interned, the sequence is padded with boundary
	/// symbols and every `depth + 1` window adds one `prefix → suffix`
	/// observation. Counts accumulate across calls and are never reset.
	/// The probability index is invalidated.
	pub fn train(&mut self, sequence: &[S]) -> &mut Self {
		let indexes: Vec<usize> = sequence.iter().map(|symbol| self.symbols.intern(symbol)).collect();

		let padded: Vec<usize> = iter::repeat_n(BOUNDARY, self.depth)
			.chain(indexes)
			.chain(iter::once(BOUNDARY))
			.collect();

		for window in padded.windows(self.depth + 1) {
			let (prefix, suffix) = window.split_at(self.depth);
			self.counter.record(prefix, suffix[0], 1);
		}
		debug!("trained {} windows, {} prefixes known", padded.len() - self.depth, self.counter.len());

		self.probabilities.invalidate();
		self
	}

	/// Learns every sequence of `sequences`, in order.
	pub fn train_all<I>(&mut self, sequences: I) -> &mut Self
	where
		I: IntoIterator,
		I::Item: AsRef<[S]>,
	{
		for sequence in sequences {
			self.train(sequence.as_ref());
		}
		self
	}

	/// Samples a sequence whose length is, on a best-effort basis, within
	/// `[min_length, max_length]`, using the thread-local RNG.
	///
	/// # Errors
	/// Returns `InvalidLengthRange` if `max_length < min_length`.
	pub fn generate(&mut self, min_length: usize, max_length: usize) -> Result<Vec<S>> {
		self.generate_with(&mut rand::rng(), min_length, max_length)
	}

	/// Same as `generate` with a caller-provided RNG.
	///
	/// Rebuilds the probability index first if it is stale. The output is
	/// never longer than `max_length`; it can be shorter than `min_length`
	/// if the chain reaches an unseen prefix or draws the boundary symbol
	/// more than `MAX_ABSORBING_DRAWS` times.
	pub fn generate_with<R: Rng>(&mut self, rng: &mut R, min_length: usize, max_length: usize) -> Result<Vec<S>> {
		if max_length < min_length {
			return Err(ModelError::InvalidLengthRange { min: min_length, max: max_length });
		}

		let index = self.probabilities.fresh(&self.counter);
		let sampled = sample_indexes(index, self.depth, rng, min_length, max_length);

		Ok(sampled
			.into_iter()
			.filter_map(|suffix| self.symbols.resolve(suffix).cloned())
			.collect())
	}

	/// Generates according to a validated `GenerationInput`, honoring its seed.
	pub fn generate_from(&mut self, input: &GenerationInput) -> Vec<S> {
		let (min_length, max_length) = (input.min_length(), input.max_length());
		let generated = match input.seeded_rng() {
			Some(mut rng) => self.generate_with(&mut rng, min_length, max_length),
			None => self.generate_with(&mut rand::rng(), min_length, max_length),
		};
		// GenerationInput guarantees min <= max
		generated.unwrap_or_default()
	}

	/// Average transition likelihood of `sequence` under the current counts.
	///
	/// The sequence is padded like in `train`, but symbols are only looked
	/// up: a window touching an unknown symbol contributes nothing. Each
	/// recognized window adds `count / total` and the sum is divided by the
	/// unpadded length. This is not a joint probability. Since a sequence of
	/// length `n` has `n + 1` windows, the value may slightly exceed 1.
	///
	/// An empty sequence scores 0.
	pub fn score(&self, sequence: &[S]) -> f64 {
		if sequence.is_empty() {
			return 0.0;
		}

		let padded: Vec<Option<usize>> = iter::repeat_n(Some(BOUNDARY), self.depth)
			.chain(sequence.iter().map(|symbol| self.symbols.lookup(symbol)))
			.chain(iter::once(Some(BOUNDARY)))
			.collect();

		let mut accumulator = 0.0;
		for window in padded.windows(self.depth + 1) {
			let (prefix, suffix) = window.split_at(self.depth);
			let (Some(prefix), Some(suffix)) = (prefix.iter().copied().collect::<Option<Vec<_>>>(), suffix[0]) else {
				continue;
			};
			if let Some(likelihood) = self.counter.get(&prefix).and_then(|entry| entry.likelihood(suffix)) {
				accumulator += likelihood;
			}
		}

		accumulator / sequence.len() as f64
	}

	/// Adds the counts of `other` into this model.
	///
	/// Symbols of `other` are interned here first and its prefixes are
	/// remapped accordingly. Like training, merging is purely additive and
	/// invalidates the probability index.
	///
	/// # Errors
	/// Returns `DepthMismatch` if the depths differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.depth != other.depth {
			return Err(ModelError::DepthMismatch { expected: self.depth, found: other.depth });
		}

		let remap: Vec<usize> = other.symbols.symbols().iter().map(|symbol| self.symbols.intern(symbol)).collect();

		for (prefix, entry) in other.counter.iter() {
			let mapped: Vec<usize> = prefix.indexes().iter().map(|&index| remap[index]).collect();
			for (suffix, occurrences) in entry.sorted_suffixes() {
				self.counter.record(&mapped, remap[suffix], occurrences);
			}
		}

		self.probabilities.invalidate();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn chars(s: &str) -> Vec<char> {
		s.chars().collect()
	}

	#[test]
	fn zero_depth_is_rejected() {
		assert!(matches!(MarkovModel::<char>::new(0), Err(ModelError::InvalidDepth(0))));
	}

	#[test]
	fn depth_is_bounded() {
		assert!(MarkovModel::<char>::new(MAX_DEPTH).is_ok());
		assert!(matches!(MarkovModel::<char>::new(MAX_DEPTH + 1), Err(ModelError::InvalidDepth(_))));
	}

	#[test]
	fn depth_one_counts() {
		let mut model = MarkovModel::new(1).unwrap();
		model.train(&chars("ababa"));

		assert_eq!(model.count(&['\0'], &'a'), 1);
		assert_eq!(model.count(&['a'], &'b'), 2);
		assert_eq!(model.count(&['b'], &'a'), 2);
		assert_eq!(model.count(&['a'], &'\0'), 1);
		assert_eq!(model.count(&['b'], &'\0'), 0);
		assert_eq!(model.prefix_count(), 3);
		assert_eq!(model.symbol_count(), 3);
	}

	#[test]
	fn count_rejects_wrong_prefix_length() {
		let mut model = MarkovModel::new(2).unwrap();
		model.train(&chars("xyz"));
		assert_eq!(model.count(&['x'], &'y'), 0);
		assert_eq!(model.count(&['x', 'y'], &'z'), 1);
		assert_eq!(model.count(&['\0', '\0'], &'x'), 1);
	}

	#[test]
	fn score_is_deterministic_and_bounded() {
		let mut model = MarkovModel::new(1).unwrap();
		model.train(&chars("ababa"));

		let score = model.score(&chars("ababa"));
		// (1 + 2/3 + 1 + 2/3 + 1 + 1/3) / 5
		assert!((score - 14.0 / 15.0).abs() < 1e-12);
		assert!(score > 0.0 && score < 1.0);
		assert_eq!(score, model.score(&chars("ababa")));
	}

	#[test]
	fn score_edge_cases() {
		let mut model = MarkovModel::new(1).unwrap();
		model.train(&chars("ab"));
		assert_eq!(model.score(&[]), 0.0);
		assert_eq!(model.score(&chars("zzz")), 0.0);
		assert!(model.score(&chars("az")) > 0.0);
	}

	#[test]
	fn training_invalidates_index() {
		let mut model = MarkovModel::new(1).unwrap();
		model.train(&chars("abc"));
		assert!(!model.is_index_fresh());
		model.generate(1, 3).unwrap();
		assert!(model.is_index_fresh());
		model.train(&chars("abd"));
		assert!(!model.is_index_fresh());
	}

	#[test]
	fn generate_rejects_inverted_range() {
		let mut model = MarkovModel::new(1).unwrap();
		model.train(&chars("abc"));
		assert!(matches!(model.generate(3, 1), Err(ModelError::InvalidLengthRange { .. })));
	}

	#[test]
	fn generate_on_empty_model_is_empty() {
		let mut model: MarkovModel<char> = MarkovModel::new(2).unwrap();
		assert!(model.generate(1, 10).unwrap().is_empty());
	}

	#[test]
	fn deterministic_chain_is_reproduced() {
		let mut model = MarkovModel::new(1).unwrap();
		model.train(&chars("abc"));
		let mut rng = StdRng::seed_from_u64(42);
		assert_eq!(model.generate_with(&mut rng, 0, 10).unwrap(), chars("abc"));
		assert_eq!(model.generate_with(&mut rng, 0, 2).unwrap(), chars("ab"));
	}

	#[test]
	fn seeded_input_is_reproducible() {
		let mut model = MarkovModel::new(1).unwrap();
		model.train_all(["abracadabra", "cadabra", "abba"].iter().map(|s| chars(s)));
		let input = GenerationInput::new(3, 12).unwrap().with_seed(1234);
		let first = model.generate_from(&input);
		let second = model.generate_from(&input);
		assert_eq!(first, second);
		assert!(first.len() <= 12);
	}

	#[test]
	fn merge_remaps_symbols() {
		let mut left = MarkovModel::new(1).unwrap();
		left.train(&chars("ab"));
		let mut right = MarkovModel::new(1).unwrap();
		right.train(&chars("ba"));

		left.merge(&right).unwrap();
		assert_eq!(left.count(&['\0'], &'a'), 1);
		assert_eq!(left.count(&['\0'], &'b'), 1);
		assert_eq!(left.count(&['b'], &'a'), 1);
		assert_eq!(left.count(&['a'], &'\0'), 1);
		assert_eq!(left.count(&['b'], &'\0'), 1);

		let deeper = MarkovModel::new(2).unwrap();
		assert!(matches!(left.merge(&deeper), Err(ModelError::DepthMismatch { expected: 1, found: 2 })));
	}
}
