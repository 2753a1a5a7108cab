use std::collections::HashMap;

use log::debug;

use super::chain_counter::{ChainCounter, ChainEntry, PrefixKey};

/// Cumulative probability table of one prefix.
///
/// Pairs of `(cumulative_mass, suffix_index)` with strictly increasing mass,
/// the last one equal to 1.0 within floating-point tolerance.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CumulativeTable {
	entries: Vec<(f64, usize)>,
}

impl CumulativeTable {
	/// Accumulates `count / total` over the suffixes, in suffix index order.
	fn from_entry(entry: &ChainEntry) -> Self {
		let total = entry.total() as f64;
		let mut mass = 0.0;
		let entries = entry
			.sorted_suffixes()
			.into_iter()
			.map(|(suffix, count)| {
				mass += count as f64 / total;
				(mass, suffix)
			})
			.collect();
		Self { entries }
	}

	/// Weighted random choice: the first suffix whose cumulative mass is `>= draw`.
	///
	/// `draw` is expected in `[0, 1)`. When rounding leaves the final mass
	/// just under the draw, the last suffix is returned.
	pub fn sample(&self, draw: f64) -> Option<usize> {
		self.entries
			.iter()
			.find(|(mass, _)| *mass >= draw)
			.or(self.entries.last())
			.map(|&(_, suffix)| suffix)
	}

	#[cfg(test)]
	pub fn entries(&self) -> &[(f64, usize)] {
		&self.entries
	}
}

/// Materialization of a `ChainCounter` as per-prefix cumulative tables.
///
/// Read-only once built. A rebuild always produces a whole new index.
#[derive(Clone, Debug, Default)]
pub(crate) struct ProbabilityIndex {
	tables: HashMap<PrefixKey, CumulativeTable>,
}

impl ProbabilityIndex {
	pub fn build(counter: &ChainCounter) -> Self {
		let tables = counter
			.iter()
			.map(|(prefix, entry)| (prefix.clone(), CumulativeTable::from_entry(entry)))
			.collect::<HashMap<_, _>>();
		debug!("probability index rebuilt: {} prefixes", tables.len());
		Self { tables }
	}

	pub fn get(&self, prefix: &PrefixKey) -> Option<&CumulativeTable> {
		self.tables.get(prefix)
	}

	#[cfg(test)]
	pub fn tables(&self) -> impl Iterator<Item = (&PrefixKey, &CumulativeTable)> {
		self.tables.iter()
	}
}

/// Cache state of the probability index.
///
/// Any write to the counter moves it back to `Stale`; there is no per-prefix
/// invalidation.
#[derive(Clone, Debug, Default)]
pub(crate) enum ProbabilityCache {
	#[default]
	Stale,
	Fresh(ProbabilityIndex),
}

impl ProbabilityCache {
	pub fn invalidate(&mut self) {
		*self = ProbabilityCache::Stale;
	}

	pub fn is_fresh(&self) -> bool {
		matches!(self, ProbabilityCache::Fresh(_))
	}

	/// Returns the index, rebuilding it from `counter` first if stale.
	pub fn fresh(&mut self, counter: &ChainCounter) -> &ProbabilityIndex {
		if let ProbabilityCache::Stale = self {
			*self = ProbabilityCache::Fresh(ProbabilityIndex::build(counter));
		}
		match self {
			ProbabilityCache::Fresh(index) => index,
			ProbabilityCache::Stale => unreachable!("index rebuilt above"),
		}
	}
}
