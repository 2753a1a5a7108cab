use std::collections::HashMap;
use std::fmt;

/// Fixed-length (= depth) tuple of symbol indexes addressing a chain entry.
///
/// Also used as the sliding window during generation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct PrefixKey(Box<[usize]>);

impl PrefixKey {
	/// Window made of `depth` boundary indexes.
	pub fn boundary(depth: usize) -> Self {
		Self(vec![super::symbol_table::BOUNDARY; depth].into_boxed_slice())
	}

	pub fn indexes(&self) -> &[usize] {
		&self.0
	}

	/// Drops the oldest index and appends `next`.
	pub fn shift(&mut self, next: usize) {
		if let Some(last) = self.0.len().checked_sub(1) {
			self.0.rotate_left(1);
			self.0[last] = next;
		}
	}

	/// Parses the `,`-joined form produced by `Display`.
	///
	/// Only that exact form is accepted: no whitespace, sign or leading zero,
	/// so each prefix has a single textual key.
	pub fn parse(key: &str) -> Option<Self> {
		key.split(',')
			.map(parse_index)
			.collect::<Option<Vec<_>>>()
			.map(|indexes| Self(indexes.into_boxed_slice()))
	}
}

fn parse_index(part: &str) -> Option<usize> {
	if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) || (part.len() > 1 && part.starts_with('0')) {
		return None;
	}
	part.parse().ok()
}

impl From<&[usize]> for PrefixKey {
	fn from(indexes: &[usize]) -> Self {
		Self(indexes.into())
	}
}

impl fmt::Display for PrefixKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, index) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(",")?;
			}
			write!(f, "{index}")?;
		}
		Ok(())
	}
}

/// Observed transitions out of one prefix.
///
/// The running total is kept beside the suffix map, never inside it, so no
/// suffix index can collide with it.
///
/// # Invariants
/// - every stored count is strictly positive
/// - `total` equals the sum of the stored counts
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ChainEntry {
	suffixes: HashMap<usize, u64>,
	total: u64,
}

impl ChainEntry {
	/// Adds `occurrences` observations of `suffix`.
	pub fn add(&mut self, suffix: usize, occurrences: u64) {
		if occurrences == 0 {
			return;
		}
		*self.suffixes.entry(suffix).or_insert(0) += occurrences;
		self.total += occurrences;
	}

	pub fn count(&self, suffix: usize) -> u64 {
		self.suffixes.get(&suffix).copied().unwrap_or(0)
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	/// `count / total` for `suffix`, `None` if it was never observed.
	pub fn likelihood(&self, suffix: usize) -> Option<f64> {
		let count = *self.suffixes.get(&suffix)?;
		Some(count as f64 / self.total as f64)
	}

	/// Suffix/count pairs sorted by suffix index.
	pub fn sorted_suffixes(&self) -> Vec<(usize, u64)> {
		let mut suffixes: Vec<_> = self.suffixes.iter().map(|(&s, &c)| (s, c)).collect();
		suffixes.sort_unstable_by_key(|&(suffix, _)| suffix);
		suffixes
	}
}

/// For every observed prefix, how often each suffix followed it.
///
/// Purely additive: counts are only ever increased.
#[derive(Clone, Debug, Default)]
pub(crate) struct ChainCounter {
	entries: HashMap<PrefixKey, ChainEntry>,
}

impl ChainCounter {
	/// Records `occurrences` transitions `prefix → suffix`, creating the entry on first use.
	pub fn record(&mut self, prefix: &[usize], suffix: usize, occurrences: u64) {
		match self.entries.get_mut(prefix) {
			Some(entry) => entry.add(suffix, occurrences),
			None => {
				let mut entry = ChainEntry::default();
				entry.add(suffix, occurrences);
				self.entries.insert(PrefixKey::from(prefix), entry);
			}
		}
	}

	/// Inserts a fully built entry. Returns the entry it replaced, if any.
	pub fn insert(&mut self, prefix: PrefixKey, entry: ChainEntry) -> Option<ChainEntry> {
		self.entries.insert(prefix, entry)
	}

	pub fn get(&self, prefix: &[usize]) -> Option<&ChainEntry> {
		self.entries.get(prefix)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&PrefixKey, &ChainEntry)> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}
}

impl std::borrow::Borrow<[usize]> for PrefixKey {
	fn borrow(&self) -> &[usize] {
		&self.0
	}
}
