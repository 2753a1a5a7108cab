use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Symbol;
use super::chain_counter::{ChainCounter, ChainEntry, PrefixKey};
use super::markov_model::{MAX_DEPTH, MarkovModel};
use super::symbol_table::SymbolTable;
use crate::error::{ModelError, Result};

/// Transition counts of one prefix in a snapshot.
///
/// `total` is a dedicated field outside `suffixes`, so it can never be
/// mistaken for a suffix index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
	pub total: u64,
	pub suffixes: BTreeMap<usize, u64>,
}

/// Flat, serializable form of a `MarkovModel`.
///
/// - `depth`: order of the chain
/// - `symbols`: interned symbols, position = index, position 0 = boundary
/// - `counts`: prefix key (indexes joined with `,`) → transition counts
///
/// The probability index is never stored; a restored model rebuilds it on
/// its first generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<S> {
	pub depth: usize,
	pub symbols: Vec<S>,
	pub counts: BTreeMap<String, SnapshotEntry>,
}

impl<S: Symbol> MarkovModel<S> {
	/// Captures depth, symbol table and counts.
	pub fn to_snapshot(&self) -> Snapshot<S> {
		let counts = self
			.counter()
			.iter()
			.map(|(prefix, entry)| {
				let snapshot_entry = SnapshotEntry {
					total: entry.total(),
					suffixes: entry.sorted_suffixes().into_iter().collect(),
				};
				(prefix.to_string(), snapshot_entry)
			})
			.collect();

		Snapshot {
			depth: self.depth(),
			symbols: self.symbol_table().symbols().to_vec(),
			counts,
		}
	}

	/// Rebuilds a model from a snapshot.
	///
	/// # Errors
	/// Returns `InvalidDepth` if the depth is outside `1..=MAX_DEPTH`, and
	/// `MalformedSnapshot` if any other part is inconsistent (including two
	/// keys naming the same prefix). Nothing is partially reconstructed.
	pub fn from_snapshot(snapshot: Snapshot<S>) -> Result<Self> {
		let Snapshot { depth, symbols, counts } = snapshot;
		if depth == 0 || depth > MAX_DEPTH {
			return Err(ModelError::InvalidDepth(depth));
		}

		let symbol_count = symbols.len();
		let symbols = SymbolTable::from_symbols(symbols).ok_or_else(|| {
			malformed("symbols must start with the boundary value and hold no duplicates")
		})?;

		let mut counter = ChainCounter::default();
		for (key, snapshot_entry) in counts {
			let prefix = PrefixKey::parse(&key)
				.filter(|prefix| prefix.indexes().len() == depth)
				.ok_or_else(|| malformed(format!("prefix '{key}' is not {depth} indexes")))?;
			if prefix.indexes().iter().any(|&index| index >= symbol_count) {
				return Err(malformed(format!("prefix '{key}' references an unknown symbol")));
			}
			if snapshot_entry.suffixes.is_empty() {
				return Err(malformed(format!("prefix '{key}' has no suffix")));
			}

			let mut entry = ChainEntry::default();
			for (&suffix, &occurrences) in &snapshot_entry.suffixes {
				if suffix >= symbol_count {
					return Err(malformed(format!("prefix '{key}' has unknown suffix {suffix}")));
				}
				if occurrences == 0 {
					return Err(malformed(format!("prefix '{key}' has a zero count for suffix {suffix}")));
				}
				entry.add(suffix, occurrences);
			}
			if entry.total() != snapshot_entry.total {
				return Err(malformed(format!(
					"prefix '{key}' total is {}, suffix counts sum to {}",
					snapshot_entry.total,
					entry.total()
				)));
			}
			if counter.insert(prefix, entry).is_some() {
				return Err(malformed(format!("prefix '{key}' is duplicated")));
			}
		}

		Ok(Self::from_parts(depth, symbols, counter))
	}
}

impl<S: Serialize + DeserializeOwned> Snapshot<S> {
	/// Compact binary encoding (postcard).
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(postcard::to_stdvec(self)?)
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		postcard::from_bytes(bytes).map_err(|e| malformed(e.to_string()))
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn from_json(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(|e| malformed(e.to_string()))
	}

	/// Writes the binary encoding to `path`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		fs::write(&path, self.to_bytes()?)?;
		info!("snapshot written to {}", path.as_ref().display());
		Ok(())
	}

	/// Reads a binary snapshot from `path`.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::from_bytes(&fs::read(path)?)
	}
}

fn malformed(reason: impl Into<String>) -> ModelError {
	ModelError::MalformedSnapshot(reason.into())
}
