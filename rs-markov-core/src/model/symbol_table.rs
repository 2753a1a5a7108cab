use std::collections::HashMap;

use super::Symbol;

/// Index reserved for the boundary symbol.
pub const BOUNDARY: usize = 0;

/// Bidirectional mapping between symbols and dense indexes.
///
/// Indexes are assigned in first-seen order. Index 0 is created with the
/// table and always holds the boundary symbol (`S::default()`), so interning
/// the boundary value itself returns 0.
///
/// # Invariants
/// - `symbols[indexes[s]] == s` for every interned symbol
/// - `symbols[0] == S::default()`
#[derive(Clone, Debug)]
pub struct SymbolTable<S: Symbol> {
	symbols: Vec<S>,
	indexes: HashMap<S, usize>,
}

impl<S: Symbol> SymbolTable<S> {
	/// Creates a table containing only the boundary symbol.
	pub fn new() -> Self {
		let boundary = S::default();
		let mut indexes = HashMap::new();
		indexes.insert(boundary.clone(), BOUNDARY);
		Self { symbols: vec![boundary], indexes }
	}

	/// Rebuilds a table from an ordered symbol list (position = index).
	///
	/// Returns `None` if the list is empty, does not start with the boundary
	/// symbol, or contains the same symbol twice.
	pub(crate) fn from_symbols(symbols: Vec<S>) -> Option<Self> {
		if symbols.first() != Some(&S::default()) {
			return None;
		}
		let mut indexes = HashMap::with_capacity(symbols.len());
		for (index, symbol) in symbols.iter().enumerate() {
			if indexes.insert(symbol.clone(), index).is_some() {
				return None;
			}
		}
		Some(Self { symbols, indexes })
	}

	/// Returns the index of `symbol`, assigning the next free one if unseen.
	pub fn intern(&mut self, symbol: &S) -> usize {
		if let Some(&index) = self.indexes.get(symbol) {
			return index;
		}
		let index = self.symbols.len();
		self.symbols.push(symbol.clone());
		self.indexes.insert(symbol.clone(), index);
		index
	}

	/// Read-only query, `None` for symbols never interned.
	pub fn lookup(&self, symbol: &S) -> Option<usize> {
		self.indexes.get(symbol).copied()
	}

	/// Inverse of `intern`.
	pub fn resolve(&self, index: usize) -> Option<&S> {
		self.symbols.get(index)
	}

	/// Number of symbols, boundary included.
	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	/// A table always holds the boundary symbol, so this is never true.
	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	/// Symbols ordered by index.
	pub fn symbols(&self) -> &[S] {
		&self.symbols
	}
}

impl<S: Symbol> Default for SymbolTable<S> {
	fn default() -> Self {
		Self::new()
	}
}
