use std::collections::HashMap;
use std::path::Path;

use log::info;

use super::chain_counter::ChainCounter;
use super::corpus::load_corpus;
use super::generation_input::GenerationInput;
use super::markov_model::{MAX_DEPTH, MarkovModel};
use super::symbol_table::SymbolTable;
use super::tokenization::Tokenization;
use crate::error::{ModelError, Result};
use crate::io;

/// Named collection of text models sharing one depth and tokenization.
///
/// # Responsibilities
/// - Load every corpus (`.dat`) of a directory, one model per file
/// - Look up, insert and replace models by name
///
/// The catalog hands out `&mut` access to its models, so concurrent users
/// must wrap it in a lock.
#[derive(Debug)]
pub struct ModelCatalog {
	depth: usize,
	tokenization: Tokenization,
	models: HashMap<String, MarkovModel<String>>,
}

impl ModelCatalog {
	/// Creates an empty catalog.
	///
	/// # Errors
	/// Returns `InvalidDepth` if `depth` is outside `1..=MAX_DEPTH`.
	pub fn new(depth: usize, tokenization: Tokenization) -> Result<Self> {
		if depth == 0 || depth > MAX_DEPTH {
			return Err(ModelError::InvalidDepth(depth));
		}
		Ok(Self { depth, tokenization, models: HashMap::new() })
	}

	/// Creates a catalog holding one model per `.dat` file of `folder`.
	///
	/// # Parameters
	/// - `folder`: directory containing corpus files. Both `"folder"` and
	///   `"folder/"` are accepted, `"."` is the working directory.
	///
	/// # Errors
	/// - The path is not a directory
	/// - A corpus fails to load
	pub fn from_folder(folder: &str, depth: usize, tokenization: Tokenization) -> Result<Self> {
		let mut catalog = Self::new(depth, tokenization)?;
		let folder = io::resolve_folder(folder);
		if !folder.is_dir() {
			return Err(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Expected a directory, got: {}", folder.display()),
			)
			.into());
		}

		for corpus in io::list_corpora(&folder)? {
			catalog.load_model(&corpus)?;
		}
		info!("catalog loaded {} models from {}", catalog.models.len(), folder.display());
		Ok(catalog)
	}

	/// Loads one corpus file under its file stem.
	///
	/// # Errors
	/// Returns `ModelAlreadyLoaded` if the name is taken.
	pub fn load_model<P: AsRef<Path>>(&mut self, corpus: P) -> Result<&mut MarkovModel<String>> {
		let name = io::model_name(&corpus)?;
		if self.models.contains_key(&name) {
			return Err(ModelError::ModelAlreadyLoaded(name));
		}
		let model = load_corpus(&corpus, self.depth, self.tokenization)?;
		Ok(self.models.entry(name).or_insert(model))
	}

	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn tokenization(&self) -> Tokenization {
		self.tokenization
	}

	/// Loaded model names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.models.keys().cloned().collect();
		names.sort();
		names
	}

	pub fn get(&self, name: &str) -> Result<&MarkovModel<String>> {
		self.models.get(name).ok_or_else(|| ModelError::UnknownModel(name.to_owned()))
	}

	pub fn get_mut(&mut self, name: &str) -> Result<&mut MarkovModel<String>> {
		self.models.get_mut(name).ok_or_else(|| ModelError::UnknownModel(name.to_owned()))
	}

	/// Returns the named model, creating an empty one if absent.
	pub fn get_or_create(&mut self, name: &str) -> &mut MarkovModel<String> {
		let depth = self.depth;
		self.models
			.entry(name.to_owned())
			.or_insert_with(|| MarkovModel::from_parts(depth, SymbolTable::new(), ChainCounter::default()))
	}

	/// Inserts or replaces a model.
	///
	/// # Errors
	/// Returns `DepthMismatch` if the model depth differs from the catalog's.
	pub fn insert(&mut self, name: &str, model: MarkovModel<String>) -> Result<()> {
		if model.depth() != self.depth {
			return Err(ModelError::DepthMismatch { expected: self.depth, found: model.depth() });
		}
		self.models.insert(name.to_owned(), model);
		Ok(())
	}

	/// Text form of a generation from the named model.
	pub fn generate(&mut self, name: &str, input: &GenerationInput) -> Result<String> {
		let tokenization = self.tokenization;
		let generated = self.get_mut(name)?.generate_from(input);
		Ok(tokenization.join(&generated))
	}

	/// Score of a text line against the named model.
	pub fn score(&self, name: &str, text: &str) -> Result<f64> {
		Ok(self.get(name)?.score(&self.tokenization.split(text)))
	}

	/// Trains the named model (created if absent) on text lines.
	pub fn train<'a, I>(&mut self, name: &str, lines: I) -> usize
	where
		I: IntoIterator<Item = &'a str>,
	{
		let tokenization = self.tokenization;
		let model = self.get_or_create(name);
		let mut trained = 0;
		for line in lines {
			model.train(&tokenization.split(line));
			trained += 1;
		}
		trained
	}
}
