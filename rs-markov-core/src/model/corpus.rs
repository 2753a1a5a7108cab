use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use log::{info, warn};

use super::markov_model::MarkovModel;
use super::snapshot::Snapshot;
use super::tokenization::Tokenization;
use crate::error::{ModelError, Result};
use crate::io::{read_lines, sibling_path};

/// Chunks per CPU when training a corpus in parallel.
const CHUNKS_PER_CPU: usize = 8;

/// Path of the snapshot cache kept next to a corpus.
///
/// `data/names.dat` with characters at depth 2 → `data/names.chars2.bin`
pub fn cache_path<P: AsRef<Path>>(corpus: P, depth: usize, tokenization: Tokenization) -> Result<PathBuf> {
	sibling_path(corpus, &format!("{}{}.bin", tokenization.tag(), depth))
}

/// Loads a text model for a line-oriented corpus.
///
/// - If a cache snapshot exists next to the corpus, it is loaded instead
///   of re-training.
/// - A cache that cannot be decoded or has another depth is discarded
///   and rebuilt.
/// - Otherwise the corpus is trained with `train_lines` and the result is
///   cached with `postcard`.
pub fn load_corpus<P: AsRef<Path>>(corpus: P, depth: usize, tokenization: Tokenization) -> Result<MarkovModel<String>> {
	let cache = cache_path(&corpus, depth, tokenization)?;
	if cache.exists() {
		match Snapshot::<String>::load(&cache).and_then(MarkovModel::from_snapshot) {
			Ok(model) if model.depth() == depth => {
				info!("loaded cached model {}", cache.display());
				return Ok(model);
			}
			Ok(model) => warn!(
				"discarding cache {}: {}",
				cache.display(),
				ModelError::DepthMismatch { expected: depth, found: model.depth() }
			),
			Err(e) => warn!("discarding cache {}: {e}", cache.display()),
		}
	}

	let lines = read_lines(&corpus)?;
	info!("training {} lines from {}", lines.len(), corpus.as_ref().display());
	let model = train_lines(lines, depth, tokenization)?;
	model.to_snapshot().save(&cache)?;
	Ok(model)
}

/// Trains a model over `lines`, splitting the work across threads.
///
/// # Behavior
/// - Lines are cut into chunks (CPU count × `CHUNKS_PER_CPU`).
/// - Each thread owns its own partial model; models are never shared.
/// - Partial models are merged into the final one as they arrive.
///
/// The resulting counts are the same as training every line in a single
/// model; only the index assigned to each symbol may differ.
///
/// # Errors
/// Returns `InvalidDepth` if `depth == 0`.
pub fn train_lines(lines: Vec<String>, depth: usize, tokenization: Tokenization) -> Result<MarkovModel<String>> {
	let mut final_model = MarkovModel::new(depth)?;
	if lines.is_empty() {
		return Ok(final_model);
	}

	let chunks = num_cpus::get() * CHUNKS_PER_CPU;
	let chunk_size = lines.len().div_ceil(chunks);

	let (tx, rx) = mpsc::channel();
	let mut workers = Vec::new();
	for chunk in lines.chunks(chunk_size) {
		let tx = tx.clone();
		let chunk = chunk.to_vec();
		let mut partial_model = final_model.clone();

		workers.push(thread::spawn(move || {
			for line in &chunk {
				partial_model.train(&tokenization.split(line));
			}
			// the receiver outlives every worker
			let _ = tx.send(partial_model);
		}));
	}
	drop(tx);

	for partial_model in rx.iter() {
		final_model.merge(&partial_model)?;
	}
	for worker in workers {
		if worker.join().is_err() {
			return Err(std::io::Error::other("corpus worker panicked").into());
		}
	}

	Ok(final_model)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cache_path_encodes_depth_and_tokenization() {
		let path = cache_path("data/names.dat", 3, Tokenization::Words).unwrap();
		assert_eq!(path, PathBuf::from("data/names.words3.bin"));
	}

	#[test]
	fn parallel_training_matches_sequential() {
		let lines: Vec<String> = (0..200).map(|i| format!("line{}", i % 7)).collect();

		let parallel = train_lines(lines.clone(), 2, Tokenization::Characters).unwrap();
		let mut sequential = MarkovModel::new(2).unwrap();
		for line in &lines {
			sequential.train(&Tokenization::Characters.split(line));
		}

		assert_eq!(parallel.prefix_count(), sequential.prefix_count());
		assert_eq!(parallel.symbol_count(), sequential.symbol_count());
		for line in ["line3", "line6", "lie", "x"] {
			let symbols = Tokenization::Characters.split(line);
			assert!((parallel.score(&symbols) - sequential.score(&symbols)).abs() < 1e-12);
		}
		let prefix = vec!["n".to_owned(), "e".to_owned()];
		assert_eq!(parallel.count(&prefix, &"5".to_owned()), sequential.count(&prefix, &"5".to_owned()));
	}

	#[test]
	fn empty_corpus_gives_empty_model() {
		let model = train_lines(Vec::new(), 1, Tokenization::Words).unwrap();
		assert_eq!(model.prefix_count(), 0);
		assert!(matches!(train_lines(Vec::new(), 0, Tokenization::Words), Err(ModelError::InvalidDepth(0))));
	}
}
