//! Top-level module for the Markov chain system.
//!
//! This module provides:
//! - The model itself (`MarkovModel`)
//! - Symbol interning (`SymbolTable`)
//! - Transition counting (`ChainCounter`) and its derived cumulative tables
//!   (`ProbabilityIndex`), both internal
//! - Generation parameters (`GenerationInput`)
//! - Flat snapshots, text tokenization, corpus loading and a named catalog

use std::hash::Hash;

/// Bidirectional mapping between symbols and dense indexes.
pub mod symbol_table;

/// Per-prefix suffix occurrence counts.
///
/// Internal: only the model writes to it.
mod chain_counter;

/// Lazily built cumulative probability tables used for sampling.
///
/// Internal: derived from the counter, never persisted.
mod probability_index;

/// Sampling loop walking prefix → suffix transitions.
mod generator;

/// Generation parameters (length bounds, optional seed).
pub mod generation_input;

/// The order-k Markov chain model: training, generation, scoring, merging.
pub mod markov_model;

/// Flat serializable form of a model.
pub mod snapshot;

/// Conversion between text lines and symbol sequences.
pub mod tokenization;

/// Building models from line-oriented corpus files.
pub mod corpus;

/// Named collection of text models.
pub mod catalog;

/// Alphabet element accepted by the model.
///
/// `Default::default()` is the boundary symbol, permanently mapped to index 0.
pub trait Symbol: Clone + Eq + Hash + Default {}

impl<T: Clone + Eq + Hash + Default> Symbol for T {}
