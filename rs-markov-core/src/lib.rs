//! Order-k Markov chain library.
//!
//! This crate provides a discrete-symbol Markov chain system including:
//! - Symbol interning with a reserved boundary symbol
//! - Prefix/suffix transition counting and lazy cumulative probabilities
//! - Weighted sampling of new sequences
//! - Likelihood scoring of existing sequences
//! - Flat snapshots (postcard / JSON) and line-oriented corpus loading
//!
//! Only the high-level API is exposed publicly. Low-level components
//! are kept internal to ensure consistency and prevent misuse.

/// Markov chain model, generation and scoring.
///
/// This module exposes the model and its supporting types while keeping
/// the counting and probability tables private.
pub mod model;

/// Error type shared by every fallible operation of the crate.
pub mod error;

/// I/O utilities (corpus reading, path helpers).
pub mod io;

pub use error::{ModelError, Result};
pub use model::catalog::ModelCatalog;
pub use model::generation_input::GenerationInput;
pub use model::markov_model::{MAX_DEPTH, MarkovModel};
pub use model::snapshot::{Snapshot, SnapshotEntry};
pub use model::tokenization::Tokenization;
