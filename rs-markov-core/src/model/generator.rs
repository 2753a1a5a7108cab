use log::debug;
use rand::Rng;

use super::chain_counter::PrefixKey;
use super::probability_index::ProbabilityIndex;
use super::symbol_table::BOUNDARY;

/// Number of boundary draws tolerated in one call before giving up on `min_length`.
pub const MAX_ABSORBING_DRAWS: usize = 15;

/// Walks the chain from the boundary window and returns the sampled suffix indexes.
///
/// # Behavior
/// - Each step draws `u` in `[0, 1)` and takes the first suffix of the
///   current prefix whose cumulative mass is `>= u`.
/// - A boundary draw does not advance the window. It increments a counter
///   that persists for the whole call; generation stops once `min_length`
///   is reached or the counter exceeds `MAX_ABSORBING_DRAWS`.
/// - Any other draw is appended and shifted into the window.
/// - Generation stops unconditionally at `max_length`, or when the window
///   reaches a prefix that was never observed.
///
/// The result never contains the boundary index and holds at most
/// `max_length` items.
pub(crate) fn sample_indexes<R: Rng>(
	index: &ProbabilityIndex,
	depth: usize,
	rng: &mut R,
	min_length: usize,
	max_length: usize,
) -> Vec<usize> {
	let mut state = PrefixKey::boundary(depth);
	let mut output = Vec::new();
	let mut absorbing = 0;

	while output.len() < max_length {
		let Some(table) = index.get(&state) else {
			debug!("generation stopped on unseen prefix [{state}] after {} symbols", output.len());
			break;
		};
		let draw: f64 = rng.random();
		let Some(suffix) = table.sample(draw) else {
			break;
		};

		if suffix == BOUNDARY {
			absorbing += 1;
			if output.len() >= min_length || absorbing > MAX_ABSORBING_DRAWS {
				break;
			}
			continue;
		}

		output.push(suffix);
		state.shift(suffix);
	}

	output
}
