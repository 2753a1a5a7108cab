use std::env;
use std::fmt::Display;
use std::str::FromStr;

use rs_markov_core::{MAX_DEPTH, Tokenization};

/// Server settings, read from the environment.
///
/// | variable              | default     |
/// |-----------------------|-------------|
/// | `MARKOV_HOST`         | `127.0.0.1` |
/// | `MARKOV_PORT`         | `5000`      |
/// | `MARKOV_DATA_DIR`     | `./data`    |
/// | `MARKOV_DEPTH`        | `2`         |
/// | `MARKOV_TOKENIZATION` | `chars`     |
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	pub data_dir: String,
	pub depth: usize,
	pub tokenization: Tokenization,
}

impl ServerConfig {
	pub fn from_env() -> Result<Self, String> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	fn from_lookup<F>(lookup: F) -> Result<Self, String>
	where
		F: Fn(&str) -> Option<String>,
	{
		let config = Self {
			host: lookup("MARKOV_HOST").unwrap_or_else(|| "127.0.0.1".to_owned()),
			port: parse_or(&lookup, "MARKOV_PORT", 5000)?,
			data_dir: lookup("MARKOV_DATA_DIR").unwrap_or_else(|| "./data".to_owned()),
			depth: parse_or(&lookup, "MARKOV_DEPTH", 2)?,
			tokenization: parse_or(&lookup, "MARKOV_TOKENIZATION", Tokenization::Characters)?,
		};
		if config.depth == 0 || config.depth > MAX_DEPTH {
			return Err(format!("MARKOV_DEPTH must be between 1 and {MAX_DEPTH}"));
		}
		Ok(config)
	}
}

fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> Result<T, String>
where
	T: FromStr,
	T::Err: Display,
	F: Fn(&str) -> Option<String>,
{
	match lookup(name) {
		None => Ok(default),
		Some(value) => value.trim().parse().map_err(|e| format!("invalid {name}='{value}': {e}")),
	}
}
