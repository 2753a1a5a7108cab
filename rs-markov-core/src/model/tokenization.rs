use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How a text line is cut into symbols.
///
/// # Variants
/// - `Characters`: one symbol per `char`, joined back without separator
/// - `Words`: whitespace-separated words, joined back with a single space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenization {
	#[default]
	#[serde(rename = "chars")]
	Characters,
	Words,
}

impl Tokenization {
	pub fn split(&self, line: &str) -> Vec<String> {
		match self {
			Tokenization::Characters => line.chars().map(String::from).collect(),
			Tokenization::Words => line.split_whitespace().map(str::to_owned).collect(),
		}
	}

	pub fn join(&self, symbols: &[String]) -> String {
		match self {
			Tokenization::Characters => symbols.concat(),
			Tokenization::Words => symbols.join(" "),
		}
	}

	/// Short name, also used in cache file names.
	pub fn tag(&self) -> &'static str {
		match self {
			Tokenization::Characters => "chars",
			Tokenization::Words => "words",
		}
	}
}

impl fmt::Display for Tokenization {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag())
	}
}

impl FromStr for Tokenization {
	type Err = ModelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"chars" | "characters" => Ok(Tokenization::Characters),
			"words" => Ok(Tokenization::Words),
			_ => Err(ModelError::InvalidTokenization(s.to_owned())),
		}
	}
}
