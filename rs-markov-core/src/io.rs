use std::env;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Extension of line-oriented training corpora.
pub const CORPUS_EXTENSION: &str = "dat";

/// Reads a corpus file and returns its non-blank lines.
///
/// - Streams the file line by line
/// - Trailing whitespace (including `\r`) is trimmed
/// - Blank lines are skipped, they carry no sequence
pub fn read_lines<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
	let reader = BufReader::new(File::open(filename)?);
	let mut lines = Vec::new();
	for line in reader.lines() {
		let line = line?;
		let line = line.trim_end();
		if !line.is_empty() {
			lines.push(line.to_owned());
		}
	}
	Ok(lines)
}

/// Builds the path of a file living next to `input_path` with a new extension.
///
/// Example:
/// `data/names.dat` + `"chars2.bin"` → `data/names.chars2.bin`
pub fn sibling_path<P: AsRef<Path>>(input_path: P, extension: &str) -> Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path.file_stem().ok_or_else(|| {
		std::io::Error::new(std::io::ErrorKind::InvalidInput, "Input path has no filename")
	})?;

	let mut output = parent.join(file_stem);
	output.set_extension(extension);
	Ok(output)
}

/// Name under which a model built from `path` is registered.
///
/// `"./data/names.dat"` → `"names"`
pub fn model_name<P: AsRef<Path>>(path: P) -> Result<String> {
	let stem = path.as_ref().file_stem().ok_or_else(|| {
		std::io::Error::new(std::io::ErrorKind::InvalidInput, "Path has no filename")
	})?;
	Ok(stem.to_string_lossy().into_owned())
}

/// `"."` and `"./"` resolve to the current working directory, anything else is kept as-is.
pub fn resolve_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists the corpus files (`.dat`) directly inside `dir`, sorted by path.
pub fn list_corpora<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension().is_some_and(|ext| ext == CORPUS_EXTENSION) {
			files.push(path);
		}
	}
	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn sibling_path_replaces_extension() {
		let path = sibling_path("data/names.dat", "chars2.bin").unwrap();
		assert_eq!(path, PathBuf::from("data/names.chars2.bin"));
	}

	#[test]
	fn model_name_is_file_stem() {
		assert_eq!(model_name("./data/names.dat").unwrap(), "names");
		assert_eq!(model_name("names.dat").unwrap(), "names");
	}

	#[test]
	fn read_lines_skips_blank_lines() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "alpha\r\n\n  \nbeta  \n").unwrap();
		let lines = read_lines(file.path()).unwrap();
		assert_eq!(lines, vec!["alpha".to_owned(), "beta".to_owned()]);
	}

	#[test]
	fn list_corpora_filters_extension() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.dat"), "x").unwrap();
		fs::write(dir.path().join("a.dat"), "x").unwrap();
		fs::write(dir.path().join("a.bin"), "x").unwrap();
		let files = list_corpora(dir.path()).unwrap();
		let names: Vec<_> = files.iter().map(|p| model_name(p).unwrap()).collect();
		assert_eq!(names, vec!["a", "b"]);
	}
}
