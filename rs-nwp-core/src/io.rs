use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, io};

use crate::error::{Error, Result};

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
/// - Fails with `MissingArtifact` if the file does not exist
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
	let path = filename.as_ref();
	if !path.is_file() {
		return Err(Error::MissingArtifact(path.to_path_buf()));
	}
	let mut contents = String::new();
	File::open(path)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/hamlet.dat` + `"vocab"` → `data/hamlet.vocab`
pub(crate) fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Loads a postcard artifact.
pub(crate) fn load_binary<T, P>(path: P) -> Result<T>
where
	T: serde::de::DeserializeOwned,
	P: AsRef<Path>,
{
	let bytes = std::fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}

/// Serializes `value` with postcard and writes it to `path`.
pub(crate) fn save_binary<T, P>(value: &T, path: P) -> Result<()>
where
	T: serde::Serialize,
	P: AsRef<Path>,
{
	let bytes = postcard::to_stdvec(value)?;
	std::fs::write(path, bytes)?;
	Ok(())
}

/// Normalize a corpus path.
///
/// - A path relative to `"."` is resolved against the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_path(input: &str) -> PathBuf {
	match input.strip_prefix("./") {
		Some(rest) => env::current_dir()
			.map(|dir| dir.join(rest))
			.unwrap_or_else(|_| PathBuf::from(input)),
		None => PathBuf::from(input),
	}
}
