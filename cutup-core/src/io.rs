use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Prefix of exported history files.
const EXPORT_PREFIX: &str = "cutup-history";

/// Builds the name of a history export file for a given day.
///
/// Example:
/// `2024-03-09` → `cutup-history-2024-03-09.json`
pub(crate) fn export_filename(date: NaiveDate) -> String {
	format!("{}-{}.json", EXPORT_PREFIX, date.format("%Y-%m-%d"))
}

/// Creates the parent folder of `path` when it has one.
fn ensure_parent<P: AsRef<Path>>(path: P) -> io::Result<()> {
	match path.as_ref().parent() {
		Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
		_ => Ok(()),
	}
}

/// Serializes `value` with `postcard` and writes it to `path`.
///
/// Missing parent folders are created.
pub(crate) fn write_binary<T, P>(path: P, value: &T) -> Result<(), Box<dyn std::error::Error>>
where
	T: Serialize,
	P: AsRef<Path>,
{
	ensure_parent(&path)?;
	let bytes = postcard::to_stdvec(value)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Reads a `postcard` file written by [`write_binary`].
///
/// # Returns
/// - `Ok(None)` if the file does not exist
/// - `Ok(Some(value))` if it was decoded
/// - `Err(...)` on I/O or decoding failure
pub(crate) fn read_binary<T, P>(path: P) -> Result<Option<T>, Box<dyn std::error::Error>>
where
	T: DeserializeOwned,
	P: AsRef<Path>,
{
	let path = path.as_ref();
	if !path.exists() {
		return Ok(None);
	}
	let bytes = fs::read(path)?;
	Ok(Some(postcard::from_bytes(&bytes)?))
}

/// Writes `contents` to `file_name` inside `folder` and returns the full path.
pub(crate) fn write_text_in<P: AsRef<Path>>(folder: P, file_name: &str, contents: &str) -> io::Result<PathBuf> {
	let folder = folder.as_ref();
	fs::create_dir_all(folder)?;
	let path = folder.join(file_name);
	fs::write(&path, contents)?;
	Ok(path)
}
