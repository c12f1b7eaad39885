use std::{fs, io, path::Path};

/// Reads `path` and returns its lines with trailing whitespace removed.
///
/// # Errors
/// Returns [`io::Error`] when the file cannot be opened or is not valid UTF-8.
pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(|line| line.trim_end().to_owned())
        .collect())
}
