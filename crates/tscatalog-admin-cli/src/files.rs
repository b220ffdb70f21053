//! Catalog file collection.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Collect `.ts` files from the given paths.
///
/// Files are taken as given, whatever their extension; directories are
/// searched recursively for `.ts` files, skipping `.git/`. The result is
/// sorted and free of duplicates.
///
/// # Errors
///
/// Returns an error if a path does not exist.
pub(crate) fn collect_catalog_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
	let mut files = Vec::new();

	for path in paths {
		if path.is_file() {
			files.push(path.clone());
		} else if path.is_dir() {
			for entry in WalkDir::new(path)
				.follow_links(true)
				.into_iter()
				.filter_map(|e| e.ok())
			{
				let entry_path = entry.path();
				if entry_path.is_file()
					&& is_catalog(entry_path)
					&& !entry_path.components().any(|c| c.as_os_str() == ".git")
				{
					files.push(entry_path.to_path_buf());
				}
			}
		} else {
			return Err(format!("Path does not exist: {}", path.display()));
		}
	}

	files.sort();
	files.dedup();
	Ok(files)
}

fn is_catalog(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext == "ts")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::fs;

	#[rstest]
	fn test_collect_nonexistent() {
		let result = collect_catalog_files(&[PathBuf::from("/nonexistent/languages")]);

		assert!(result.unwrap_err().contains("does not exist"));
	}

	#[rstest]
	fn test_collect_directory_recursively() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir_all(dir.path().join("extra/.git")).unwrap();
		fs::write(dir.path().join("da.ts"), "").unwrap();
		fs::write(dir.path().join("extra/nl.ts"), "").unwrap();
		fs::write(dir.path().join("extra/.git/fr.ts"), "").unwrap();
		fs::write(dir.path().join("README.md"), "").unwrap();

		// Act
		let files = collect_catalog_files(&[dir.path().to_path_buf()]).unwrap();

		// Assert
		assert_eq!(
			files,
			vec![dir.path().join("da.ts"), dir.path().join("extra/nl.ts")]
		);
	}

	#[rstest]
	fn test_collect_explicit_file_and_duplicates() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("catalog.xml");
		fs::write(&file, "").unwrap();

		// Act
		let files = collect_catalog_files(&[file.clone(), file.clone()]).unwrap();

		// Assert
		assert_eq!(files, vec![file]);
	}
}
