//! Initial corpus loading from `--inputdir` (§4.8, §6).
//!
//! Every regular file directly under the directory becomes one seed,
//! tagged `Untouched` byte-for-byte, queued as `Normal` priority — the
//! engine has not yet run them, so it has no gain to classify them by.

use std::path::Path;

use concolic_core::{InputSource, Seed};
use walkdir::WalkDir;

use crate::error::{QueueError, Result};

/// Walks `dir` (non-recursively into subdirectories' files, but `WalkDir`
/// is depth-bounded to 1 so nested directories are not descended into)
/// and returns one [`Seed`] per regular file, sorted by file name so a
/// corpus directory always loads in a stable order.
pub fn load_initial_corpus(dir: &Path, source: InputSource) -> Result<Vec<Seed>> {
    let mut entries: Vec<_> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .collect();
    entries.sort_by_key(|entry| entry.file_name().to_os_string());

    let mut seeds = Vec::with_capacity(entries.len());
    for entry in entries {
        let bytes = std::fs::read(entry.path())
            .map_err(|source_err| QueueError::ReadInputDir { path: entry.path().to_path_buf(), source: source_err })?;
        seeds.push(Seed::from_bytes(source.clone(), &bytes));
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_one_seed_per_file_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b"), b"second").unwrap();
        std::fs::write(dir.path().join("a"), b"first").unwrap();
        let seeds = load_initial_corpus(dir.path(), InputSource::StdInput).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].concretize(), b"first");
        assert_eq!(seeds[1].concretize(), b"second");
    }

    #[test]
    fn nested_directories_are_not_descended_into() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c"), b"ignored").unwrap();
        std::fs::write(dir.path().join("top"), b"kept").unwrap();
        let seeds = load_initial_corpus(dir.path(), InputSource::StdInput).unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].concretize(), b"kept");
    }
}
