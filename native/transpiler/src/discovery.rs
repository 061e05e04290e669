//! Input discovery.
//!
//! Recursively scans input directories for script sources. Each file carries
//! the path it will have under the output directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::TranspileError;

pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Path relative to the input root it was found under.
    pub relative: PathBuf,
}

/// Expands `inputs` into source files, directories walked in file-name order.
/// A file reachable through two inputs is kept once, at its first position.
pub fn discover_sources(inputs: &[PathBuf]) -> Result<Vec<InputFile>, TranspileError> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("skipping unreadable entry under {}: {}", input.display(), e);
                        continue;
                    }
                };
                let path = entry.path();
                if !path.is_file() || !is_source_file(path) {
                    continue;
                }
                let relative = path.strip_prefix(input).unwrap_or(path).to_path_buf();
                push_unique(&mut files, &mut seen, path.to_path_buf(), relative);
            }
        } else if input.is_file() {
            let relative = input
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| input.clone());
            push_unique(&mut files, &mut seen, input.clone(), relative);
        } else {
            return Err(TranspileError::io(
                "read",
                input,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            ));
        }
    }

    log::info!("discovered {} source file(s)", files.len());
    Ok(files)
}

pub fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn push_unique(files: &mut Vec<InputFile>, seen: &mut HashSet<PathBuf>, path: PathBuf, relative: PathBuf) {
    let key = path.canonicalize().unwrap_or_else(|_| path.clone());
    if seen.insert(key) {
        files.push(InputFile { path, relative });
    } else {
        log::debug!("{} already queued", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_source_file_filter() {
        assert!(is_source_file(Path::new("src/users.ts")));
        assert!(is_source_file(Path::new("src/app.mjs")));
        assert!(!is_source_file(Path::new("src/types.d.ts")));
        assert!(!is_source_file(Path::new("serverless.yml")));
        assert!(!is_source_file(Path::new("Makefile")));
    }

    #[test]
    fn test_walks_in_name_order_and_dedupes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("src");
        fs::create_dir_all(root.join("jobs")).expect("mkdir");
        fs::write(root.join("users.ts"), "").expect("write");
        fs::write(root.join("api.ts"), "").expect("write");
        fs::write(root.join("jobs/cleanup.ts"), "").expect("write");
        fs::write(root.join("types.d.ts"), "").expect("write");
        fs::write(root.join("notes.md"), "").expect("write");

        let found = discover_sources(&[root.clone(), root.join("users.ts")]).expect("discover");
        let relative: Vec<String> = found
            .iter()
            .map(|f| f.relative.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["api.ts", "jobs/cleanup.ts", "users.ts"]);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = discover_sources(&[dir.path().join("nope")]);
        assert!(matches!(result, Err(TranspileError::Io { .. })));
    }
}
