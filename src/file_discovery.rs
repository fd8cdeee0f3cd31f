use crate::error::{Result, ValidationError};
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

/// Glob used to find schema files
pub const SCHEMA_PATTERN: &str = "*.xsd";

/// Glob used to find documents to validate
pub const DOCUMENT_PATTERN: &str = "*.xml";

/// Shallow file discovery: lists the files directly inside one directory
/// whose name matches a glob pattern
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    pattern: String,
    matcher: GlobMatcher,
}

impl FileDiscovery {
    /// Create a discovery for a file name pattern such as `*.xml`
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| ValidationError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// Discovery of `*.xsd` files
    pub fn schemas() -> Result<Self> {
        Self::new(SCHEMA_PATTERN)
    }

    /// Discovery of `*.xml` files
    pub fn documents() -> Result<Self> {
        Self::new(DOCUMENT_PATTERN)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// List matching regular files directly inside `dir`, sorted by file name.
    ///
    /// Subdirectories are not descended into. Symlinks are followed, so a
    /// link to a matching file is included.
    pub fn discover_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let traversal_error = |e: std::io::Error| ValidationError::FileSystemTraversal {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(traversal_error)? {
            let entry_path = entry.map_err(traversal_error)?.path();

            if !self.should_process(&entry_path) {
                continue;
            }

            // A broken symlink has no metadata; it is not a file to validate.
            match fs::metadata(&entry_path) {
                Ok(metadata) if metadata.is_file() => files.push(entry_path),
                _ => continue,
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Check whether a path's file name matches the pattern
    pub fn should_process(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.matcher.is_match(Path::new(name)))
            .unwrap_or(false)
    }
}
