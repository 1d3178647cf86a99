//! Filesystem tools: reading, listing, searching, and summarizing files.
//!
//! Every operation resolves relative paths against the scanner root and
//! produces human-readable text for the model. Output is bounded: file
//! reads by `max_file_chars` and batch size, listings and search results
//! by `max_output_chars`, the code file list by `max_listed_code_files`.

use crate::agent::error::ToolError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Source-file extensions recognized by `analyze_directory`.
pub const CODE_EXTENSIONS: &[&str] = &[
    ".go", ".js", ".ts", ".jsx", ".tsx", ".py", ".java", ".c", ".cpp", ".h", ".rs", ".php", ".rb",
    ".swift", ".kt",
];

/// Output limits for the filesystem tools.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Characters kept from a single file before truncating.
    pub max_file_chars: usize,
    /// Files processed by one `read_multiple_files` call.
    pub max_batch_files: usize,
    /// Code files listed by `analyze_directory`.
    pub max_listed_code_files: usize,
    /// Characters kept from `list_files` and `search_in_files` output.
    pub max_output_chars: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_chars: 10_000,
            max_batch_files: 10,
            max_listed_code_files: 50,
            max_output_chars: 20_000,
        }
    }
}

impl From<&crate::config::ToolsConfig> for ScanConfig {
    fn from(config: &crate::config::ToolsConfig) -> Self {
        Self {
            max_file_chars: config.max_file_chars,
            max_batch_files: config.max_batch_files,
            max_listed_code_files: config.max_listed_code_files,
            max_output_chars: config.max_output_chars,
        }
    }
}

/// Filesystem access for the review tools.
#[derive(Debug, Clone)]
pub struct FileScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl FileScanner {
    /// Create a scanner resolving relative paths against `root`.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read one file, tolerating a root one or two levels below the project.
    ///
    /// Candidates are tried in order: the path as given, `../path`, then
    /// `../../path`. The first readable candidate wins.
    pub fn read_file(&self, file_path: &str) -> Result<String, ToolError> {
        if file_path.is_empty() {
            return Err(ToolError::InvalidInput("file_path is required".to_string()));
        }

        let requested = Path::new(file_path);
        let candidates = vec![
            requested.to_path_buf(),
            Path::new("..").join(requested),
            Path::new("../..").join(requested),
        ];

        let mut last_err = None;
        for candidate in &candidates {
            match fs::read(self.root.join(candidate)) {
                Ok(bytes) => {
                    debug!("Read {} via {}", file_path, candidate.display());
                    let content = String::from_utf8_lossy(&bytes);
                    let body = match truncate_chars(&content, self.config.max_file_chars) {
                        Some(head) => format!(
                            "{}\n... (file truncated at {} characters)",
                            head, self.config.max_file_chars
                        ),
                        None => content.into_owned(),
                    };
                    return Ok(format!("=== {} ===\n{}", file_path, body));
                }
                Err(e) => last_err = Some(e),
            }
        }

        let absolute = fs::canonicalize(&self.root)
            .unwrap_or_else(|_| self.root.clone())
            .join(requested);

        Err(ToolError::ReadFailed {
            requested: file_path.to_string(),
            attempted: candidates,
            absolute,
            source: last_err.unwrap_or_else(|| std::io::ErrorKind::NotFound.into()),
        })
    }

    /// Read a batch of files. Per-file failures are reported inline.
    pub fn read_multiple_files(&self, file_paths: &[String]) -> String {
        let mut result = format!("Reading {} files:\n\n", file_paths.len());

        for (i, file_path) in file_paths.iter().enumerate() {
            if i >= self.config.max_batch_files {
                result.push_str(&format!(
                    "\n... (more than {} files, truncated)",
                    self.config.max_batch_files
                ));
                break;
            }

            match self.read_file(file_path) {
                Ok(content) => {
                    result.push_str(&content);
                    result.push_str("\n\n");
                }
                Err(e) => {
                    result.push_str(&format!("\n[error] {}: {}\n", file_path, e));
                }
            }
        }

        result
    }

    /// List files in `directory` whose names match the glob `pattern`.
    pub fn list_files(
        &self,
        directory: &str,
        pattern: &str,
        recursive: bool,
    ) -> Result<String, ToolError> {
        let dir = self.root.join(directory);

        let matches: Vec<PathBuf> = if recursive {
            let matcher = glob::Pattern::new(pattern)?;
            let mut found = Vec::new();
            for entry in WalkDir::new(&dir).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    continue;
                }
                if matcher.matches(&entry.file_name().to_string_lossy()) {
                    found.push(entry.into_path());
                }
            }
            found
        } else {
            let full_pattern = dir.join(pattern);
            glob::glob(&full_pattern.to_string_lossy())?
                .filter_map(Result::ok)
                .collect()
        };

        let mut lines = Vec::new();
        for path in &matches {
            let Ok(metadata) = fs::metadata(path) else {
                continue;
            };
            if metadata.is_dir() {
                continue;
            }
            lines.push(format!("- {} ({} bytes)", self.display(path), metadata.len()));
        }

        if lines.is_empty() {
            return Ok("No matching files found".to_string());
        }

        let listing = format!("Found {} files:\n{}\n", lines.len(), lines.join("\n"));
        Ok(self.bound_output(listing))
    }

    /// Report every line containing the literal `pattern`, grouped by file.
    pub fn search_in_files(
        &self,
        directory: &str,
        pattern: &str,
        file_extension: &str,
    ) -> Result<String, ToolError> {
        if pattern.is_empty() {
            return Err(ToolError::InvalidInput("pattern is required".to_string()));
        }

        let wanted_ext = normalize_extension(file_extension);
        let mut result = format!("Searching '{}' in {}:\n\n", pattern, directory);
        let mut match_count = 0;

        for entry in WalkDir::new(self.root.join(directory)).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }
            if let Some(ref ext) = wanted_ext {
                if extension_of(entry.path()) != *ext {
                    continue;
                }
            }

            let Ok(bytes) = fs::read(entry.path()) else {
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);
            if !content.contains(pattern) {
                continue;
            }

            match_count += 1;
            result.push_str(&format!("{}\n", self.display(entry.path())));
            for (line_num, line) in content.lines().enumerate() {
                if line.contains(pattern) {
                    result.push_str(&format!("  L{}: {}\n", line_num + 1, line));
                }
            }
            result.push('\n');
        }

        if match_count == 0 {
            return Ok("No matches found".to_string());
        }

        Ok(self.bound_output(result))
    }

    /// Summarize a directory: totals, extension breakdown, and code files.
    pub fn analyze_directory(&self, directory: &str) -> Result<String, ToolError> {
        let mut file_count = 0usize;
        let mut total_size = 0u64;
        let mut by_extension: BTreeMap<String, usize> = BTreeMap::new();
        let mut code_files = Vec::new();

        for entry in WalkDir::new(self.root.join(directory)).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }

            file_count += 1;
            total_size += entry.metadata()?.len();

            let ext = extension_of(entry.path());
            if is_code_file(&ext) {
                code_files.push(self.display(entry.path()));
            }
            *by_extension.entry(ext).or_default() += 1;
        }

        let mut result = format!("Directory analysis: {}\n\n", directory);
        result.push_str("Statistics:\n");
        result.push_str(&format!("- Total files: {}\n", file_count));
        result.push_str(&format!("- Total size: {} bytes\n", total_size));

        result.push_str("\nFiles by extension:\n");
        for (ext, count) in &by_extension {
            let label = if ext.is_empty() { "(no extension)" } else { ext.as_str() };
            result.push_str(&format!("- {}: {}\n", label, count));
        }

        result.push_str(&format!("\nCode files ({}):\n", code_files.len()));
        for (i, file) in code_files.iter().enumerate() {
            if i >= self.config.max_listed_code_files {
                result.push_str(&format!(
                    "... (more than {}, truncated)\n",
                    self.config.max_listed_code_files
                ));
                break;
            }
            result.push_str(&format!("- {}\n", file));
        }

        Ok(result)
    }

    fn bound_output(&self, output: String) -> String {
        match truncate_chars(&output, self.config.max_output_chars) {
            Some(head) => format!(
                "{}\n... (output truncated at {} characters)",
                head, self.config.max_output_chars
            ),
            None => output,
        }
    }

    /// Path as shown to the model, relative to the root when possible.
    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Whether `ext` (with its leading dot) names a recognized source language.
pub fn is_code_file(ext: &str) -> bool {
    CODE_EXTENSIONS.contains(&ext)
}

/// Extension including the leading dot, or empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

fn normalize_extension(ext: &str) -> Option<String> {
    match ext.trim() {
        "" => None,
        e if e.starts_with('.') => Some(e.to_string()),
        e => Some(format!(".{}", e)),
    }
}

/// Prefix of `s` holding at most `max` characters, or `None` if `s` already fits.
pub fn truncate_chars(s: &str, max: usize) -> Option<&str> {
    s.char_indices().nth(max).map(|(idx, _)| &s[..idx])
}
