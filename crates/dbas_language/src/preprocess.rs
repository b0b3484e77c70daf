//! Textual `INCLUDE` preprocessing.
//!
//! The preprocessor runs before the lexer ever sees a byte. Starting from a
//! root file, each line matching the `INCLUDE "path"` directive
//! (case-insensitive, optional trailing `'` comment) is replaced by the
//! recursively-processed contents of the named file; every other line passes
//! through verbatim. Include paths resolve relative to the directory of the
//! file containing the directive.
//!
//! Boundaries are marked with sentinel comment lines so the spliced output
//! stays debuggable:
//!
//! ```text
//! ' ===== include: util.dbas =====
//! ...contents of util.dbas...
//! ' ===== end include: util.dbas =====
//! ```
//!
//! A [`LineMap`] records, for every produced line, the original file and
//! 1-based line it came from; diagnostics in later phases are mapped back
//! through it.
//!
//! Each file is read fully into memory and its handle closed before
//! recursion proceeds. A canonical-path visited set rejects any revisit as a
//! circular include, and recursion depth is capped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::diagnostic::{Diagnostic, Phase};

/// Maximum include nesting before the preprocessor refuses to recurse.
pub const MAX_INCLUDE_DEPTH: usize = 100;

/// Why preprocessing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    FileNotFound {
        path: PathBuf,
        included_from: Option<PathBuf>,
    },
    ReadError {
        path: PathBuf,
        detail: String,
    },
    Cycle {
        path: PathBuf,
        included_from: PathBuf,
    },
    DepthExceeded {
        path: PathBuf,
    },
}

impl PreprocessError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = match self {
            PreprocessError::FileNotFound { path, included_from } => match included_from {
                Some(from) => format!(
                    "include file not found: {} (included from {})",
                    path.display(),
                    from.display()
                ),
                None => format!("file not found: {}", path.display()),
            },
            PreprocessError::ReadError { path, detail } => {
                format!("cannot read {}: {}", path.display(), detail)
            }
            PreprocessError::Cycle { path, included_from } => format!(
                "circular include: {} already included (included again from {})",
                path.display(),
                included_from.display()
            ),
            PreprocessError::DepthExceeded { path } => format!(
                "include depth exceeds {} at {}",
                MAX_INCLUDE_DEPTH,
                path.display()
            ),
        };
        Diagnostic::error(Phase::Preprocess, message)
    }
}

/// Maps produced lines back to their originating file and line.
#[derive(Debug, Default)]
pub struct LineMap {
    files: Vec<PathBuf>,
    /// One entry per produced line: (file index, 1-based original line).
    entries: Vec<(usize, u32)>,
}

impl LineMap {
    fn file_index(&mut self, path: &Path) -> usize {
        if let Some(idx) = self.files.iter().position(|f| f == path) {
            return idx;
        }
        self.files.push(path.to_path_buf());
        self.files.len() - 1
    }

    fn push(&mut self, file: usize, line: u32) {
        self.entries.push((file, line));
    }

    /// Resolves a produced 1-based line to `(original file, original line)`.
    pub fn resolve(&self, produced_line: u32) -> Option<(&Path, u32)> {
        if produced_line == 0 {
            return None;
        }
        let (file, line) = *self.entries.get(produced_line as usize - 1)?;
        Some((&self.files[file], line))
    }

    /// File name (not full path) for a produced line, for diagnostics.
    pub fn file_name(&self, produced_line: u32) -> Option<String> {
        let (path, _) = self.resolve(produced_line)?;
        Some(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        )
    }

    /// Number of produced lines recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Preprocessed text plus its line map.
#[derive(Debug)]
pub struct PreprocessedSource {
    pub text: String,
    pub map: LineMap,
}

/// Recursive include expansion from a root file.
pub struct Preprocessor {
    visited: HashSet<PathBuf>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Preprocessor {
            visited: HashSet::new(),
        }
    }

    /// Expands `root` and every transitive include into one text.
    pub fn process(&mut self, root: &Path) -> Result<PreprocessedSource, PreprocessError> {
        let mut out = String::new();
        let mut map = LineMap::default();
        self.process_file(root, None, 0, &mut out, &mut map)?;
        Ok(PreprocessedSource { text: out, map })
    }

    fn process_file(
        &mut self,
        path: &Path,
        included_from: Option<&Path>,
        depth: usize,
        out: &mut String,
        map: &mut LineMap,
    ) -> Result<(), PreprocessError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(PreprocessError::DepthExceeded {
                path: path.to_path_buf(),
            });
        }

        let canonical = path.canonicalize().map_err(|_| PreprocessError::FileNotFound {
            path: path.to_path_buf(),
            included_from: included_from.map(Path::to_path_buf),
        })?;
        if !self.visited.insert(canonical.clone()) {
            return Err(PreprocessError::Cycle {
                path: path.to_path_buf(),
                included_from: included_from
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| path.to_path_buf()),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| PreprocessError::ReadError {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let file_idx = map.file_index(path);

        for (idx, line) in contents.lines().enumerate() {
            let line_no = idx as u32 + 1;
            match parse_include_directive(line) {
                Some(include_path) => {
                    let resolved = if Path::new(&include_path).is_absolute() {
                        PathBuf::from(&include_path)
                    } else {
                        dir.join(&include_path)
                    };
                    push_line(
                        out,
                        map,
                        file_idx,
                        line_no,
                        &format!("' ===== include: {} =====", include_path),
                    );
                    self.process_file(&resolved, Some(path), depth + 1, out, map)?;
                    push_line(
                        out,
                        map,
                        file_idx,
                        line_no,
                        &format!("' ===== end include: {} =====", include_path),
                    );
                }
                None => push_line(out, map, file_idx, line_no, line),
            }
        }
        Ok(())
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn push_line(out: &mut String, map: &mut LineMap, file: usize, line: u32, text: &str) {
    out.push_str(text);
    out.push('\n');
    map.push(file, line);
}

/// Parses `INCLUDE "path"` with an optional trailing comment.
///
/// Returns the include path, or `None` when the line is not a directive.
fn parse_include_directive(line: &str) -> Option<String> {
    let trimmed = line.trim();
    match trimmed.get(..7) {
        Some(head) if head.eq_ignore_ascii_case("include") => {}
        _ => return None,
    }
    let rest = trimmed[7..].trim_start();
    let mut chars = rest.chars();
    if chars.next() != Some('"') {
        return None;
    }
    let rest = &rest[1..];
    let close = rest.find('"')?;
    let path = &rest[..close];
    let tail = rest[close + 1..].trim();
    if !tail.is_empty() && !tail.starts_with('\'') {
        return None;
    }
    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_not_directives() {
        assert_eq!(parse_include_directive("PRINT \"hi\""), None);
        assert_eq!(parse_include_directive("DIM include AS INTEGER"), None);
    }

    #[test]
    fn directive_is_case_insensitive() {
        assert_eq!(
            parse_include_directive("include \"util.dbas\""),
            Some("util.dbas".to_string())
        );
        assert_eq!(
            parse_include_directive("  INCLUDE \"util.dbas\"  "),
            Some("util.dbas".to_string())
        );
    }

    #[test]
    fn directive_allows_trailing_comment() {
        assert_eq!(
            parse_include_directive("INCLUDE \"util.dbas\" ' helpers"),
            Some("util.dbas".to_string())
        );
    }

    #[test]
    fn directive_rejects_trailing_code() {
        assert_eq!(parse_include_directive("INCLUDE \"a\" PRINT 1"), None);
    }

    #[test]
    fn unquoted_include_is_not_a_directive() {
        assert_eq!(parse_include_directive("INCLUDE util.dbas"), None);
    }

    #[test]
    fn missing_root_reports_file_not_found() {
        let mut pre = Preprocessor::new();
        let err = pre.process(Path::new("/nonexistent/root.dbas")).unwrap_err();
        assert!(matches!(err, PreprocessError::FileNotFound { .. }));
    }

    #[test]
    fn line_map_resolves_out_of_range_to_none() {
        let map = LineMap::default();
        assert!(map.resolve(1).is_none());
        assert!(map.resolve(0).is_none());
    }
}
