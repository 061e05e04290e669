//! Source files as the transpiler sees them, plus offset → line/column mapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One input file. `module_path` is where the rewritten file lands relative to
/// the deployment root, and is what handler strings are built from.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub module_path: String,
    pub text: String,
    lines: LineIndex,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, module_path: impl Into<String>, text: String) -> Self {
        let lines = LineIndex::new(&text);
        Self {
            path: path.into(),
            module_path: module_path.into(),
            text,
            lines,
        }
    }

    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }

    pub fn location(&self, offset: u32) -> SourceLocation {
        self.lines.location(&self.text, offset)
    }

    /// Handler string for a function exported from this file: `dir/file.name`.
    pub fn handler_for(&self, function_name: &str) -> String {
        let module = Path::new(&self.module_path).with_extension("");
        format!(
            "{}.{}",
            module.to_string_lossy().replace('\\', "/"),
            function_name
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// Byte offsets of every line start.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i as u32 + 1);
            }
        }
        Self { starts }
    }

    /// 1-based line and column for the byte `offset` into `text`. Columns
    /// count characters, like the caret lines in directive errors.
    pub fn location(&self, text: &str, offset: u32) -> SourceLocation {
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let start = self.starts[line];
        let column = match text.get(start as usize..offset as usize) {
            Some(prefix) => prefix.chars().count() as u32,
            None => offset - start,
        };
        SourceLocation {
            line: line as u32 + 1,
            column: column + 1,
        }
    }
}

/// A non-fatal front-end problem (syntax errors unrelated to directives).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub file: String,
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{} ({},{}): {}",
                self.file, loc.line, loc.column, self.message
            ),
            None => write!(f, "{}", self.message),
        }
    }
}
