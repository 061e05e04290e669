use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_DIRECTIVE_SYNTAX: &str = "H-ERR-DIRECTIVE-SYNTAX";
pub const ERR_DIRECTIVE_ARGUMENT: &str = "H-ERR-DIRECTIVE-ARGUMENT";
pub const ERR_DIRECTIVE_TARGET: &str = "H-ERR-DIRECTIVE-TARGET";

fn get_hint(code: &str) -> &'static str {
    match code {
        ERR_DIRECTIVE_SYNTAX => {
            "Directives are written as $Name or $Name(arg, ...) where each argument is a quoted string, a number or an identifier."
        }
        ERR_DIRECTIVE_ARGUMENT => {
            "Usage: $HttpApi(\"/path\"[, METHOD]), $Scheduled(\"rate(5 minutes)\"), $Fixed, $TrackMetrics, $Ignored."
        }
        ERR_DIRECTIVE_TARGET => {
            "$Fixed, $HttpApi, $Scheduled and $TrackMetrics apply to exported, non-generator functions only."
        }
        _ => "Unknown directive error.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTIVE ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Fatal, source-located problem with a recognized directive.
///
/// Carries everything needed to print the caret report; the caller decides
/// whether to abort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveError {
    pub code: String,
    pub message: String,
    pub file: String,
    pub function: String,
    /// Line and column of the offending span.
    pub line: u32,
    pub column: u32,
    /// The logical directive line as written (gutter stripped).
    pub directive_text: String,
    /// Caret placement inside `directive_text`, in characters.
    pub marker_start: usize,
    pub marker_len: usize,
    pub declaration_line: u32,
}

impl DirectiveError {
    pub fn hint(&self) -> &'static str {
        get_hint(&self.code)
    }
}

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error[{}]: {}", self.code, self.message)?;
        writeln!(f, " --> {}:{}:{}", self.file, self.line, self.column)?;
        writeln!(f, "  |")?;
        writeln!(f, "  | {}", self.directive_text)?;
        writeln!(
            f,
            "  | {}{}",
            " ".repeat(self.marker_start),
            "^".repeat(self.marker_len.max(1))
        )?;
        writeln!(f, "  |")?;
        writeln!(f, "  = help: {}", self.hint())?;
        writeln!(f, "in function '{}' defined here:", self.function)?;
        write!(f, "--> {}:{}", self.file, self.declaration_line)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSPILE ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum TranspileError {
    #[error(transparent)]
    Directive(#[from] DirectiveError),

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("deployment descriptor not found at {}\n{help}", path.display())]
    MissingDescriptor { path: PathBuf, help: String },

    #[error("deployment descriptor {}: {source}", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid deployment descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("internal template failed to parse: {0}")]
    Template(String),
}

impl TranspileError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_points_at_span() {
        let err = DirectiveError {
            code: ERR_DIRECTIVE_ARGUMENT.to_string(),
            message: "Missing path argument".to_string(),
            file: "src/users.ts".to_string(),
            function: "createUser".to_string(),
            line: 2,
            column: 12,
            directive_text: "$HttpApi()".to_string(),
            marker_start: 8,
            marker_len: 2,
            declaration_line: 4,
        };
        let rendered = err.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "error[H-ERR-DIRECTIVE-ARGUMENT]: Missing path argument");
        assert_eq!(lines[1], " --> src/users.ts:2:12");
        assert_eq!(lines[3], "  | $HttpApi()");
        assert_eq!(lines[4], "  |         ^^");
        assert_eq!(lines[7], "in function 'createUser' defined here:");
        assert_eq!(lines[8], "--> src/users.ts:4");
    }
}
