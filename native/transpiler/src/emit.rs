use oxc_ast::ast::Program;
use oxc_codegen::Codegen;
use std::fs;
use std::path::Path;

use crate::error::TranspileError;

pub fn print(program: &Program<'_>) -> String {
    Codegen::new().build(program).code
}

/// Writes `code` to `path`, creating parent directories as needed.
pub fn write_output(path: &Path, code: &str) -> Result<(), TranspileError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| TranspileError::io("create", parent, e))?;
        }
    }
    fs::write(path, code).map_err(|e| TranspileError::io("write", path, e))
}
