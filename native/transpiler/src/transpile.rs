//! Per-file transpilation and the whole-run driver.

use indexmap::IndexSet;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::TransformContext;
use crate::descriptor;
use crate::discovery::discover_sources;
use crate::dispatch::transform_program;
use crate::emit;
use crate::error::TranspileError;
use crate::registry::FunctionRegistry;
use crate::source::{Diagnostic, SourceFile};

pub const DEFAULT_OUT_DIR: &str = "output";
pub const DEFAULT_DESCRIPTOR: &str = "input/serverless.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspileOptions {
    pub inputs: Vec<PathBuf>,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_descriptor")]
    pub descriptor: PathBuf,
    /// Where the merged descriptor goes. `None` leaves it to the caller.
    #[serde(default)]
    pub write_descriptor: Option<PathBuf>,
    /// Transform and merge without writing anything.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUT_DIR)
}

fn default_descriptor() -> PathBuf {
    PathBuf::from(DEFAULT_DESCRIPTOR)
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            out_dir: default_out_dir(),
            descriptor: default_descriptor(),
            write_descriptor: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranspiledFile {
    /// `None` when the front end could not recover; the file is skipped.
    pub code: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub imports: IndexSet<String>,
}

/// Parses, transforms and prints one file. Registrations go to `registry`.
pub fn transpile_source(source: &SourceFile, registry: &mut FunctionRegistry) -> Result<TranspiledFile, TranspileError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(&source.path).unwrap_or_else(|_| {
        SourceType::default()
            .with_typescript(true)
            .with_module(true)
    });

    let ret = Parser::new(&allocator, &source.text, source_type).parse();
    let diagnostics: Vec<Diagnostic> = ret
        .errors
        .iter()
        .map(|error| {
            let location = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| source.location(label.offset() as u32));
            Diagnostic {
                file: source.display_path(),
                location,
                message: error.message.to_string(),
            }
        })
        .collect();

    if ret.panicked {
        log::warn!("{}: unrecoverable syntax errors, skipping", source.display_path());
        return Ok(TranspiledFile {
            code: None,
            diagnostics,
            imports: IndexSet::new(),
        });
    }

    let mut program = ret.program;
    let mut ctx = TransformContext::new(&allocator, source, registry);
    transform_program(&mut program, &mut ctx)?;
    let imports = ctx.into_imports();

    Ok(TranspiledFile {
        code: Some(emit::print(&program)),
        diagnostics,
        imports,
    })
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub source: PathBuf,
    /// Written (or, on a dry run, would-be) output path. `None` if skipped.
    pub output: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub imports: IndexSet<String>,
}

#[derive(Debug)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub registry: FunctionRegistry,
    /// The merged descriptor document, printed.
    pub descriptor: String,
}

/// Runs every input through the pipeline in discovery order, then merges the
/// registry into the descriptor. The first fatal error stops the run; outputs
/// of files already finished stay on disk.
pub fn run(
    options: &TranspileOptions,
    mut on_diagnostic: impl FnMut(&Diagnostic),
) -> Result<RunReport, TranspileError> {
    let descriptor_doc = descriptor::load(&options.descriptor)?;
    let inputs = discover_sources(&options.inputs)?;

    let mut registry = FunctionRegistry::new();
    let mut files = Vec::with_capacity(inputs.len());

    for input in inputs {
        let text = fs::read_to_string(&input.path).map_err(|e| TranspileError::io("read", &input.path, e))?;
        let output_path = options.out_dir.join(&input.relative);
        let source = SourceFile::new(&input.path, module_path(&output_path), text);

        log::info!("transpiling {}", source.display_path());
        let transpiled = transpile_source(&source, &mut registry)?;
        for diagnostic in &transpiled.diagnostics {
            on_diagnostic(diagnostic);
        }

        let output = match &transpiled.code {
            Some(code) => {
                if !options.dry_run {
                    emit::write_output(&output_path, code)?;
                    log::info!("wrote {}", output_path.display());
                }
                Some(output_path)
            }
            None => None,
        };

        files.push(FileReport {
            source: input.path,
            output,
            diagnostics: transpiled.diagnostics,
            imports: transpiled.imports,
        });
    }

    let merged = descriptor::merge_into_descriptor(descriptor_doc, &registry)?;
    let printed = descriptor::to_string(&merged)?;
    if let Some(path) = &options.write_descriptor {
        if !options.dry_run {
            emit::write_output(path, &printed)?;
            log::info!("wrote deployment descriptor to {}", path.display());
        }
    }

    log::info!(
        "{} file(s), {} function(s) registered",
        files.len(),
        registry.len()
    );
    Ok(RunReport {
        files,
        registry,
        descriptor: printed,
    })
}

fn module_path(output: &Path) -> String {
    output.to_string_lossy().replace('\\', "/")
}
