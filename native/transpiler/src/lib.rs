//! # Hati Transpiler
//!
//! Source-to-source rewriting of serverless handler modules driven by `$Name`
//! directives in documentation comments, plus the deployment descriptor
//! update that goes with it.
//!
//! ## Pipeline
//!
//! 1. **Front end**: parse with oxc, collect front-end diagnostics, build the
//!    symbol table of exported names and their documentation.
//! 2. **Scan**: split each documentation block into logical lines and keep
//!    the ones starting with `$`.
//! 3. **Parse**: turn each line into a typed [`Directive`]. Unknown names are
//!    inert; known names with bad arguments are fatal.
//! 4. **Dispatch**: fold a declaration's directives over it in source order.
//!    Directives compose as `dN(...d2(d1(decl)))`.
//! 5. **Emit**: print the rewritten file and merge the [`FunctionRegistry`]
//!    into the descriptor.
//!
//! ## Invariants
//!
//! - A file without directives prints unchanged.
//! - `$Ignored` removes the declaration and anything staged for it.
//! - `$HttpApi` and `$Scheduled` overwrite the staged trigger; `$Fixed` only
//!   stages a plain handler when nothing else is staged.
//! - The registry is run-wide and last write wins.
//! - The first fatal error ends the run with exit code 1.

mod annotation;
mod context;
mod descriptor;
mod discovery;
mod dispatch;
mod emit;
mod error;
mod function;
mod registry;
mod scan;
mod scope;
mod source;
mod symbols;
mod template;
mod transformers;
mod transpile;


pub use annotation::{
    parse_annotation, parse_directive, Annotation, AnnotationArg, ArgValue, Directive, DirectiveKind, DirectiveSite,
    HttpMethod,
};
pub use descriptor::{merge_into_descriptor, reference_descriptor};
pub use discovery::{discover_sources, InputFile, SOURCE_EXTENSIONS};
pub use error::{DirectiveError, TranspileError, ERR_DIRECTIVE_ARGUMENT, ERR_DIRECTIVE_SYNTAX, ERR_DIRECTIVE_TARGET};
pub use registry::{EventConfig, FunctionConfig, FunctionRegistry, HttpEventConfig, RegistryEntry, TriggerDescriptor};
pub use scan::{scan_directives, DirectiveLine};
pub use source::{Diagnostic, SourceFile, SourceLocation};
pub use symbols::DocComment;
pub use transpile::{
    run, transpile_source, FileReport, RunReport, TranspileOptions, TranspiledFile, DEFAULT_DESCRIPTOR,
    DEFAULT_OUT_DIR,
};

/// Loads and parses a deployment descriptor.
pub fn load_descriptor(path: &std::path::Path) -> Result<serde_yaml::Value, TranspileError> {
    descriptor::load(path)
}
