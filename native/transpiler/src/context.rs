use indexmap::IndexSet;
use oxc_allocator::Allocator;
use oxc_ast::AstBuilder;

use crate::registry::{FunctionRegistry, RegistryEntry, TriggerDescriptor};
use crate::scope::LocalBindings;
use crate::source::SourceFile;

/// Per-file state threaded through every transform.
///
/// Registrations made while folding one declaration are staged and only reach
/// the run-wide registry through [`TransformContext::commit`].
pub struct TransformContext<'r, 'a> {
    pub ast: AstBuilder<'a>,
    pub source: &'r SourceFile,
    pub locals: LocalBindings,
    imports: IndexSet<String>,
    registry: &'r mut FunctionRegistry,
    current: Option<String>,
    export: Option<String>,
    staged: Option<TriggerDescriptor>,
}

impl<'r, 'a> TransformContext<'r, 'a> {
    pub fn new(allocator: &'a Allocator, source: &'r SourceFile, registry: &'r mut FunctionRegistry) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            source,
            locals: LocalBindings::default(),
            imports: IndexSet::new(),
            registry,
            current: None,
            export: None,
            staged: None,
        }
    }

    pub fn record_import(&mut self, module: impl Into<String>) {
        self.imports.insert(module.into());
    }

    pub fn into_imports(self) -> IndexSet<String> {
        self.imports
    }

    /// Starts a declaration. `export_name` is what the module exports it as,
    /// which differs from `function_name` for default exports.
    pub fn begin(&mut self, function_name: &str, export_name: &str) {
        self.current = Some(function_name.to_string());
        self.export = Some(export_name.to_string());
        self.staged = None;
    }

    pub fn current_function(&self) -> &str {
        self.current.as_deref().unwrap_or_default()
    }

    /// Stages a plain handler unless a trigger is already staged.
    pub fn stage_handler(&mut self) {
        if self.staged.is_none() {
            self.staged = Some(TriggerDescriptor::Handler);
        }
    }

    pub fn stage_trigger(&mut self, trigger: TriggerDescriptor) {
        self.staged = Some(trigger);
    }

    pub fn commit(&mut self) -> Option<&RegistryEntry> {
        let name = self.current.take()?;
        let export = self.export.take().unwrap_or_else(|| name.clone());
        let trigger = self.staged.take()?;
        let entry = RegistryEntry {
            handler: self.source.handler_for(&export),
            source: self.source.display_path(),
            function_name: name.clone(),
            trigger,
        };
        log::debug!("registered {} -> {}", name, entry.handler);
        self.registry.register(entry);
        self.registry.get(&name)
    }

    pub fn discard(&mut self) {
        if let (Some(name), Some(_)) = (&self.current, &self.staged) {
            log::debug!("dropping staged registration for ignored '{}'", name);
        }
        self.current = None;
        self.export = None;
        self.staged = None;
    }
}
