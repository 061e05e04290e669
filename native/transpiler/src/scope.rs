use oxc_ast::ast::Statement;
use oxc_ast_visit::Visit;
use oxc_syntax::scope::ScopeFlags;
use std::collections::HashSet;

/// Every name bound or referenced inside one declaration.
///
/// Generated identifiers must not collide with anything in here.
#[derive(Debug, Clone, Default)]
pub struct LocalBindings {
    names: HashSet<String>,
}

impl LocalBindings {
    pub fn collect(stmt: &Statement<'_>) -> Self {
        let mut names = HashSet::new();
        let mut collector = BindingCollector {
            symbols: &mut names,
        };
        collector.visit_statement(stmt);
        Self { names }
    }

    /// `base`, or `base_1`, `base_2`, ... whichever is free. The returned
    /// name is reserved.
    pub fn fresh(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 1;
        while self.names.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.names.insert(candidate.clone());
        candidate
    }
}

pub struct BindingCollector<'a> {
    pub symbols: &'a mut HashSet<String>,
}

impl<'a, 'b> Visit<'b> for BindingCollector<'a> {
    fn visit_binding_identifier(&mut self, ident: &oxc_ast::ast::BindingIdentifier<'b>) {
        self.symbols.insert(ident.name.to_string());
    }

    fn visit_identifier_reference(&mut self, ident: &oxc_ast::ast::IdentifierReference<'b>) {
        self.symbols.insert(ident.name.to_string());
    }

    fn visit_function(&mut self, func: &oxc_ast::ast::Function<'b>, flags: ScopeFlags) {
        if let Some(id) = &func.id {
            self.symbols.insert(id.name.to_string());
        }
        oxc_ast_visit::walk::walk_function(self, func, flags);
    }

    fn visit_class(&mut self, class: &oxc_ast::ast::Class<'b>) {
        if let Some(id) = &class.id {
            self.symbols.insert(id.name.to_string());
        }
        oxc_ast_visit::walk::walk_class(self, class);
    }
}
