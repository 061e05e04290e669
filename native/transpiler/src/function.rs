//! Top-level statement classification and mutable access to exported
//! functions, whichever syntax declared them.

use oxc_allocator::{Box as ArenaBox, CloneIn, Vec as ArenaVec};
use oxc_ast::ast::{
    ArrowFunctionExpression, BindingPattern, Declaration, ExportDefaultDeclarationKind, Expression, Function,
    FunctionBody, Statement,
};
use oxc_ast::AstBuilder;
use oxc_span::SPAN;

use crate::symbols::declared_names;

/// Export name of `export default ...`.
pub const DEFAULT_EXPORT: &str = "default";

/// What the dispatcher sees at the top of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevel {
    /// `import ... from "<module>"`.
    Import(String),
    /// Exported function with a body: a transform candidate.
    Candidate { name: String },
    /// Any other exported declaration.
    ExportedOther { name: Option<String> },
    Other { name: Option<String> },
}

pub fn classify(stmt: &Statement<'_>) -> TopLevel {
    match stmt {
        Statement::ImportDeclaration(import) => TopLevel::Import(import.source.value.to_string()),
        Statement::ExportNamedDeclaration(export) => match &export.declaration {
            Some(Declaration::FunctionDeclaration(func)) if func.body.is_none() => TopLevel::Other {
                name: func.id.as_ref().map(|id| id.name.to_string()),
            },
            Some(decl) => match candidate_name(decl) {
                Some(name) => TopLevel::Candidate { name },
                None => TopLevel::ExportedOther {
                    name: declared_names(stmt).into_iter().next(),
                },
            },
            None => TopLevel::Other { name: None },
        },
        Statement::ExportDefaultDeclaration(export) => match &export.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) if func.body.is_none() => TopLevel::Other {
                name: declared_names(stmt).into_iter().next(),
            },
            ExportDefaultDeclarationKind::FunctionDeclaration(_)
            | ExportDefaultDeclarationKind::ArrowFunctionExpression(_) => TopLevel::Candidate {
                name: declared_names(stmt).into_iter().next().unwrap_or_else(|| DEFAULT_EXPORT.to_string()),
            },
            ExportDefaultDeclarationKind::FunctionExpression(func) if func.body.is_some() => TopLevel::Candidate {
                name: declared_names(stmt).into_iter().next().unwrap_or_else(|| DEFAULT_EXPORT.to_string()),
            },
            _ => TopLevel::ExportedOther {
                name: declared_names(stmt).into_iter().next(),
            },
        },
        _ => TopLevel::Other {
            name: declared_names(stmt).into_iter().next(),
        },
    }
}

fn candidate_name(decl: &Declaration<'_>) -> Option<String> {
    match decl {
        Declaration::FunctionDeclaration(func) => {
            func.body.as_ref()?;
            func.id.as_ref().map(|id| id.name.to_string())
        }
        Declaration::VariableDeclaration(var) => {
            let [declarator] = &var.declarations[..] else {
                return None;
            };
            let BindingPattern::BindingIdentifier(id) = &declarator.id else {
                return None;
            };
            match declarator.init.as_ref()? {
                Expression::ArrowFunctionExpression(_) => Some(id.name.to_string()),
                Expression::FunctionExpression(func) if func.body.is_some() => {
                    Some(id.name.to_string())
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Name the module exports a candidate under, which is what a handler
/// reference has to use.
pub fn export_name(stmt: &Statement<'_>, declared: &str) -> String {
    match stmt {
        Statement::ExportDefaultDeclaration(_) => DEFAULT_EXPORT.to_string(),
        _ => declared.to_string(),
    }
}

/// Whether a candidate statement declares a generator.
pub fn is_generator(stmt: &Statement<'_>) -> bool {
    let export = match stmt {
        Statement::ExportNamedDeclaration(export) => export,
        Statement::ExportDefaultDeclaration(export) => {
            return match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func)
                | ExportDefaultDeclarationKind::FunctionExpression(func) => func.generator,
                _ => false,
            };
        }
        _ => return false,
    };
    match &export.declaration {
        Some(Declaration::FunctionDeclaration(func)) => func.generator,
        Some(Declaration::VariableDeclaration(var)) => matches!(
            var.declarations.first().and_then(|d| d.init.as_ref()),
            Some(Expression::FunctionExpression(func)) if func.generator
        ),
        _ => false,
    }
}

pub enum FunctionMut<'s, 'a> {
    Function(&'s mut Function<'a>),
    Arrow(&'s mut ArrowFunctionExpression<'a>),
}

/// The function behind an exported candidate statement.
pub fn exported_function_mut<'s, 'a>(stmt: &'s mut Statement<'a>) -> Option<FunctionMut<'s, 'a>> {
    let export = match stmt {
        Statement::ExportNamedDeclaration(export) => export,
        Statement::ExportDefaultDeclaration(export) => {
            return match &mut export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func)
                | ExportDefaultDeclarationKind::FunctionExpression(func) => Some(FunctionMut::Function(&mut **func)),
                ExportDefaultDeclarationKind::ArrowFunctionExpression(arrow) => Some(FunctionMut::Arrow(&mut **arrow)),
                _ => None,
            };
        }
        _ => return None,
    };
    match export.declaration.as_mut()? {
        Declaration::FunctionDeclaration(func) => Some(FunctionMut::Function(&mut **func)),
        Declaration::VariableDeclaration(var) => {
            let declarator = var.declarations.first_mut()?;
            match declarator.init.as_mut()? {
                Expression::ArrowFunctionExpression(arrow) => Some(FunctionMut::Arrow(&mut **arrow)),
                Expression::FunctionExpression(func) => Some(FunctionMut::Function(&mut **func)),
                _ => None,
            }
        }
        _ => None,
    }
}

impl<'s, 'a> FunctionMut<'s, 'a> {
    pub fn set_async(&mut self) {
        match self {
            FunctionMut::Function(func) => func.r#async = true,
            FunctionMut::Arrow(arrow) => arrow.r#async = true,
        }
    }

    pub fn clear_return_type(&mut self) {
        match self {
            FunctionMut::Function(func) => func.return_type = None,
            FunctionMut::Arrow(arrow) => arrow.return_type = None,
        }
    }

    /// Moves the body statements out. An expression-bodied arrow is
    /// normalised to a single `return <expr>;` first.
    pub fn take_statements(&mut self, ast: AstBuilder<'a>) -> ArenaVec<'a, Statement<'a>> {
        match self {
            FunctionMut::Function(func) => match func.body.as_mut() {
                Some(body) => std::mem::replace(&mut body.statements, ast.vec()),
                None => ast.vec(),
            },
            FunctionMut::Arrow(arrow) => {
                if arrow.expression {
                    arrow.expression = false;
                    let returned = match arrow.body.statements.first() {
                        Some(Statement::ExpressionStatement(stmt)) => {
                            Some(stmt.expression.clone_in(ast.allocator))
                        }
                        _ => None,
                    };
                    arrow.body.statements = ast.vec();
                    ast.vec1(ast.statement_return(SPAN, returned))
                } else {
                    std::mem::replace(&mut arrow.body.statements, ast.vec())
                }
            }
        }
    }

    /// Installs `body`, carrying over the directive prologue of the old one.
    pub fn replace_body(&mut self, ast: AstBuilder<'a>, mut body: ArenaBox<'a, FunctionBody<'a>>) {
        match self {
            FunctionMut::Function(func) => {
                if let Some(old) = func.body.as_mut() {
                    body.directives = std::mem::replace(&mut old.directives, ast.vec());
                }
                func.body = Some(body);
            }
            FunctionMut::Arrow(arrow) => {
                body.directives = std::mem::replace(&mut arrow.body.directives, ast.vec());
                arrow.body = body;
            }
        }
    }
}
