//! Wrapper templates.
//!
//! A template is a function body written as source text with a single
//! `__hati_body__;` statement marking where the original statements go. It is
//! parsed into the caller's arena, stripped of spans (they would point into
//! the template text, not the file being printed) and spliced.

use oxc_allocator::{Box as ArenaBox, Vec as ArenaVec};
use oxc_ast::ast::{BlockStatement, Expression, FunctionBody, Statement};
use oxc_ast::AstBuilder;
use oxc_ast_visit::walk_mut::{walk_block_statement, walk_function_body};
use oxc_ast_visit::VisitMut;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span, SPAN};

use crate::error::TranspileError;

pub const BODY_MARKER: &str = "__hati_body__";

/// Parses `code` as the body of an async function.
pub fn function_body<'a>(
    ast: AstBuilder<'a>,
    code: &str,
) -> Result<ArenaBox<'a, FunctionBody<'a>>, TranspileError> {
    let wrapped = format!("async function __hati_template() {{\n{}\n}}", code);
    let text: &'a str = ast.allocator.alloc_str(&wrapped);
    let source_type = SourceType::default()
        .with_typescript(true)
        .with_module(true);

    let ret = Parser::new(ast.allocator, text, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(TranspileError::Template(messages.join("; ")));
    }

    let mut program = ret.program;
    SpanEraser.visit_program(&mut program);

    for stmt in program.body {
        if let Statement::FunctionDeclaration(mut func) = stmt {
            if let Some(body) = func.body.take() {
                return Ok(body);
            }
        }
    }
    Err(TranspileError::Template("template produced no function body".to_string()))
}

/// Replaces the marker inside `body` with `statements`. Returns false when the
/// template has no marker, in which case `body` is untouched.
pub fn splice<'a>(body: &mut FunctionBody<'a>, statements: ArenaVec<'a, Statement<'a>>) -> bool {
    let mut splicer = BodySplicer {
        statements: Some(statements),
    };
    splicer.visit_function_body(body);
    splicer.statements.is_none()
}

struct SpanEraser;

impl<'a> VisitMut<'a> for SpanEraser {
    fn visit_span(&mut self, span: &mut Span) {
        *span = SPAN;
    }
}

struct BodySplicer<'a> {
    statements: Option<ArenaVec<'a, Statement<'a>>>,
}

impl<'a> BodySplicer<'a> {
    fn fill(&mut self, slot: &mut ArenaVec<'a, Statement<'a>>) -> bool {
        if !is_marker(slot) {
            return false;
        }
        match self.statements.take() {
            Some(statements) => {
                *slot = statements;
                true
            }
            None => false,
        }
    }
}

impl<'a> VisitMut<'a> for BodySplicer<'a> {
    fn visit_function_body(&mut self, body: &mut FunctionBody<'a>) {
        if self.fill(&mut body.statements) {
            return;
        }
        walk_function_body(self, body);
    }

    fn visit_block_statement(&mut self, block: &mut BlockStatement<'a>) {
        if self.fill(&mut block.body) {
            return;
        }
        walk_block_statement(self, block);
    }
}

fn is_marker(statements: &[Statement<'_>]) -> bool {
    match statements {
        [Statement::ExpressionStatement(stmt)] => {
            matches!(&stmt.expression, Expression::Identifier(id) if id.name == BODY_MARKER)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;

    #[test]
    fn test_template_body_is_span_free() {
        let allocator = Allocator::default();
        let ast = AstBuilder::new(&allocator);
        let body = function_body(ast, "const x = await f();\nreturn x;").expect("template");
        assert_eq!(body.statements.len(), 2);
        assert_eq!(body.span, SPAN);
        assert!(body.statements.iter().all(|s| {
            use oxc_span::GetSpan;
            s.span() == SPAN
        }));
    }

    #[test]
    fn test_splice_into_nested_block() {
        let allocator = Allocator::default();
        let ast = AstBuilder::new(&allocator);

        let mut body = function_body(ast, "try {\n__hati_body__;\n} finally {\nlog();\n}")
            .expect("template");
        let original = function_body(ast, "return 42;").expect("original");
        let original = ArenaBox::unbox(original);

        assert!(splice(&mut body, original.statements));

        let Statement::TryStatement(try_stmt) = &body.statements[0] else {
            panic!("expected a try statement");
        };
        assert!(matches!(
            &try_stmt.block.body[..],
            [Statement::ReturnStatement(_)]
        ));
        assert!(!is_marker(&try_stmt.block.body));
    }

    #[test]
    fn test_template_without_marker_is_left_alone() {
        let allocator = Allocator::default();
        let ast = AstBuilder::new(&allocator);
        let mut body = function_body(ast, "return 1;").expect("template");
        assert!(!splice(&mut body, ast.vec()));
        assert_eq!(body.statements.len(), 1);
    }

    #[test]
    fn test_broken_template_is_an_error() {
        let allocator = Allocator::default();
        let ast = AstBuilder::new(&allocator);
        assert!(matches!(
            function_body(ast, "try {"),
            Err(TranspileError::Template(_))
        ));
    }
}
