//! Dispatcher: walks a program's top-level statements and folds each
//! declaration's directives over it, in the order they were written.
//!
//! Invariants:
//! - Every directive on a declaration is parsed and validated before the
//!   first transform runs, so a bad directive never leaves half-rewritten
//!   output behind.
//! - `$Ignored` ends the fold: the declaration disappears from the output and
//!   nothing staged for it reaches the registry.
//! - Unknown `$Names` are inert.

use oxc_ast::ast::{Program, Statement};
use oxc_ast::Comment;
use oxc_span::{GetSpan, SPAN};

use crate::annotation::{parse_directive, Directive, DirectiveKind, DirectiveSite};
use crate::context::TransformContext;
use crate::error::{DirectiveError, TranspileError, ERR_DIRECTIVE_TARGET};
use crate::function::{classify, export_name, is_generator, TopLevel};
use crate::scan::{scan_directives, DirectiveLine};
use crate::source::SourceFile;
use crate::symbols::{doc_comment_before, SymbolTable};
use crate::transformers::{self, Action};

pub fn transform_program<'a>(
    program: &mut Program<'a>,
    ctx: &mut TransformContext<'_, 'a>,
) -> Result<(), TranspileError> {
    let symbols = SymbolTable::build(&program.body, &program.comments, &ctx.source.text);
    log::debug!(
        "{}: {} exported symbol(s)",
        ctx.source.display_path(),
        symbols.len()
    );

    let body = std::mem::replace(&mut program.body, ctx.ast.vec());
    let mut out = ctx.ast.vec_with_capacity(body.len());
    let comments = &program.comments;

    for mut stmt in body {
        match visit_statement(&mut stmt, ctx, &symbols, comments)? {
            Action::Keep => out.push(stmt),
            Action::Replace(replacement) => out.push(replacement),
            Action::Drop => {}
        }
    }

    program.body = out;
    Ok(())
}

fn visit_statement<'a>(
    stmt: &mut Statement<'a>,
    ctx: &mut TransformContext<'_, 'a>,
    symbols: &SymbolTable,
    comments: &[Comment],
) -> Result<Action<'a>, TranspileError> {
    match classify(stmt) {
        TopLevel::Import(module) => {
            ctx.record_import(module);
            Ok(Action::Keep)
        }
        TopLevel::Candidate { name } => visit_candidate(stmt, &name, ctx, symbols),
        TopLevel::ExportedOther { name } => {
            let name = name.unwrap_or_else(|| "<anonymous>".to_string());
            let lines = directive_lines(stmt, ctx, comments);
            let site = site(ctx.source, &name, stmt);
            for (line, directive) in parse_all(&lines, &site)? {
                if directive.kind().requires_function() {
                    return Err(target_error(&site, &line, directive.kind(), "an exported function").into());
                }
                if directive == Directive::Ignored {
                    log::debug!("ignoring exported '{}'", name);
                    return Ok(Action::Drop);
                }
            }
            Ok(Action::Keep)
        }
        TopLevel::Other { name } => {
            let name = name.unwrap_or_else(|| "<anonymous>".to_string());
            let lines = directive_lines(stmt, ctx, comments);
            let site = site(ctx.source, &name, stmt);
            for line in &lines {
                match parse_directive(line, &site) {
                    Ok(Some(Directive::Ignored)) => {
                        log::debug!("ignoring '{}'", name);
                        return Ok(Action::Drop);
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("skipping directive on non-exported '{}': {}", name, e.message),
                }
            }
            Ok(Action::Keep)
        }
    }
}

fn visit_candidate<'a>(
    stmt: &mut Statement<'a>,
    name: &str,
    ctx: &mut TransformContext<'_, 'a>,
    symbols: &SymbolTable,
) -> Result<Action<'a>, TranspileError> {
    let Some(symbol) = symbols.resolve(name) else {
        return Ok(Action::Keep);
    };
    let lines: Vec<DirectiveLine> = symbol.docs.iter().flat_map(scan_directives).collect();
    if lines.is_empty() {
        return Ok(Action::Keep);
    }

    let site = site(ctx.source, name, stmt);
    let directives = parse_all(&lines, &site)?;
    if directives.is_empty() {
        return Ok(Action::Keep);
    }
    if is_generator(stmt) {
        if let Some((line, _)) = directives.iter().find(|(_, d)| *d == Directive::Fixed) {
            return Err(target_error(&site, line, DirectiveKind::Fixed, "a non-generator function").into());
        }
    }

    log::debug!(
        "'{}': {}",
        name,
        directives
            .iter()
            .map(|(_, d)| d.kind().to_string())
            .collect::<Vec<_>>()
            .join(" → ")
    );

    ctx.begin(name, &export_name(stmt, name));
    let node = std::mem::replace(stmt, ctx.ast.statement_empty(SPAN));
    let folded = directives
        .iter()
        .try_fold(Action::Replace(node), |action, (_, directive)| match action {
            Action::Replace(node) => transformers::apply(directive, node, ctx),
            done => Ok(done),
        });

    let action = match folded {
        Ok(action) => action,
        Err(e) => {
            ctx.discard();
            return Err(e);
        }
    };
    match action {
        Action::Drop => ctx.discard(),
        _ => {
            ctx.commit();
        }
    }
    Ok(action)
}

fn site<'s>(source: &'s SourceFile, name: &'s str, stmt: &Statement<'_>) -> DirectiveSite<'s> {
    DirectiveSite {
        source,
        function: name,
        declaration_start: stmt.span().start,
    }
}

fn directive_lines(stmt: &Statement<'_>, ctx: &TransformContext<'_, '_>, comments: &[Comment]) -> Vec<DirectiveLine> {
    doc_comment_before(comments, &ctx.source.text, stmt.span().start)
        .map(|doc| scan_directives(&doc))
        .unwrap_or_default()
}

fn parse_all(
    lines: &[DirectiveLine],
    site: &DirectiveSite<'_>,
) -> Result<Vec<(DirectiveLine, Directive)>, TranspileError> {
    let mut directives = Vec::new();
    for line in lines {
        if let Some(directive) = parse_directive(line, site)? {
            directives.push((line.clone(), directive));
        }
    }
    Ok(directives)
}

fn target_error(
    site: &DirectiveSite<'_>,
    line: &DirectiveLine,
    kind: DirectiveKind,
    expected: &str,
) -> DirectiveError {
    site.error(
        ERR_DIRECTIVE_TARGET,
        format!("{} can only be applied to {}", kind, expected),
        line,
        0,
        kind.name().len() + 1,
    )
}
