//! Symbol lookup over a parsed program.
//!
//! This is the thin adapter between the oxc front end and the rewrite pass:
//! it answers "which exported name does this declaration bind" and "what
//! documentation is attached to that name". Nothing here is mutated after
//! `SymbolTable::build`.

use indexmap::IndexMap;
use oxc_ast::ast::{BindingPattern, Declaration, ExportDefaultDeclarationKind, Statement};
use oxc_ast::Comment;
use oxc_span::GetSpan;

use crate::function::DEFAULT_EXPORT;

/// A `/** ... */` block, stored without its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocComment {
    pub text: String,
    /// Absolute source offset of `text[0]`.
    pub start: u32,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    /// One entry per documented declaration of `name`, in source order.
    pub docs: Vec<DocComment>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn build(body: &[Statement<'_>], comments: &[Comment], source: &str) -> Self {
        let mut table = SymbolTable::default();
        for stmt in body {
            let names = match stmt {
                Statement::ExportNamedDeclaration(_) => declared_names(stmt),
                Statement::ExportDefaultDeclaration(_) => match declared_names(stmt).into_iter().next() {
                    Some(name) => vec![name],
                    None => vec![DEFAULT_EXPORT.to_string()],
                },
                _ => continue,
            };
            let doc = doc_comment_before(comments, source, stmt.span().start);
            for name in names {
                let symbol = table.symbols.entry(name.clone()).or_insert_with(|| Symbol {
                    name,
                    docs: Vec::new(),
                });
                if let Some(doc) = &doc {
                    symbol.docs.push(doc.clone());
                }
            }
        }
        table
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Names bound by a top-level statement, exported or not.
pub fn declared_names(stmt: &Statement<'_>) -> Vec<String> {
    match stmt {
        Statement::ExportNamedDeclaration(export) => match &export.declaration {
            Some(decl) => names_of_declaration(decl),
            None => Vec::new(),
        },
        Statement::ExportDefaultDeclaration(export) => match &export.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => func
                .id
                .as_ref()
                .map(|id| vec![id.name.to_string()])
                .unwrap_or_default(),
            ExportDefaultDeclarationKind::ClassDeclaration(class) => class
                .id
                .as_ref()
                .map(|id| vec![id.name.to_string()])
                .unwrap_or_default(),
            _ => Vec::new(),
        },
        Statement::FunctionDeclaration(func) => func
            .id
            .as_ref()
            .map(|id| vec![id.name.to_string()])
            .unwrap_or_default(),
        Statement::ClassDeclaration(class) => class
            .id
            .as_ref()
            .map(|id| vec![id.name.to_string()])
            .unwrap_or_default(),
        Statement::VariableDeclaration(var) => var
            .declarations
            .iter()
            .filter_map(|d| binding_name(&d.id))
            .collect(),
        Statement::TSTypeAliasDeclaration(decl) => vec![decl.id.name.to_string()],
        Statement::TSInterfaceDeclaration(decl) => vec![decl.id.name.to_string()],
        Statement::TSEnumDeclaration(decl) => vec![decl.id.name.to_string()],
        _ => Vec::new(),
    }
}

fn names_of_declaration(decl: &Declaration<'_>) -> Vec<String> {
    match decl {
        Declaration::FunctionDeclaration(func) => func
            .id
            .as_ref()
            .map(|id| vec![id.name.to_string()])
            .unwrap_or_default(),
        Declaration::ClassDeclaration(class) => class
            .id
            .as_ref()
            .map(|id| vec![id.name.to_string()])
            .unwrap_or_default(),
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .filter_map(|d| binding_name(&d.id))
            .collect(),
        Declaration::TSTypeAliasDeclaration(decl) => vec![decl.id.name.to_string()],
        Declaration::TSInterfaceDeclaration(decl) => vec![decl.id.name.to_string()],
        Declaration::TSEnumDeclaration(decl) => vec![decl.id.name.to_string()],
        _ => Vec::new(),
    }
}

fn binding_name(pattern: &BindingPattern<'_>) -> Option<String> {
    match pattern {
        BindingPattern::BindingIdentifier(id) => Some(id.name.to_string()),
        _ => None,
    }
}

/// The documentation block attached to the declaration at `start`.
///
/// Other comments may sit between the block and the declaration (lint
/// pragmas, for instance) as long as only whitespace separates each of them;
/// the nearest `/** */` block in that run wins.
pub fn doc_comment_before(comments: &[Comment], source: &str, start: u32) -> Option<DocComment> {
    let mut end = start as usize;
    for comment in comments.iter().rev().filter(|c| c.span.end <= start) {
        let (open, close) = comment_bounds(comment, source)?;
        let gap = source.get(close..end)?;
        if !gap.trim().is_empty() {
            return None;
        }
        if let Some(doc) = doc_block(source, open, close) {
            return Some(doc);
        }
        end = open;
    }
    None
}

/// Byte range of a comment including its delimiters. Comment spans may or
/// may not cover the delimiters; both are accepted.
fn comment_bounds(comment: &Comment, source: &str) -> Option<(usize, usize)> {
    let (start, end) = (comment.span.start as usize, comment.span.end as usize);
    let open = if source.get(start..)?.starts_with("/*") || source.get(start..)?.starts_with("//") {
        start
    } else {
        start.checked_sub(2)?
    };
    let close = if source.get(..end)?.ends_with("*/") || !source.get(open..)?.starts_with("/*") {
        end
    } else {
        end + 2
    };
    Some((open, close))
}

fn doc_block(source: &str, open: usize, close: usize) -> Option<DocComment> {
    let full = source.get(open..close)?.strip_suffix("*/")?;
    let inner = full.strip_prefix("/**")?;
    if inner.starts_with('/') {
        return None;
    }
    Some(DocComment {
        text: inner.to_string(),
        start: (open + 3) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn build(code: &str) -> SymbolTable {
        let allocator = Allocator::default();
        let source_type = SourceType::default()
            .with_typescript(true)
            .with_module(true);
        let ret = Parser::new(&allocator, code, source_type).parse();
        SymbolTable::build(&ret.program.body, &ret.program.comments, code)
    }

    #[test]
    fn test_exported_function_doc_is_resolved() {
        let code = "/** $Fixed */\nexport function handler(event) { return event; }\n";
        let table = build(code);
        let symbol = table.resolve("handler").expect("symbol");
        assert_eq!(symbol.docs.len(), 1);
        assert_eq!(symbol.docs[0].text.trim(), "$Fixed");
        assert_eq!(&code[symbol.docs[0].start as usize..][..7], " $Fixed");
    }

    #[test]
    fn test_plain_block_and_line_comments_are_not_docs() {
        let table = build("/* $Fixed */\nexport function a() {}\n// $Fixed\nexport function b() {}\n");
        assert!(table.resolve("a").expect("a").docs.is_empty());
        assert!(table.resolve("b").expect("b").docs.is_empty());
    }

    #[test]
    fn test_doc_separated_by_code_is_not_attached() {
        let table = build("/** $Fixed */\nconst x = 1;\nexport function a() {}\n");
        assert!(table.resolve("a").expect("a").docs.is_empty());
    }

    #[test]
    fn test_non_exported_names_are_not_symbols() {
        let table = build("/** $Fixed */\nfunction hidden() {}\nexport const shown = () => 1;\n");
        assert!(table.resolve("hidden").is_none());
        assert!(table.resolve("shown").is_some());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_overloads_share_one_symbol() {
        let code = "/** $HttpApi(\"/a\") */\nexport function f(a: string): void;\nexport function f(a: any) {}\n";
        let table = build(code);
        let symbol = table.resolve("f").expect("f");
        assert_eq!(symbol.docs.len(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_doc_above_line_comments_is_attached() {
        let code = "/** $HttpApi(\"/users\", \"POST\") */\n// eslint-disable-next-line\n/* keep */\nexport function createUser() {}\n";
        let symbol = build(code).resolve("createUser").cloned().expect("createUser");
        assert_eq!(symbol.docs.len(), 1);
        assert_eq!(symbol.docs[0].text.trim(), "$HttpApi(\"/users\", \"POST\")");
        assert_eq!(&code[symbol.docs[0].start as usize..][..9], " $HttpApi");
    }

    #[test]
    fn test_nearest_doc_block_wins() {
        let code = "/** $Ignored */\n/** $Fixed */\n// note\nexport function a() {}\n";
        let symbol = build(code).resolve("a").cloned().expect("a");
        assert_eq!(symbol.docs[0].text.trim(), "$Fixed");
    }

    #[test]
    fn test_comment_run_broken_by_code_is_not_attached() {
        let table = build("/** $Fixed */\nconst x = 1;\n// note\nexport function a() {}\n");
        assert!(table.resolve("a").expect("a").docs.is_empty());
    }

    #[test]
    fn test_default_exports_are_symbols() {
        let table = build("/** $Fixed */\nexport default function createUser() {}\n");
        assert_eq!(table.resolve("createUser").expect("createUser").docs.len(), 1);

        let table = build("/** $Fixed */\nexport default () => 1;\n");
        assert_eq!(table.resolve("default").expect("default").docs.len(), 1);
    }
}
