//! Annotation parser: one `$Name(args...)` line → a validated [`Directive`].
//!
//! Unknown names are inert. A known name whose argument list does not parse,
//! or whose arguments do not fit the directive, is a fatal [`DirectiveError`]
//! raised before any transform touches the declaration.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DirectiveError, ERR_DIRECTIVE_ARGUMENT, ERR_DIRECTIVE_SYNTAX};
use crate::scan::DirectiveLine;
use crate::source::SourceFile;

lazy_static! {
    static ref DIRECTIVE_NAME_RE: Regex = Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTIVE CATALOG
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Fixed,
    HttpApi,
    Scheduled,
    TrackMetrics,
    Ignored,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 5] = [
        DirectiveKind::Fixed,
        DirectiveKind::HttpApi,
        DirectiveKind::Scheduled,
        DirectiveKind::TrackMetrics,
        DirectiveKind::Ignored,
    ];

    /// Case-sensitive lookup in the closed catalog.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Fixed => "Fixed",
            DirectiveKind::HttpApi => "HttpApi",
            DirectiveKind::Scheduled => "Scheduled",
            DirectiveKind::TrackMetrics => "TrackMetrics",
            DirectiveKind::Ignored => "Ignored",
        }
    }

    /// Everything except `Ignored` needs a function to work on.
    pub fn requires_function(self) -> bool {
        !matches!(self, DirectiveKind::Ignored)
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Any,
}

impl HttpMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            "ANY" => Some(HttpMethod::Any),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Any => "ANY",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, validated directive. Transforms match on this exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Fixed,
    HttpApi { path: String, method: HttpMethod },
    Scheduled { expression: String },
    TrackMetrics,
    Ignored,
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Fixed => DirectiveKind::Fixed,
            Directive::HttpApi { .. } => DirectiveKind::HttpApi,
            Directive::Scheduled { .. } => DirectiveKind::Scheduled,
            Directive::TrackMetrics => DirectiveKind::TrackMetrics,
            Directive::Ignored => DirectiveKind::Ignored,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RAW ANNOTATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    String(String),
    Number(String),
    Identifier(String),
}

impl ArgValue {
    pub fn as_str(&self) -> &str {
        match self {
            ArgValue::String(s) | ArgValue::Number(s) | ArgValue::Identifier(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationArg {
    pub value: ArgValue,
    /// Byte range inside the directive line.
    pub start: usize,
    pub end: usize,
}

/// `{ name, args }` exactly as written, before per-directive validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: DirectiveKind,
    pub args: Vec<AnnotationArg>,
    /// Byte range of `(...)`, or an empty range right after the name.
    pub args_start: usize,
    pub args_end: usize,
}

/// Where a directive line lives, for diagnostics.
pub struct DirectiveSite<'s> {
    pub source: &'s SourceFile,
    pub function: &'s str,
    pub declaration_start: u32,
}

impl DirectiveSite<'_> {
    pub fn error(
        &self,
        code: &str,
        message: impl Into<String>,
        line: &DirectiveLine,
        start: usize,
        len: usize,
    ) -> DirectiveError {
        let start = start.min(line.text.len());
        let end = (start + len).min(line.text.len());
        let location = self.source.location(line.offset_of(start));
        DirectiveError {
            code: code.to_string(),
            message: message.into(),
            file: self.source.display_path(),
            function: self.function.to_string(),
            line: location.line,
            column: location.column,
            directive_text: line.text.clone(),
            marker_start: line.text[..start].chars().count(),
            marker_len: line.text[start..end].chars().count().max(1),
            declaration_line: self.source.location(self.declaration_start).line,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

struct SyntaxError {
    start: usize,
    len: usize,
    message: &'static str,
}

impl SyntaxError {
    fn at(start: usize, len: usize, message: &'static str) -> Self {
        Self {
            start,
            len,
            message,
        }
    }
}

/// Parses one directive line. `Ok(None)` for names outside the catalog.
pub fn parse_annotation(
    line: &DirectiveLine,
    site: &DirectiveSite<'_>,
) -> Result<Option<Annotation>, DirectiveError> {
    let text = line.text.as_str();
    let Some(caps) = DIRECTIVE_NAME_RE.captures(text) else {
        return Ok(None);
    };
    let Some(kind) = DirectiveKind::from_name(&caps[1]) else {
        return Ok(None);
    };
    let name_end = caps[0].len();

    let to_error = |e: SyntaxError| site.error(ERR_DIRECTIVE_SYNTAX, e.message, line, e.start, e.len);

    let rest = &text[name_end..];
    if rest.trim().is_empty() {
        return Ok(Some(Annotation {
            kind,
            args: Vec::new(),
            args_start: name_end,
            args_end: name_end,
        }));
    }

    let open = name_end + (rest.len() - rest.trim_start().len());
    if !text[open..].starts_with('(') {
        return Err(to_error(SyntaxError::at(
            open,
            text.len() - open,
            "Expected '(' or the end of the directive",
        )));
    }

    let (args, close) = ArgLexer::new(text, open + 1).parse_list().map_err(to_error)?;

    let trailing = &text[close + 1..];
    if !trailing.trim().is_empty() {
        let start = close + 1 + (trailing.len() - trailing.trim_start().len());
        return Err(to_error(SyntaxError::at(
            start,
            text.trim_end().len() - start,
            "Unexpected characters after the argument list",
        )));
    }

    Ok(Some(Annotation {
        kind,
        args,
        args_start: open,
        args_end: close + 1,
    }))
}

/// Parses and validates one line into a typed directive.
pub fn parse_directive(
    line: &DirectiveLine,
    site: &DirectiveSite<'_>,
) -> Result<Option<Directive>, DirectiveError> {
    match parse_annotation(line, site)? {
        Some(annotation) => validate(&annotation, line, site).map(Some),
        None => Ok(None),
    }
}

fn validate(
    annotation: &Annotation,
    line: &DirectiveLine,
    site: &DirectiveSite<'_>,
) -> Result<Directive, DirectiveError> {
    let arg_error = |message: String, start: usize, end: usize| {
        site.error(ERR_DIRECTIVE_ARGUMENT, message, line, start, end.saturating_sub(start))
    };
    let args = &annotation.args;
    let list_span = (annotation.args_start, annotation.args_end);

    let no_args = |directive: Directive| {
        if let (Some(first), Some(last)) = (args.first(), args.last()) {
            return Err(arg_error(
                format!("{} takes no arguments", annotation.kind),
                first.start,
                last.end,
            ));
        }
        Ok(directive)
    };

    match annotation.kind {
        DirectiveKind::Fixed => no_args(Directive::Fixed),
        DirectiveKind::TrackMetrics => no_args(Directive::TrackMetrics),
        DirectiveKind::Ignored => no_args(Directive::Ignored),
        DirectiveKind::HttpApi => {
            let Some(path_arg) = args.first() else {
                return Err(arg_error(
                    "Missing path argument".to_string(),
                    list_span.0,
                    list_span.1,
                ));
            };
            if let Some(extra) = args.get(2) {
                return Err(arg_error(
                    "Too many arguments: expected a path and an optional method".to_string(),
                    extra.start,
                    extra.end,
                ));
            }
            let ArgValue::String(path) = &path_arg.value else {
                return Err(arg_error(
                    "Path must be a string literal".to_string(),
                    path_arg.start,
                    path_arg.end,
                ));
            };
            if !path.starts_with('/') {
                return Err(arg_error(
                    format!("Path '{}' must start with '/'", path),
                    path_arg.start,
                    path_arg.end,
                ));
            }
            let method = match args.get(1) {
                None => HttpMethod::Get,
                Some(arg) => match &arg.value {
                    ArgValue::String(m) | ArgValue::Identifier(m) => HttpMethod::parse(m)
                        .ok_or_else(|| {
                            arg_error(format!("Unknown HTTP method '{}'", m), arg.start, arg.end)
                        })?,
                    ArgValue::Number(n) => {
                        return Err(arg_error(
                            format!("Unknown HTTP method '{}'", n),
                            arg.start,
                            arg.end,
                        ))
                    }
                },
            };
            Ok(Directive::HttpApi {
                path: path.clone(),
                method,
            })
        }
        DirectiveKind::Scheduled => {
            let Some(arg) = args.first() else {
                return Err(arg_error(
                    "Missing schedule expression".to_string(),
                    list_span.0,
                    list_span.1,
                ));
            };
            if let Some(extra) = args.get(1) {
                return Err(arg_error(
                    "Too many arguments: expected one schedule expression".to_string(),
                    extra.start,
                    extra.end,
                ));
            }
            match &arg.value {
                ArgValue::String(expr) if !expr.trim().is_empty() => Ok(Directive::Scheduled {
                    expression: expr.trim().to_string(),
                }),
                ArgValue::String(_) => Err(arg_error(
                    "Schedule expression must not be empty".to_string(),
                    arg.start,
                    arg.end,
                )),
                _ => Err(arg_error(
                    "Schedule expression must be a string literal".to_string(),
                    arg.start,
                    arg.end,
                )),
            }
        }
    }
}

struct ArgLexer<'t> {
    text: &'t str,
    pos: usize,
}

impl<'t> ArgLexer<'t> {
    fn new(text: &'t str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn unclosed(&self) -> SyntaxError {
        SyntaxError::at(self.text.len(), 1, "Missing closing parenthesis")
    }

    /// Returns the arguments and the byte index of the closing `)`.
    fn parse_list(mut self) -> Result<(Vec<AnnotationArg>, usize), SyntaxError> {
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            return Ok((args, self.pos));
        }

        loop {
            self.skip_whitespace();
            args.push(self.parse_arg()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => return Ok((args, self.pos)),
                Some(c) => {
                    return Err(SyntaxError::at(
                        self.pos,
                        c.len_utf8(),
                        "Expected ',' or ')' after argument",
                    ))
                }
                None => return Err(self.unclosed()),
            }
        }
    }

    fn parse_arg(&mut self) -> Result<AnnotationArg, SyntaxError> {
        let start = self.pos;
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.string(quote)?,
            Some(c) if c.is_ascii_digit() || c == '-' => self.number()?,
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                ArgValue::Identifier(self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$').to_string())
            }
            Some(')') | Some(',') => {
                return Err(SyntaxError::at(start, 1, "Expected an argument"));
            }
            Some(c) => return Err(SyntaxError::at(start, c.len_utf8(), "Invalid argument")),
            None => return Err(self.unclosed()),
        };
        Ok(AnnotationArg {
            value,
            start,
            end: self.pos,
        })
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'t str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.text[start..self.pos]
    }

    fn string(&mut self, quote: char) -> Result<ArgValue, SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chars = self.text[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            if c == quote {
                self.pos += i + 1;
                return Ok(ArgValue::String(value));
            }
            if c == '\\' {
                match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                }
            } else {
                value.push(c);
            }
        }
        Err(SyntaxError::at(
            start,
            self.text.len() - start,
            "Unterminated string literal",
        ))
    }

    fn number(&mut self) -> Result<ArgValue, SyntaxError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(SyntaxError::at(start, 1, "Invalid number"));
        }
        if self.peek() == Some('.') {
            self.pos += 1;
            if self.take_while(|c| c.is_ascii_digit()).is_empty() {
                return Err(SyntaxError::at(start, self.pos - start, "Invalid number"));
            }
        }
        if let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                return Err(SyntaxError::at(start, self.pos - start, "Invalid number"));
            }
        }
        Ok(ArgValue::Number(self.text[start..self.pos].to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn source() -> SourceFile {
        SourceFile::new(
            "src/users.ts",
            "output/users.ts",
            "/** DIRECTIVE */\nexport function createUser() {}\n".to_string(),
        )
    }

    fn parse(text: &str) -> Result<Option<Directive>, DirectiveError> {
        let source = source();
        let site = DirectiveSite {
            source: &source,
            function: "createUser",
            declaration_start: 17,
        };
        parse_directive(&DirectiveLine::new(text, 4), &site)
    }

    fn parse_err(text: &str) -> DirectiveError {
        match parse(text) {
            Err(e) => e,
            Ok(d) => panic!("expected an error for {text:?}, got {d:?}"),
        }
    }

    #[test]
    fn test_bare_directives() {
        assert_eq!(parse("$Fixed").ok().flatten(), Some(Directive::Fixed));
        assert_eq!(parse("$TrackMetrics ").ok().flatten(), Some(Directive::TrackMetrics));
        assert_eq!(parse("$Ignored()").ok().flatten(), Some(Directive::Ignored));
    }

    #[test]
    fn test_http_api_with_method() {
        assert_eq!(
            parse("$HttpApi(\"/users\", \"POST\")").ok().flatten(),
            Some(Directive::HttpApi {
                path: "/users".to_string(),
                method: HttpMethod::Post
            })
        );
        assert_eq!(
            parse("$HttpApi('/users', delete)").ok().flatten(),
            Some(Directive::HttpApi {
                path: "/users".to_string(),
                method: HttpMethod::Delete
            })
        );
    }

    #[test]
    fn test_http_api_method_defaults_to_get() {
        assert_eq!(
            parse("$HttpApi(\"/health\")").ok().flatten(),
            Some(Directive::HttpApi {
                path: "/health".to_string(),
                method: HttpMethod::Get
            })
        );
    }

    #[test]
    fn test_scheduled() {
        assert_eq!(
            parse("$Scheduled(\"rate(5 minutes)\")").ok().flatten(),
            Some(Directive::Scheduled {
                expression: "rate(5 minutes)".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_names_are_inert() {
        assert_eq!(parse("$fixed").ok().flatten(), None);
        assert_eq!(parse("$Fixedly(").ok().flatten(), None);
        assert_eq!(parse("$ Fixed").ok().flatten(), None);
        assert_eq!(parse("$5 per call").ok().flatten(), None);
    }

    #[test]
    fn test_missing_path_is_fatal() {
        let err = parse_err("$HttpApi()");
        assert_eq!(err.code, ERR_DIRECTIVE_ARGUMENT);
        assert_eq!(err.message, "Missing path argument");
        assert_eq!(err.function, "createUser");
        assert_eq!(err.declaration_line, 2);
        assert_eq!((err.marker_start, err.marker_len), (8, 2));
        assert_eq!((err.line, err.column), (1, 13));
    }

    #[test]
    fn test_scheduled_requires_non_empty_expression() {
        assert_eq!(parse_err("$Scheduled").message, "Missing schedule expression");
        assert_eq!(
            parse_err("$Scheduled(\"  \")").message,
            "Schedule expression must not be empty"
        );
        assert_eq!(
            parse_err("$Scheduled(5)").message,
            "Schedule expression must be a string literal"
        );
    }

    #[test]
    fn test_syntax_errors_point_at_offender() {
        let err = parse_err("$HttpApi(\"/users)");
        assert_eq!(err.code, ERR_DIRECTIVE_SYNTAX);
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.marker_start, 9);

        let err = parse_err("$HttpApi(\"/users\" \"POST\")");
        assert_eq!(err.message, "Expected ',' or ')' after argument");
        assert_eq!(err.marker_start, 18);

        let err = parse_err("$HttpApi(\"/users\",)");
        assert_eq!(err.message, "Expected an argument");

        let err = parse_err("$Fixed(");
        assert_eq!(err.message, "Missing closing parenthesis");

        let err = parse_err("$Fixed wraps the handler");
        assert_eq!(err.message, "Expected '(' or the end of the directive");
        assert_eq!(err.marker_start, 7);

        let err = parse_err("$Fixed() trailing");
        assert_eq!(err.message, "Unexpected characters after the argument list");
    }

    #[test]
    fn test_argument_validation() {
        assert_eq!(parse_err("$Fixed(1)").message, "$Fixed takes no arguments");
        assert_eq!(
            parse_err("$HttpApi(users)").message,
            "Path must be a string literal"
        );
        assert_eq!(
            parse_err("$HttpApi(\"users\")").message,
            "Path 'users' must start with '/'"
        );
        assert_eq!(
            parse_err("$HttpApi(\"/users\", FETCH)").message,
            "Unknown HTTP method 'FETCH'"
        );
        assert_eq!(
            parse_err("$HttpApi(\"/a\", GET, 3)").message,
            "Too many arguments: expected a path and an optional method"
        );
    }

    #[test]
    fn test_raw_annotation_keeps_literals() {
        let source = source();
        let site = DirectiveSite {
            source: &source,
            function: "createUser",
            declaration_start: 17,
        };
        let line = DirectiveLine::new("$Scheduled('a\\'b', -1.5, cron_7)", 4);
        let annotation = parse_annotation(&line, &site).ok().flatten().expect("annotation");
        assert_eq!(annotation.kind, DirectiveKind::Scheduled);
        let values: Vec<ArgValue> = annotation.args.into_iter().map(|a| a.value).collect();
        assert_eq!(
            values,
            vec![
                ArgValue::String("a'b".to_string()),
                ArgValue::Number("-1.5".to_string()),
                ArgValue::Identifier("cron_7".to_string()),
            ]
        );
    }
}
