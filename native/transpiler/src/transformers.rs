//! One transform per directive. Each takes ownership of the candidate
//! statement and hands back what should stand in its place.

use oxc_ast::ast::Statement;

use crate::annotation::Directive;
use crate::context::TransformContext;
use crate::error::TranspileError;
use crate::function::exported_function_mut;
use crate::registry::TriggerDescriptor;
use crate::scope::LocalBindings;
use crate::template::{self, BODY_MARKER};

/// What happens to a top-level statement.
#[derive(Debug)]
pub enum Action<'a> {
    Keep,
    Replace(Statement<'a>),
    Drop,
}

pub fn apply<'a>(
    directive: &Directive,
    node: Statement<'a>,
    ctx: &mut TransformContext<'_, 'a>,
) -> Result<Action<'a>, TranspileError> {
    log::debug!("applying {} to '{}'", directive.kind(), ctx.current_function());
    match directive {
        Directive::Fixed => fixed(node, ctx).map(Action::Replace),
        Directive::TrackMetrics => track_metrics(node, ctx).map(Action::Replace),
        Directive::HttpApi { path, method } => {
            ctx.stage_trigger(TriggerDescriptor::HttpRoute {
                path: path.clone(),
                method: *method,
            });
            Ok(Action::Replace(node))
        }
        Directive::Scheduled { expression } => {
            ctx.stage_trigger(TriggerDescriptor::Schedule {
                expression: expression.clone(),
            });
            Ok(Action::Replace(node))
        }
        Directive::Ignored => Ok(Action::Drop),
    }
}

/// Normalises the function to the platform handler contract: async, result
/// wrapped in a `{ statusCode, body }` envelope, errors turned into a 500.
fn fixed<'a>(mut node: Statement<'a>, ctx: &mut TransformContext<'_, 'a>) -> Result<Statement<'a>, TranspileError> {
    ctx.locals = LocalBindings::collect(&node);
    let result = ctx.locals.fresh("__hatiResult");
    let error = ctx.locals.fresh("__hatiError");

    let code = format!(
        r#"try {{
  const {result} = await (async () => {{
    {marker};
  }})();
  if ({result} !== null && typeof {result} === "object" && "statusCode" in {result}) {{
    return {result};
  }}
  return {{ statusCode: 200, body: JSON.stringify({result} ?? null) }};
}} catch ({error}) {{
  return {{
    statusCode: 500,
    body: JSON.stringify({{ error: {error} instanceof Error ? {error}.message : String({error}) }}),
  }};
}}"#,
        result = result,
        error = error,
        marker = BODY_MARKER,
    );

    rewrite_body(&mut node, ctx, &code, true)?;
    ctx.stage_handler();
    Ok(node)
}

/// Wraps the body with start, error and duration log lines.
fn track_metrics<'a>(
    mut node: Statement<'a>,
    ctx: &mut TransformContext<'_, 'a>,
) -> Result<Statement<'a>, TranspileError> {
    ctx.locals = LocalBindings::collect(&node);
    let start = ctx.locals.fresh("__hatiStart");
    let error = ctx.locals.fresh("__hatiError");
    let name = serde_json::to_string(ctx.current_function())
        .map_err(|e| TranspileError::Template(e.to_string()))?;

    let code = format!(
        r#"const {start} = Date.now();
console.log(JSON.stringify({{ metric: "invocation", function: {name} }}));
try {{
  {marker};
}} catch ({error}) {{
  console.log(JSON.stringify({{ metric: "error", function: {name}, message: String({error}) }}));
  throw {error};
}} finally {{
  console.log(JSON.stringify({{ metric: "duration", function: {name}, durationMs: Date.now() - {start} }}));
}}"#,
        start = start,
        error = error,
        name = name,
        marker = BODY_MARKER,
    );

    rewrite_body(&mut node, ctx, &code, false)?;
    Ok(node)
}

fn rewrite_body<'a>(
    node: &mut Statement<'a>,
    ctx: &TransformContext<'_, 'a>,
    code: &str,
    make_async: bool,
) -> Result<(), TranspileError> {
    let ast = ctx.ast;
    let mut body = template::function_body(ast, code)?;
    let Some(mut function) = exported_function_mut(node) else {
        return Ok(());
    };

    let statements = function.take_statements(ast);
    if !template::splice(&mut body, statements) {
        return Err(TranspileError::Template(format!(
            "template has no {} marker",
            BODY_MARKER
        )));
    }
    function.replace_body(ast, body);
    if make_async {
        function.set_async();
        function.clear_return_type();
    }
    Ok(())
}
