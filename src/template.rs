// Template Rendering
// Replaces {{ expr }} placeholder spans with evaluated results

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::Context;
use crate::expression::evaluator::{evaluate, ExpressionError};

/// A placeholder span: `{{`, inner expression text without `}`, `}}`.
/// Each span ends at the first following `}}`.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([^}]+)\s*\}\}").expect("placeholder pattern")
});

/// Render `template`, replacing every `{{ expr }}` span with the
/// stringified result of evaluating `expr` against `ctx`.
///
/// Spans are evaluated left to right, each independently against the
/// same context; the first failing span fails the whole render. Nil
/// results render as the empty string, structured results as canonical
/// JSON. A template without spans is returned unchanged.
pub fn render(template: &str, ctx: &Context) -> Result<String, ExpressionError> {
    let mut output = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(span), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let expr = inner.as_str().trim();
        log::debug!("evaluating placeholder `{expr}`");
        let value = evaluate(expr, ctx)?;

        output.push_str(&template[last..span.start()]);
        output.push_str(&value.render_string());
        last = span.end();
    }
    output.push_str(&template[last..]);

    Ok(output)
}
