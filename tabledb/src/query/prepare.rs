//! Placeholder substitution with escaping
//!
//! `prepare` fills a template such as
//! `SELECT * FROM posts WHERE id = %d AND status = %s` from a list of values.
//!
//! * `%d` is replaced by the integer value of the argument, unquoted.
//! * `%f` (or `%F`) by the float value with six fractional digits and a `.`
//!   separator whatever the locale.
//! * `%s` by the escaped value wrapped in single quotes. Templates that
//!   already quote the placeholder (`'%s'` or `"%s"`) get the same result.
//!   A `%s` directly after `%%` sits inside a literal the template quotes
//!   itself (`LIKE '%%%s%%'`) and is only escaped.
//! * `%%` by a literal `%`.
//!
//! Extra arguments are ignored; missing ones are an error.

use crate::database::types::SqlValue;
use crate::error::QueryError;
use crate::query::dialects::SqlDialect;
use crate::query::format::ColumnFormat;

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Literal(&'a str),
    Percent,
    Placeholder(ColumnFormat),
}

/// Split a template into literal runs and placeholders
fn tokenize(template: &str) -> Result<Vec<Token<'_>>, QueryError> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        if pos > 0 {
            tokens.push(Token::Literal(&rest[..pos]));
        }
        let after = &rest[pos + 1..];
        let spec = after
            .chars()
            .next()
            .ok_or_else(|| QueryError::InvalidFormat("%".to_string()))?;
        let token = match spec {
            '%' => Token::Percent,
            'd' => Token::Placeholder(ColumnFormat::Integer),
            'f' | 'F' => Token::Placeholder(ColumnFormat::Float),
            's' => Token::Placeholder(ColumnFormat::String),
            other => return Err(QueryError::InvalidFormat(format!("%{}", other))),
        };
        tokens.push(token);
        rest = &after[spec.len_utf8()..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }

    Ok(tokens)
}

/// Drop the quotes around already-quoted string placeholders
fn unquote_string_placeholders(template: &str) -> String {
    template.replace("'%s'", "%s").replace("\"%s\"", "%s")
}

/// Render one argument according to its placeholder
pub fn format_value(dialect: &dyn SqlDialect, format: ColumnFormat, value: &SqlValue) -> String {
    match format {
        ColumnFormat::Integer => value.integer_literal(),
        ColumnFormat::Float => {
            let f = value.as_float();
            format!("{:.6}", if f.is_finite() { f } else { 0.0 })
        }
        ColumnFormat::String => format!("'{}'", dialect.escape_string(&value.as_text())),
    }
}

/// Count the placeholders of a template
pub fn placeholder_count(template: &str) -> Result<usize, QueryError> {
    Ok(tokenize(template)?
        .iter()
        .filter(|t| matches!(t, Token::Placeholder(_)))
        .count())
}

/// Substitute `args` into `template`, escaping through `dialect`
///
/// # Errors
/// * [`QueryError::MissingTemplate`] when the template is empty
/// * [`QueryError::InvalidFormat`] for any specifier other than `%d`, `%f`,
///   `%F`, `%s` and `%%`
/// * [`QueryError::ArgumentCount`] when there are fewer arguments than
///   placeholders
pub fn prepare(
    dialect: &dyn SqlDialect,
    template: &str,
    args: &[SqlValue],
) -> Result<String, QueryError> {
    if template.is_empty() {
        return Err(QueryError::MissingTemplate);
    }

    let template = unquote_string_placeholders(template);
    let tokens = tokenize(&template)?;

    let expected = tokens
        .iter()
        .filter(|t| matches!(t, Token::Placeholder(_)))
        .count();
    if args.len() < expected {
        return Err(QueryError::ArgumentCount {
            expected,
            given: args.len(),
        });
    }
    if args.len() > expected {
        log::debug!(
            "prepare: {} extra argument(s) ignored for template {:?}",
            args.len() - expected,
            template
        );
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut args = args.iter();
    let mut after_percent = false;
    for token in tokens {
        let is_percent = token == Token::Percent;
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Percent => out.push('%'),
            Token::Placeholder(format) => {
                // counted above
                if let Some(value) = args.next() {
                    if after_percent && format == ColumnFormat::String {
                        out.push_str(&dialect.escape_string(&value.as_text()));
                    } else {
                        out.push_str(&format_value(dialect, format, value));
                    }
                }
            }
        }
        after_percent = is_percent;
    }

    Ok(out)
}
