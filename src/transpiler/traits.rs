//! Identifier escaping and placeholder styles.

use crate::ast::Value;
use crate::transpiler::Placeholders;

/// Trait for converting compiled nodes to SQL text.
pub trait ToSql {
    fn to_sql(&self) -> String;
}

/// SQL reserved words that must be quoted when used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "order",
    "group",
    "user",
    "table",
    "select",
    "from",
    "where",
    "join",
    "left",
    "right",
    "inner",
    "outer",
    "on",
    "and",
    "or",
    "not",
    "null",
    "true",
    "false",
    "limit",
    "offset",
    "as",
    "in",
    "is",
    "like",
    "between",
    "having",
    "union",
    "all",
    "distinct",
    "case",
    "when",
    "then",
    "else",
    "end",
    "create",
    "alter",
    "drop",
    "insert",
    "update",
    "delete",
    "index",
    "key",
    "primary",
    "foreign",
    "references",
    "default",
    "constraint",
    "check",
];

/// Escape an identifier if it's a reserved word or contains special chars.
/// Handles dotted identifiers (e.g., `table.column`) by quoting each part.
pub fn escape_identifier(name: &str) -> String {
    if name.contains('.') {
        return name
            .split('.')
            .map(escape_single_identifier)
            .collect::<Vec<_>>()
            .join(".");
    }
    escape_single_identifier(name)
}

fn escape_single_identifier(name: &str) -> String {
    let lower = name.to_lowercase();
    let needs_escaping = RESERVED_WORDS.contains(&lower.as_str())
        || name.chars().any(|c| !c.is_alphanumeric() && c != '_')
        || name.chars().next().map(|c| c.is_numeric()).unwrap_or(false);

    if needs_escaping {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

/// How a driver spells bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `:v1` (as compiled).
    Named,
    /// `?` (SQLite, MySQL).
    Question,
    /// `$1` (PostgreSQL).
    Dollar,
}

impl PlaceholderStyle {
    /// Guess the style from a connection URL.
    pub fn for_url(url: &str) -> Self {
        if url.starts_with("postgres") {
            PlaceholderStyle::Dollar
        } else {
            PlaceholderStyle::Question
        }
    }

    fn placeholder(&self, name: &str, index: usize) -> String {
        match self {
            PlaceholderStyle::Named => format!(":{}", name),
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Dollar => format!("${}", index),
        }
    }
}

/// Rewrite the named placeholders in compiled SQL to `style`.
///
/// Returns the rewritten text and the values in the order they must be
/// bound: one entry per occurrence, in textual order. Quoted identifiers are
/// copied untouched.
pub fn to_positional(
    sql: &str,
    placeholders: &Placeholders,
    style: PlaceholderStyle,
) -> (String, Vec<Value>) {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut chars = sql.char_indices();
    let mut quoted = false;

    while let Some((i, c)) = chars.next() {
        if c == '"' {
            quoted = !quoted;
            out.push(c);
            continue;
        }
        if quoted || c != ':' {
            out.push(c);
            continue;
        }

        let rest = &sql[i + 1..];
        let digits = rest
            .strip_prefix('v')
            .map(|tail| tail.chars().take_while(|d| d.is_ascii_digit()).count())
            .unwrap_or(0);
        if digits == 0 {
            out.push(c);
            continue;
        }
        let name = &rest[..digits + 1];
        match placeholders.get(name) {
            Some(value) => {
                values.push(value.clone());
                out.push_str(&style.placeholder(name, values.len()));
                for _ in 0..name.len() {
                    chars.next();
                }
            }
            None => out.push(c),
        }
    }
    (out, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("blogs.user_id"), "blogs.user_id");
        assert_eq!(escape_identifier("user.order"), "\"user\".\"order\"");
        assert_eq!(escape_identifier("2fa"), "\"2fa\"");
    }

    #[test]
    fn test_to_positional() {
        let mut placeholders = Placeholders::default();
        let v1 = placeholders.add(Value::Integer(1));
        let v2 = placeholders.add(Value::from("x"));
        assert_eq!((v1.as_str(), v2.as_str()), ("v1", "v2"));

        let sql = "SELECT * FROM (SELECT * FROM a WHERE a.x = :v2) AS t1 WHERE t1.y = :v1";
        let (rewritten, values) = to_positional(sql, &placeholders, PlaceholderStyle::Dollar);
        assert_eq!(
            rewritten,
            "SELECT * FROM (SELECT * FROM a WHERE a.x = $1) AS t1 WHERE t1.y = $2"
        );
        assert_eq!(values, vec![Value::from("x"), Value::Integer(1)]);

        let (rewritten, _) = to_positional(sql, &placeholders, PlaceholderStyle::Question);
        assert_eq!(
            rewritten,
            "SELECT * FROM (SELECT * FROM a WHERE a.x = ?) AS t1 WHERE t1.y = ?"
        );
    }

    #[test]
    fn test_to_positional_skips_quoted_and_unknown() {
        let mut placeholders = Placeholders::default();
        placeholders.add(Value::Integer(7));
        let sql = "SELECT \"a:v1\" FROM t WHERE t.x = :v1 AND t.y = :v9";
        let (rewritten, values) = to_positional(sql, &placeholders, PlaceholderStyle::Question);
        assert_eq!(rewritten, "SELECT \"a:v1\" FROM t WHERE t.x = ? AND t.y = :v9");
        assert_eq!(values, vec![Value::Integer(7)]);
    }
}
