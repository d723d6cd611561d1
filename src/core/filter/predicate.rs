//! Predicate tree and its SQL rendering

use rusqlite::types::Value;

/// A WHERE-clause fragment built from search options
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`
    Eq { column: &'static str, value: Value },
    /// Substring match, case-insensitive for ASCII letters only (SQLite `LOWER`)
    Contains { column: &'static str, needle: String },
    /// `column IS NULL`
    IsNull { column: &'static str },
    /// Disjunction; empty matches nothing
    Any(Vec<Predicate>),
    /// Conjunction; empty matches everything
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn eq_int(column: &'static str, value: i64) -> Self {
        Predicate::Eq {
            column,
            value: Value::Integer(value),
        }
    }

    pub fn eq_text(column: &'static str, value: impl Into<String>) -> Self {
        Predicate::Eq {
            column,
            value: Value::Text(value.into()),
        }
    }

    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            column,
            needle: needle.into(),
        }
    }

    /// AND this predicate with another
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::All(mut parts) => {
                parts.push(other);
                Predicate::All(parts)
            }
            first => Predicate::All(vec![first, other]),
        }
    }

    /// Render as SQL with anonymous `?` placeholders, in parameter order
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write(&mut sql, &mut params);
        (sql, params)
    }

    fn write(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Predicate::Eq { column, value } => {
                sql.push_str(column);
                sql.push_str(" = ?");
                params.push(value.clone());
            }
            Predicate::Contains { column, needle } => {
                sql.push_str("LOWER(");
                sql.push_str(column);
                sql.push_str(") LIKE ? ESCAPE '\\'");
                params.push(Value::Text(format!(
                    "%{}%",
                    escape_like(&needle.to_ascii_lowercase())
                )));
            }
            Predicate::IsNull { column } => {
                sql.push_str(column);
                sql.push_str(" IS NULL");
            }
            Predicate::Any(parts) => Self::write_joined(parts, " OR ", "0", sql, params),
            Predicate::All(parts) => Self::write_joined(parts, " AND ", "1", sql, params),
        }
    }

    fn write_joined(
        parts: &[Predicate],
        separator: &str,
        empty: &str,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) {
        match parts {
            [] => sql.push_str(empty),
            [only] => only.write(sql, params),
            _ => {
                sql.push('(');
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(separator);
                    }
                    part.write(sql, params);
                }
                sql.push(')');
            }
        }
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
