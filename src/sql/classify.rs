//! Statement gatekeeping, query/exec classification, and the multi-statement
//! splitter `exec` uses.

use crate::error::{Error, Result};

/// The allowlisted introspection pragmas. Any other `PRAGMA` is rejected.
const ALLOWED_PRAGMAS: &[&str] = &[
    "table_info",
    "table_list",
    "index_list",
    "index_info",
    "foreign_key_list",
    "journal_mode",
];

/// Whether a statement should be run on the query path (returns
/// columns/rows) or the exec path (returns a change count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT`, `PRAGMA`, or `WITH` — returns rows.
    Query,
    /// Everything else — returns a change count.
    Exec,
}

/// Rejects `ATTACH`/`DETACH` outright and enforces the `PRAGMA` allowlist.
///
/// # Errors
/// Returns a policy error whose message contains `"not allowed"` if the
/// statement is denied.
pub fn check_allowed(sql: &str) -> Result<()> {
    let trimmed = sql.trim_start();
    let keyword = leading_keyword(trimmed);

    if keyword.eq_ignore_ascii_case("ATTACH") || keyword.eq_ignore_ascii_case("DETACH") {
        return Err(Error::policy(format!(
            "{} statements are not allowed",
            keyword.to_ascii_uppercase()
        )));
    }

    if keyword.eq_ignore_ascii_case("PRAGMA") {
        let pragma_name = pragma_name(trimmed);
        let allowed = ALLOWED_PRAGMAS
            .iter()
            .any(|p| pragma_name.eq_ignore_ascii_case(p));
        if !allowed {
            return Err(Error::policy("this PRAGMA is not allowed"));
        }
    }

    Ok(())
}

/// Classifies a (already-gatekept) statement as query or exec, by its
/// leading keyword.
#[must_use]
pub fn classify(sql: &str) -> StatementKind {
    let keyword = leading_keyword(sql.trim_start());
    if keyword.eq_ignore_ascii_case("SELECT")
        || keyword.eq_ignore_ascii_case("PRAGMA")
        || keyword.eq_ignore_ascii_case("WITH")
    {
        StatementKind::Query
    } else {
        StatementKind::Exec
    }
}

fn leading_keyword(sql: &str) -> &str {
    let end = sql
        .find(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .unwrap_or(sql.len());
    &sql[..end]
}

/// Extracts the pragma name from `PRAGMA name` or `PRAGMA name(...)`,
/// ignoring an optional database-schema qualifier and any `= value` or
/// `(args)` suffix.
fn pragma_name(sql: &str) -> &str {
    let after_keyword = sql
        .get(leading_keyword(sql).len()..)
        .unwrap_or("")
        .trim_start();
    let end = after_keyword
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(after_keyword.len());
    &after_keyword[..end]
}

/// Splits `sql` on `;` while honoring single-quoted string literals, where
/// `''` inside a literal is an escaped literal quote, not a terminator.
/// Trims each statement and drops empty ones.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' if in_string => {
                if chars.peek() == Some(&'\'') {
                    // Escaped quote: keep both characters, stay in the literal.
                    current.push('\'');
                    current.push('\'');
                    chars.next();
                } else {
                    in_string = false;
                    current.push(c);
                }
            }
            '\'' => {
                in_string = true;
                current.push(c);
            }
            ';' if !in_string => {
                push_if_nonempty(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_if_nonempty(&mut statements, &current);
    statements
}

fn push_if_nonempty(statements: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}
