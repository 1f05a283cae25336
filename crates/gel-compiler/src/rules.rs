//! Per-line rewrite rules.
//!
//! Each function here turns one raw line into its emitted text. Which rule
//! applies to a line is decided by the [`Expander`](crate::Expander).

use gel_core::{BlockState, Token};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Block openers in match order. The first marker found in a line wins, so
/// the `!` forms come before the plain ones that are their prefixes.
pub const OPENERS: [(Token, BlockState); 4] = [
    (Token::ImFunc, BlockState::ImmutableFunction),
    (Token::Func, BlockState::Function),
    (Token::ImProc, BlockState::ImmutableProcedure),
    (Token::Proc, BlockState::Procedure),
];

const QUERY_PREFIX: &str = "|> ";
const EXEC_REPLACEMENT: &str = "EXECUTE ";

fn quoted_var() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\{\{(.*?)\}\}").expect("static pattern"))
}

fn plain_var() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").expect("static pattern"))
}

/// Drop/create pair emitted before the first line of a namespace.
pub fn schema_header(namespace: &str) -> String {
    format!("drop schema if exists {namespace} cascade;\ncreate schema {namespace};\n")
}

/// Fully qualified name prefix substituted for an opener marker.
pub fn function_name(namespace: &str) -> String {
    format!("function {}.", namespace.trim())
}

/// Rewrite an opener line into a `CREATE OR REPLACE` header followed by the
/// language clause of `state`.
///
/// Every occurrence of the marker followed by one space is replaced.
pub fn open_block(line: &str, namespace: &str, token: Token, state: BlockState) -> String {
    let marker = format!("{} ", token.as_str());
    let header = line.replace(&marker, &function_name(namespace));
    format!("CREATE OR REPLACE {header}\n{}", state.language_clause())
}

/// `exec!` → `EXECUTE `.
pub fn expand_exec(line: &str) -> String {
    line.replace(Token::Exec.as_str(), EXEC_REPLACEMENT)
}

/// Expand a `|>` query-building line into a dynamic query string fragment.
///
/// `#{{expr}}` becomes `'''||expr||'''` and `{{expr}}` becomes `'||expr||'`.
/// Unbalanced delimiters are left as they are. The first quote of the result
/// gets a space after it.
pub fn expand_query(line: &str) -> String {
    let statement = line.replace(QUERY_PREFIX, "");
    let statement = quoted_var().replace_all(&statement, |caps: &Captures| {
        format!("'''||{}||'''", &caps[1])
    });
    let statement = plain_var().replace_all(&statement, |caps: &Captures| {
        format!("'||{}||'", &caps[1])
    });
    statement.replacen('\'', "' ", 1)
}

/// Whether a line carries a continuation marker: a backslash or `$SQL`.
pub fn has_continuation(line: &str) -> bool {
    line.contains('\\') || line.contains("$SQL")
}

/// Resolve `this.` to the enclosing namespace and route `getv(` through `vars`.
pub fn expand_scope(line: &str, namespace: &str) -> String {
    line.replace("this.", &format!("{namespace}."))
        .replace("getv(", "vars.getv(")
}

/// Raw line with its origin appended as a comment.
pub fn expand_default(line: &str, namespace: &str, position: usize) -> String {
    format!("{line} -- {namespace}:{position}")
}
