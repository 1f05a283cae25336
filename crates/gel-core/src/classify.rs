//! Line classifier.
//!
//! Classification depends only on a line's raw text, never on the state of
//! an expansion pass, so reclassifying the same text always gives the same
//! answer.
//!
//! Markers are matched anywhere in the line by default. A marker that
//! appears inside an identifier or a string literal (`myfunc`, `'proc'`)
//! still matches. [`MatchMode::Word`] is an opt-in stricter mode.

use crate::token::Token;
use serde::{Deserialize, Serialize};

/// How marker literals are located in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Unanchored substring containment.
    #[default]
    Substring,
    /// The marker must not touch identifier characters. A marker ending in
    /// a symbol (`exec!`, `|>`) may be glued to what follows it.
    Word,
}

/// Answers marker and shape questions about raw line text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    mode: MatchMode,
}

impl Classifier {
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether `text` carries the given marker.
    ///
    /// Sentinel tokens have no literal and never match.
    pub fn is_marker(&self, token: Token, text: &str) -> bool {
        let literal = token.as_str();
        if literal.is_empty() {
            return false;
        }

        match self.mode {
            MatchMode::Substring => text.contains(literal),
            MatchMode::Word => {
                let open_end = literal.chars().next_back().is_some_and(is_ident_char);
                text.match_indices(literal).any(|(start, _)| {
                    let before = text[..start].chars().next_back();
                    let after = text[start + literal.len()..].chars().next();
                    !before.is_some_and(is_ident_char)
                        && !(open_end && after.is_some_and(is_ident_char))
                })
            }
        }
    }

    /// Snapshot every marker and shape predicate for `text`.
    pub fn classify(&self, text: &str) -> Classification {
        Classification {
            comment: self.is_marker(Token::Comment, text),
            func: self.is_marker(Token::Func, text),
            im_func: self.is_marker(Token::ImFunc, text),
            proc: self.is_marker(Token::Proc, text),
            im_proc: self.is_marker(Token::ImProc, text),
            exec: self.is_marker(Token::Exec, text),
            query: self.is_marker(Token::Query, text),
            empty: is_empty(text),
            whitespace_leading: is_whitespace_leading(text),
            newline: is_newline(text),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A line with no non-whitespace characters.
pub fn is_empty(text: &str) -> bool {
    text.trim().is_empty()
}

/// A line whose first character is whitespace, i.e. a block body line.
pub fn is_whitespace_leading(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_whitespace)
}

/// A line that is exactly one newline character.
pub fn is_newline(text: &str) -> bool {
    text == "\n"
}

/// The result of classifying one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub comment: bool,
    pub func: bool,
    pub im_func: bool,
    pub proc: bool,
    pub im_proc: bool,
    pub exec: bool,
    pub query: bool,
    pub empty: bool,
    pub whitespace_leading: bool,
    pub newline: bool,
}

impl Classification {
    /// Whether the given marker was found.
    pub fn has(&self, token: Token) -> bool {
        match token {
            Token::Comment => self.comment,
            Token::Func => self.func,
            Token::ImFunc => self.im_func,
            Token::Proc => self.proc,
            Token::ImProc => self.im_proc,
            Token::Exec => self.exec,
            Token::Query => self.query,
            Token::Start | Token::Ident | Token::Eof => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_matching() {
        let c = Classifier::default();

        assert!(c.is_marker(Token::ImFunc, "func! add(a int) returns int"));
        assert!(c.is_marker(Token::Func, "func! add(a int) returns int"));
        assert!(c.is_marker(Token::Proc, "  select 'proc' from t"));
        assert!(c.is_marker(Token::Func, "create function x"));
        assert!(c.is_marker(Token::Query, "  |> select 1"));
        assert!(c.is_marker(Token::Exec, "  exec! stmt;"));
        assert!(!c.is_marker(Token::ImProc, "proc p()"));
        assert!(!c.is_marker(Token::Ident, "anything"));
        assert!(!c.is_marker(Token::Eof, ""));
    }

    #[test]
    fn test_word_matching() {
        let c = Classifier::new(MatchMode::Word);

        assert!(c.is_marker(Token::ImFunc, "func! add(a int) returns int"));
        assert!(c.is_marker(Token::Func, "func add(a int)"));
        assert!(!c.is_marker(Token::Func, "create function x"));
        assert!(!c.is_marker(Token::ImFunc, "myfunc! x"));
        assert!(c.is_marker(Token::Proc, "select 'proc' from t"));
        assert!(c.is_marker(Token::Exec, "\texec! stmt;"));
        assert!(c.is_marker(Token::Func, "x function y func"));
    }

    #[test]
    fn test_shapes() {
        assert!(is_empty(""));
        assert!(is_empty("   \t"));
        assert!(!is_empty("  x"));

        assert!(is_whitespace_leading("  select 1;"));
        assert!(is_whitespace_leading("\tselect 1;"));
        assert!(!is_whitespace_leading("select 1;"));
        assert!(!is_whitespace_leading(""));

        assert!(is_newline("\n"));
        assert!(!is_newline(""));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let c = Classifier::default();
        let lines = [
            "func! add(a int, b int) returns int as $body$ return a+b; $body$",
            "  |> select * from t where id = {{id}}",
            "-- a comment",
            "   ",
            "proc! p()",
        ];

        for line in lines {
            assert_eq!(c.classify(line), c.classify(line));
        }
    }

    #[test]
    fn test_classification_snapshot() {
        let c = Classifier::default();
        let classification = c.classify("proc! run() -- entry");

        assert!(classification.has(Token::Comment));
        assert!(classification.has(Token::Proc));
        assert!(classification.has(Token::ImProc));
        assert!(!classification.has(Token::Func));
        assert!(!classification.has(Token::Eof));
        assert!(!classification.empty);
        assert!(!classification.whitespace_leading);
    }

    #[test]
    fn test_word_matching_allows_glued_symbol_markers() {
        let c = Classifier::new(MatchMode::Word);

        assert!(c.is_marker(Token::Exec, "  exec!stmt;"));
        assert!(c.is_marker(Token::Query, "  |>select {{id}};"));
        assert!(c.is_marker(Token::ImProc, "proc!run()"));
        assert!(!c.is_marker(Token::Exec, "  myexec!stmt;"));
        assert!(!c.is_marker(Token::Func, "  funcs()"));
    }
}
