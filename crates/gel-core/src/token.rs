//! Marker vocabulary of the annotated SQL dialect.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized marker, or one of the two sentinel tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Start,
    /// `--`
    Comment,
    /// `func`
    Func,
    /// `func!`
    ImFunc,
    /// `proc`
    Proc,
    /// `proc!`
    ImProc,
    /// `exec!`
    Exec,
    /// `|>`
    Query,
    Ident,
    Eof,
}

impl Token {
    /// Every marker token that has a literal form, in declaration order.
    pub const MARKERS: [Token; 7] = [
        Token::Comment,
        Token::Func,
        Token::ImFunc,
        Token::Proc,
        Token::ImProc,
        Token::Exec,
        Token::Query,
    ];

    /// The literal text of the marker. Sentinels have an empty literal.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Token::Comment => "--",
            Token::Func => "func",
            Token::ImFunc => "func!",
            Token::Proc => "proc",
            Token::ImProc => "proc!",
            Token::Exec => "exec!",
            Token::Query => "|>",
            Token::Start | Token::Ident | Token::Eof => "",
        }
    }

    /// Look up the token for a single word, ignoring case.
    ///
    /// Anything that is not a marker literal is an identifier.
    pub fn lookup(word: &str) -> Token {
        let word = word.to_ascii_lowercase();
        Self::MARKERS
            .into_iter()
            .find(|tok| tok.as_str() == word)
            .unwrap_or(Token::Ident)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
