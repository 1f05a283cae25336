//! Block states of the expansion pass.

use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of routine block is currently open.
///
/// At most one block is open at any point of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockState {
    /// Outside any block.
    #[default]
    Start,
    Function,
    ImmutableFunction,
    Procedure,
    ImmutableProcedure,
}

impl BlockState {
    /// The block state a marker opens, if it is an opener.
    pub fn opened_by(token: Token) -> Option<Self> {
        match token {
            Token::Func => Some(BlockState::Function),
            Token::ImFunc => Some(BlockState::ImmutableFunction),
            Token::Proc => Some(BlockState::Procedure),
            Token::ImProc => Some(BlockState::ImmutableProcedure),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        *self != BlockState::Start
    }

    pub fn is_procedure(&self) -> bool {
        matches!(
            self,
            BlockState::Procedure | BlockState::ImmutableProcedure
        )
    }

    /// Language clause emitted on the lines after a block header.
    pub fn language_clause(&self) -> &'static str {
        match self {
            BlockState::Start => "",
            BlockState::Function | BlockState::ImmutableFunction => "LANGUAGE sql AS $$",
            BlockState::Procedure | BlockState::ImmutableProcedure => {
                "LANGUAGE plpgsql AS $$\nDECLARE"
            }
        }
    }

    /// Statement terminating the block, including the trailing space and newline.
    ///
    /// The mutable forms carry `IMMUTABLE` and the `!` forms do not.
    pub fn closing(&self) -> &'static str {
        match self {
            BlockState::Start => "",
            BlockState::Function => "$$ IMMUTABLE; \n",
            BlockState::ImmutableFunction => "$$ ; \n",
            BlockState::Procedure => "END; $$ IMMUTABLE; \n",
            BlockState::ImmutableProcedure => "END; $$ ; \n",
        }
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockState::Start => "START",
            BlockState::Function => "FUNC",
            BlockState::ImmutableFunction => "IMFUNC",
            BlockState::Procedure => "PROC",
            BlockState::ImmutableProcedure => "IMPROC",
        };
        f.write_str(name)
    }
}
