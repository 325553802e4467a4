//! Tokens and cursors.
//!
//! Exactly one cursor is live at any instant: either the pull tokenizer over
//! the wire input or a replay cursor over a captured token tree. The decoder
//! swaps between them only at field entry/exit boundaries, so every read
//! routine is oblivious to which one it is pulling from.

pub mod lexer;
pub mod replay;

use std::fmt;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::{Error, Result};

use lexer::JsonLexer;
use replay::ReplayCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName,
    String,
    Int,
    Float,
    True,
    False,
    Null,
}

impl TokenKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Float)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::StartObject => "start-object",
            TokenKind::EndObject => "end-object",
            TokenKind::StartArray => "start-array",
            TokenKind::EndArray => "end-array",
            TokenKind::FieldName => "field-name",
            TokenKind::String => "string",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// One token event. Structural tokens and literals carry no payload; names,
/// strings and numbers keep their (unescaped) text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
}

impl Token {
    pub(crate) fn bare(kind: TokenKind) -> Self {
        Self {
            kind,
            text: SmolStr::default(),
        }
    }

    pub(crate) fn with_text(kind: TokenKind, text: SmolStr) -> Self {
        Self { kind, text }
    }
}

/// A captured token subtree: one complete JSON value in event order.
/// Reading past its end yields no tokens rather than wrapping or panicking.
pub(crate) type TokenTree = SmallVec<[Token; 4]>;

/// The one-of-two cursor the interpreters pull from.
#[derive(Debug)]
pub(crate) enum Cursor<'a> {
    Live(JsonLexer<'a>),
    Replay(ReplayCursor),
}

impl<'a> Cursor<'a> {
    pub fn current(&self) -> Option<&Token> {
        match self {
            Cursor::Live(lexer) => lexer.current(),
            Cursor::Replay(replay) => replay.current(),
        }
    }

    pub fn kind(&self) -> Option<TokenKind> {
        self.current().map(|token| token.kind)
    }

    pub fn advance(&mut self) -> Result<()> {
        match self {
            Cursor::Live(lexer) => lexer.advance(),
            Cursor::Replay(replay) => {
                replay.advance();
                Ok(())
            }
        }
    }

    /// If positioned on a start token, moves to the matching end token
    /// without materializing anything in between. Scalars are left alone.
    pub fn skip_subtree(&mut self) -> Result<()> {
        let mut level = match self.kind() {
            Some(TokenKind::StartObject | TokenKind::StartArray) => 1usize,
            _ => return Ok(()),
        };
        while level > 0 {
            self.advance()?;
            match self.kind() {
                Some(TokenKind::StartObject | TokenKind::StartArray) => level += 1,
                Some(TokenKind::EndObject | TokenKind::EndArray) => level -= 1,
                Some(_) => {}
                None => return Err(Error::UnexpectedEof),
            }
        }
        Ok(())
    }

    /// Token kind name for error messages, or "end of input".
    pub fn describe(&self) -> String {
        match self.kind() {
            Some(kind) => kind.to_string(),
            None => "end of input".to_string(),
        }
    }
}

/// Buffers the complete value under the cursor (scalar or balanced subtree)
/// and leaves the cursor on the first token past it.
pub(crate) fn capture_tree(cursor: &mut Cursor<'_>) -> Result<TokenTree> {
    let mut tree = TokenTree::new();
    let mut level = 0usize;
    loop {
        let token = cursor
            .current()
            .ok_or(Error::UnexpectedEof)?
            .clone();
        match token.kind {
            TokenKind::StartObject | TokenKind::StartArray => level += 1,
            TokenKind::EndObject | TokenKind::EndArray => level -= 1,
            _ => {}
        }
        tree.push(token);
        cursor.advance()?;
        if level == 0 {
            break;
        }
    }
    Ok(tree)
}
