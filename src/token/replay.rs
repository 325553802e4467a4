//! Cursor over a captured token tree.
//!
//! Conforms to the same pull contract as the live lexer but reads from the
//! buffered events of one field value. Location tracking and raw input
//! access are not available here; the interpreter never asks for them while
//! replaying, since buffered tokens were already validated live.

use super::{Token, TokenTree};

#[derive(Debug)]
pub struct ReplayCursor {
    tokens: TokenTree,
    pos: usize,
}

impl ReplayCursor {
    pub(crate) fn new(tokens: TokenTree) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Steps past the end are absorbed; `current` then stays `None`, which
    /// the interpreter reports as a type mismatch rather than reading stale
    /// data.
    pub fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{capture_tree, Cursor, TokenKind};
    use crate::token::lexer::JsonLexer;

    #[test]
    fn replays_captured_value() {
        let mut cursor = Cursor::Live(JsonLexer::new(r#"{"k":[1,2]}"#).unwrap());
        cursor.advance().unwrap(); // field k
        cursor.advance().unwrap(); // start-array
        let tree = capture_tree(&mut cursor).unwrap();

        let mut replay = ReplayCursor::new(tree);
        assert_eq!(replay.current().unwrap().kind, TokenKind::StartArray);
        replay.advance();
        assert_eq!(replay.current().unwrap().text, "1");
        replay.advance();
        replay.advance();
        assert_eq!(replay.current().unwrap().kind, TokenKind::EndArray);
        replay.advance();
        assert!(replay.current().is_none());
        replay.advance();
        assert!(replay.current().is_none());
    }
}
