//! Pull-based JSON tokenizer: the live cursor over the wire input.
//!
//! Holds exactly one token of lookahead. Structure (comma and colon
//! placement, brace balance, trailing content) is validated here; whether
//! the token sequence matches the schema is the interpreter's business.

use memchr::memchr2;
use smol_str::SmolStr;

use crate::{Error, Result};

use super::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Expect {
    Value,
    FirstEntry,
    FirstItem,
    CommaOrEnd,
    Done,
}

#[derive(Debug)]
pub struct JsonLexer<'a> {
    input: &'a str,
    pos: usize,
    current: Option<Token>,
    scopes: Vec<Scope>,
    expect: Expect,
}

impl<'a> JsonLexer<'a> {
    /// Creates a lexer primed on the first token of `input`.
    pub fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Self {
            input,
            pos: 0,
            current: None,
            scopes: Vec::new(),
            expect: Expect::Value,
        };
        lexer.advance()?;
        Ok(lexer)
    }

    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    pub fn advance(&mut self) -> Result<()> {
        self.current = self.next_token()?;
        Ok(())
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        if self.pos == self.input.len() {
            if self.expect == Expect::Done || self.scopes.is_empty() {
                return Ok(None);
            }
            // Truncated inside a structure; surface as absent token and let
            // the interpreter report what it was expecting.
            return Ok(None);
        }
        match self.expect {
            Expect::Done => Err(self.syntax("trailing characters after value")),
            Expect::Value => self.lex_value().map(Some),
            Expect::FirstItem => {
                if self.peek() == b']' {
                    self.pos += 1;
                    self.close(Scope::Array).map(Some)
                } else {
                    self.lex_value().map(Some)
                }
            }
            Expect::FirstEntry => {
                if self.peek() == b'}' {
                    self.pos += 1;
                    self.close(Scope::Object).map(Some)
                } else {
                    self.lex_name().map(Some)
                }
            }
            Expect::CommaOrEnd => match (self.peek(), self.scopes.last().copied()) {
                (b',', Some(Scope::Object)) => {
                    self.pos += 1;
                    self.skip_whitespace();
                    self.lex_name().map(Some)
                }
                (b',', Some(Scope::Array)) => {
                    self.pos += 1;
                    self.skip_whitespace();
                    self.lex_value().map(Some)
                }
                (b'}', Some(Scope::Object)) => {
                    self.pos += 1;
                    self.close(Scope::Object).map(Some)
                }
                (b']', Some(Scope::Array)) => {
                    self.pos += 1;
                    self.close(Scope::Array).map(Some)
                }
                _ => Err(self.syntax("expected ',' or closing bracket")),
            },
        }
    }

    fn close(&mut self, scope: Scope) -> Result<Token> {
        self.scopes.pop();
        self.expect = if self.scopes.is_empty() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        };
        Ok(Token::bare(match scope {
            Scope::Object => TokenKind::EndObject,
            Scope::Array => TokenKind::EndArray,
        }))
    }

    fn lex_name(&mut self) -> Result<Token> {
        if self.pos == self.input.len() || self.peek() != b'"' {
            return Err(self.syntax("expected object key"));
        }
        let text = self.lex_string()?;
        self.skip_whitespace();
        if self.pos == self.input.len() || self.peek() != b':' {
            return Err(self.syntax("expected ':' after object key"));
        }
        self.pos += 1;
        self.expect = Expect::Value;
        Ok(Token::with_text(TokenKind::FieldName, text))
    }

    fn lex_value(&mut self) -> Result<Token> {
        if self.pos == self.input.len() {
            return Err(self.syntax("unexpected end of input"));
        }
        match self.peek() {
            b'{' => {
                self.pos += 1;
                self.scopes.push(Scope::Object);
                self.expect = Expect::FirstEntry;
                Ok(Token::bare(TokenKind::StartObject))
            }
            b'[' => {
                self.pos += 1;
                self.scopes.push(Scope::Array);
                self.expect = Expect::FirstItem;
                Ok(Token::bare(TokenKind::StartArray))
            }
            b'"' => {
                let text = self.lex_string()?;
                self.finish_scalar();
                Ok(Token::with_text(TokenKind::String, text))
            }
            b't' => self.lex_literal("true", TokenKind::True),
            b'f' => self.lex_literal("false", TokenKind::False),
            b'n' => self.lex_literal("null", TokenKind::Null),
            b'-' | b'0'..=b'9' => self.lex_number(),
            _ => Err(self.syntax("unexpected character")),
        }
    }

    fn lex_literal(&mut self, literal: &'static str, kind: TokenKind) -> Result<Token> {
        let end = self.pos + literal.len();
        if !self.input[self.pos..].starts_with(literal)
            || self
                .input
                .as_bytes()
                .get(end)
                .is_some_and(|b| b.is_ascii_alphanumeric())
        {
            return Err(self.syntax("invalid literal"));
        }
        self.pos = end;
        self.finish_scalar();
        Ok(Token::bare(kind))
    }

    fn lex_number(&mut self) -> Result<Token> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        if bytes[self.pos] == b'-' {
            self.pos += 1;
        }
        match bytes.get(self.pos) {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
            _ => return Err(self.syntax("invalid number")),
        }
        let mut float = false;
        if bytes.get(self.pos) == Some(&b'.') {
            float = true;
            self.pos += 1;
            if !self.digits()? {
                return Err(self.syntax("invalid number"));
            }
        }
        if matches!(bytes.get(self.pos), Some(b'e' | b'E')) {
            float = true;
            self.pos += 1;
            if matches!(bytes.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !self.digits()? {
                return Err(self.syntax("invalid number"));
            }
        }
        let text = SmolStr::new(&self.input[start..self.pos]);
        self.finish_scalar();
        Ok(Token::with_text(
            if float { TokenKind::Float } else { TokenKind::Int },
            text,
        ))
    }

    fn digits(&mut self) -> Result<bool> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        Ok(self.pos > start)
    }

    fn lex_string(&mut self) -> Result<SmolStr> {
        self.pos += 1; // opening quote
        let bytes = self.input.as_bytes();
        // fast path: no escapes, no control characters
        if let Some(idx) = memchr2(b'"', b'\\', &bytes[self.pos..]) {
            if bytes[self.pos + idx] == b'"' {
                let chunk = &self.input[self.pos..self.pos + idx];
                if chunk.bytes().all(|b| b >= 0x20) {
                    self.pos += idx + 1;
                    return Ok(SmolStr::new(chunk));
                }
            }
        }
        self.lex_string_slow()
    }

    fn lex_string_slow(&mut self) -> Result<SmolStr> {
        let mut out = String::new();
        loop {
            let bytes = self.input.as_bytes();
            let idx = memchr2(b'"', b'\\', &bytes[self.pos..])
                .ok_or_else(|| self.syntax("unterminated string"))?;
            let chunk = &self.input[self.pos..self.pos + idx];
            if chunk.bytes().any(|b| b < 0x20) {
                return Err(self.syntax("control character in string"));
            }
            out.push_str(chunk);
            self.pos += idx;
            if bytes[self.pos] == b'"' {
                self.pos += 1;
                return Ok(SmolStr::from(out));
            }
            self.pos += 1; // backslash
            let escape = *bytes
                .get(self.pos)
                .ok_or_else(|| self.syntax("unterminated string"))?;
            self.pos += 1;
            match escape {
                b'"' => out.push('"'),
                b'\\' => out.push('\\'),
                b'/' => out.push('/'),
                b'b' => out.push('\u{8}'),
                b'f' => out.push('\u{c}'),
                b'n' => out.push('\n'),
                b'r' => out.push('\r'),
                b't' => out.push('\t'),
                b'u' => {
                    let code = self.hex4()?;
                    let ch = if (0xD800..=0xDBFF).contains(&code) {
                        let bytes = self.input.as_bytes();
                        if bytes.get(self.pos) != Some(&b'\\')
                            || bytes.get(self.pos + 1) != Some(&b'u')
                        {
                            return Err(self.syntax("unpaired surrogate escape"));
                        }
                        self.pos += 2;
                        let low = self.hex4()?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(self.syntax("unpaired surrogate escape"));
                        }
                        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                        char::from_u32(combined)
                            .ok_or_else(|| self.syntax("invalid unicode escape"))?
                    } else {
                        char::from_u32(code)
                            .ok_or_else(|| self.syntax("invalid unicode escape"))?
                    };
                    out.push(ch);
                }
                _ => return Err(self.syntax("invalid escape")),
            }
        }
    }

    fn hex4(&mut self) -> Result<u32> {
        let hex = self
            .input
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.syntax("invalid unicode escape"))?;
        let code =
            u32::from_str_radix(hex, 16).map_err(|_| self.syntax("invalid unicode escape"))?;
        self.pos += 4;
        Ok(code)
    }

    fn finish_scalar(&mut self) {
        self.expect = if self.scopes.is_empty() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        };
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t' | b'\n' | b'\r') {
            self.pos += 1;
        }
    }

    fn peek(&self) -> u8 {
        self.input.as_bytes()[self.pos]
    }

    fn syntax(&self, message: &'static str) -> Error {
        Error::Syntax {
            message,
            offset: self.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = JsonLexer::new(input).unwrap();
        let mut out = Vec::new();
        while let Some(token) = lexer.current() {
            out.push(token.kind);
            lexer.advance().unwrap();
        }
        out
    }

    #[test]
    fn object_token_sequence() {
        assert_eq!(
            kinds(r#"{"a":1,"b":[true,null]}"#),
            vec![
                TokenKind::StartObject,
                TokenKind::FieldName,
                TokenKind::Int,
                TokenKind::FieldName,
                TokenKind::StartArray,
                TokenKind::True,
                TokenKind::Null,
                TokenKind::EndArray,
                TokenKind::EndObject,
            ]
        );
    }

    #[test]
    fn number_classification() {
        let mut lexer = JsonLexer::new("-12").unwrap();
        assert_eq!(lexer.current().unwrap().kind, TokenKind::Int);
        assert_eq!(lexer.current().unwrap().text, "-12");

        for input in ["1.5", "1e3", "-0.25E-2"] {
            let lexer = JsonLexer::new(input).unwrap();
            assert_eq!(lexer.current().unwrap().kind, TokenKind::Float, "{input}");
        }
    }

    #[test]
    fn string_escapes() {
        let lexer = JsonLexer::new(r#""a\nbé😀""#).unwrap();
        assert_eq!(lexer.current().unwrap().text, "a\nb\u{e9}\u{1F600}");
    }

    #[test]
    fn empty_containers() {
        assert_eq!(kinds("{}"), vec![TokenKind::StartObject, TokenKind::EndObject]);
        assert_eq!(kinds("[]"), vec![TokenKind::StartArray, TokenKind::EndArray]);
    }

    #[test]
    fn empty_input_has_no_token() {
        let lexer = JsonLexer::new("  ").unwrap();
        assert!(lexer.current().is_none());
    }

    #[test]
    fn rejects_trailing_garbage() {
        let mut lexer = JsonLexer::new("1 2").unwrap();
        assert!(lexer.advance().is_err());
    }

    #[test]
    fn rejects_missing_comma() {
        let mut lexer = JsonLexer::new("[1 2]").unwrap();
        lexer.advance().unwrap(); // onto 1
        assert!(lexer.advance().is_err());
    }

    #[test]
    fn rejects_bare_key() {
        let mut lexer = JsonLexer::new("{a:1}").unwrap();
        assert!(matches!(lexer.advance(), Err(Error::Syntax { .. })));
    }
}
