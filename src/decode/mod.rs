//! Grammar interpreter, decode side.
//!
//! The decoder walks the symbol stack compiled from a schema while pulling
//! tokens from the current cursor. JSON objects may present record fields in
//! any order, but the grammar expects declaration order; fields that arrive
//! early are captured as token trees into the current reorder scope, and when
//! the grammar later asks for one, a replay cursor is swapped in over the
//! buffered tree and the live cursor is parked until the field ends. Only
//! skipped fields are buffered, so memory stays proportional to the degree of
//! disorder.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};
use smol_str::SmolStr;

use crate::grammar::{self, stack::SymbolStack, Symbol};
use crate::schema::Schema;
use crate::text;
use crate::token::lexer::JsonLexer;
use crate::token::replay::ReplayCursor;
use crate::token::{capture_tree, Cursor, TokenKind, TokenTree};
use crate::{DecodeOptions, Error, Result};

/// Decodes one JSON value conforming to `schema` into a `serde_json::Value`,
/// rejecting trailing input.
pub fn from_str(schema: &Schema, input: &str, options: &DecodeOptions) -> Result<Value> {
    let mut decoder = Decoder::new(schema, input, options)?;
    let value = read_value(&mut decoder, schema)?;
    decoder.finish()?;
    Ok(value)
}

/// Out-of-order fields of one open record, keyed by name, plus the live
/// cursor parked here while one of them is being replayed.
#[derive(Debug, Default)]
struct ReorderBuffer<'a> {
    saved: HashMap<SmolStr, TokenTree>,
    parked: Option<Cursor<'a>>,
}

/// Schema-directed JSON decoder.
///
/// Not safe to share across threads, and not safe to keep using after any
/// method returned an error: a record left partially read has pending
/// buffers and grammar state that no longer line up with the input.
#[derive(Debug)]
pub struct Decoder<'a> {
    stack: SymbolStack,
    cursor: Cursor<'a>,
    reorder_stack: Vec<Option<ReorderBuffer<'a>>>,
    current_reorder: Option<ReorderBuffer<'a>>,
    options: DecodeOptions,
}

impl<'a> Decoder<'a> {
    pub fn new(schema: &Schema, input: &'a str, options: &DecodeOptions) -> Result<Self> {
        Ok(Self {
            stack: SymbolStack::new(grammar::root_symbol(schema)),
            cursor: Cursor::Live(JsonLexer::new(input)?),
            reorder_stack: Vec::new(),
            current_reorder: None,
            options: options.clone(),
        })
    }

    pub fn read_null(&mut self) -> Result<()> {
        self.advance(&Symbol::Null)?;
        if self.cursor.kind() != Some(TokenKind::Null) {
            return Err(self.type_error("null"));
        }
        self.cursor.advance()
    }

    pub fn read_boolean(&mut self) -> Result<bool> {
        self.advance(&Symbol::Boolean)?;
        let value = match self.cursor.kind() {
            Some(TokenKind::True) => true,
            Some(TokenKind::False) => false,
            _ => return Err(self.type_error("boolean")),
        };
        self.cursor.advance()?;
        Ok(value)
    }

    pub fn read_int(&mut self) -> Result<i32> {
        self.advance(&Symbol::Int)?;
        let text = self.numeric_text("int")?;
        let value = text.parse::<i32>().map_err(|_| Error::NumberOutOfRange {
            expected: "int",
            text: text.to_string(),
        })?;
        self.cursor.advance()?;
        Ok(value)
    }

    pub fn read_long(&mut self) -> Result<i64> {
        self.advance(&Symbol::Long)?;
        let text = self.numeric_text("long")?;
        let value = text.parse::<i64>().map_err(|_| Error::NumberOutOfRange {
            expected: "long",
            text: text.to_string(),
        })?;
        self.cursor.advance()?;
        Ok(value)
    }

    pub fn read_float(&mut self) -> Result<f32> {
        self.advance(&Symbol::Float)?;
        let text = self.numeric_text("float")?;
        let value = text.parse::<f32>().map_err(|_| Error::NumberOutOfRange {
            expected: "float",
            text: text.to_string(),
        })?;
        self.cursor.advance()?;
        Ok(value)
    }

    /// `double` additionally accepts a string token so non-finite values
    /// round-trip ("NaN", "Infinity", "-Infinity").
    pub fn read_double(&mut self) -> Result<f64> {
        self.advance(&Symbol::Double)?;
        let text = match self.cursor.current() {
            Some(token) if token.kind.is_numeric() || token.kind == TokenKind::String => {
                token.text.clone()
            }
            _ => return Err(self.type_error("double")),
        };
        let value = text.parse::<f64>().map_err(|_| Error::NumberOutOfRange {
            expected: "double",
            text: text.to_string(),
        })?;
        self.cursor.advance()?;
        Ok(value)
    }

    /// Reads a string value, or a map key when the grammar marks the next
    /// string as one (keys arrive as field-name tokens, not string tokens).
    pub fn read_string(&mut self) -> Result<String> {
        self.advance(&Symbol::String)?;
        let expected = if self.stack.top() == Some(&Symbol::MapKeyMarker) {
            self.advance_symbol(&Symbol::MapKeyMarker)?;
            TokenKind::FieldName
        } else {
            TokenKind::String
        };
        let text = match self.cursor.current() {
            Some(token) if token.kind == expected => token.text.clone(),
            _ if expected == TokenKind::FieldName => return Err(self.type_error("map-key")),
            _ => return Err(self.type_error("string")),
        };
        self.cursor.advance()?;
        Ok(text.to_string())
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.advance(&Symbol::Bytes)?;
        let text = match self.cursor.current() {
            Some(token) if token.kind == TokenKind::String => token.text.clone(),
            _ => return Err(self.type_error("bytes")),
        };
        let bytes = text::bytes_from_text(&text)?;
        self.cursor.advance()?;
        Ok(bytes)
    }

    /// Reads a fixed of the caller-declared length. The declared length is
    /// checked against the grammar's recorded size, and the decoded payload
    /// against the declared length; the two failures are distinct errors.
    pub fn read_fixed(&mut self, len: usize) -> Result<Vec<u8>> {
        self.advance(&Symbol::Fixed)?;
        let size = match self.stack.pop() {
            Some(Symbol::FixedSize(size)) => size,
            other => return Err(symbol_mismatch("fixed-size", other)),
        };
        if size != len {
            return Err(Error::FixedLengthMismatch {
                expected: size,
                actual: len,
            });
        }
        let text = match self.cursor.current() {
            Some(token) if token.kind == TokenKind::String => token.text.clone(),
            _ => return Err(self.type_error("fixed")),
        };
        let bytes = text::bytes_from_text(&text)?;
        if bytes.len() != len {
            return Err(Error::FixedContentMismatch {
                expected: len,
                actual: bytes.len(),
            });
        }
        self.cursor.advance()?;
        Ok(bytes)
    }

    /// Reads an enum value, returning its index in the schema's symbol set.
    pub fn read_enum(&mut self) -> Result<usize> {
        self.advance(&Symbol::Enum)?;
        let labels = match self.stack.pop() {
            Some(Symbol::EnumLabels(labels)) => labels,
            other => return Err(symbol_mismatch("enum-labels", other)),
        };
        let text = match self.cursor.current() {
            Some(token) if token.kind == TokenKind::String => token.text.clone(),
            _ => return Err(self.type_error("enum")),
        };
        let index = labels
            .iter()
            .position(|label| *label == text)
            .ok_or_else(|| Error::UnknownEnumSymbol(text.to_string()))?;
        self.cursor.advance()?;
        Ok(index)
    }

    /// Enters an array; returns whether a first element follows.
    pub fn read_array_start(&mut self) -> Result<bool> {
        self.advance(&Symbol::ArrayStart)?;
        if self.cursor.kind() != Some(TokenKind::StartArray) {
            return Err(self.type_error("array-start"));
        }
        self.cursor.advance()?;
        self.array_next_inner()
    }

    /// After an element: whether another element follows.
    pub fn array_next(&mut self) -> Result<bool> {
        self.advance(&Symbol::ItemEnd)?;
        self.array_next_inner()
    }

    fn array_next_inner(&mut self) -> Result<bool> {
        if self.cursor.kind() == Some(TokenKind::EndArray) {
            self.advance_symbol(&Symbol::ArrayEnd)?;
            self.cursor.advance()?;
            Ok(false)
        } else {
            Ok(true)
        }
    }

    /// Skips a whole array without decoding its elements.
    pub fn skip_array(&mut self) -> Result<()> {
        self.advance(&Symbol::ArrayStart)?;
        if self.cursor.kind() != Some(TokenKind::StartArray) {
            return Err(self.type_error("array-start"));
        }
        self.cursor.skip_subtree()?;
        self.cursor.advance()?;
        self.advance_symbol(&Symbol::ArrayEnd)
    }

    /// Enters a map; returns whether a first entry follows.
    pub fn read_map_start(&mut self) -> Result<bool> {
        self.advance(&Symbol::MapStart)?;
        if self.cursor.kind() != Some(TokenKind::StartObject) {
            return Err(self.type_error("map-start"));
        }
        self.cursor.advance()?;
        self.map_next_inner()
    }

    /// After an entry: whether another entry follows.
    pub fn map_next(&mut self) -> Result<bool> {
        self.advance(&Symbol::ItemEnd)?;
        self.map_next_inner()
    }

    fn map_next_inner(&mut self) -> Result<bool> {
        if self.cursor.kind() == Some(TokenKind::EndObject) {
            self.cursor.advance()?;
            self.advance_symbol(&Symbol::MapEnd)?;
            Ok(false)
        } else {
            Ok(true)
        }
    }

    /// Skips a whole map without decoding its entries.
    pub fn skip_map(&mut self) -> Result<()> {
        self.advance(&Symbol::MapStart)?;
        if self.cursor.kind() != Some(TokenKind::StartObject) {
            return Err(self.type_error("map-start"));
        }
        self.cursor.skip_subtree()?;
        self.cursor.advance()?;
        self.advance_symbol(&Symbol::MapEnd)
    }

    /// Selects a union branch and returns its index.
    ///
    /// A bare `null` token selects the null branch. Two-branch unions with a
    /// null branch carry no wrapper object at all, so any other token selects
    /// the non-null branch directly. Remaining unions require the
    /// `{"label": value}` wrapper.
    pub fn read_index(&mut self) -> Result<usize> {
        self.advance(&Symbol::Union)?;
        let alternative = match self.stack.pop() {
            Some(Symbol::Alternative(alternative)) => alternative,
            other => return Err(symbol_mismatch("alternative", other)),
        };
        let index = match self.cursor.kind() {
            Some(TokenKind::Null) => alternative
                .find_label("null")
                .ok_or_else(|| Error::UnknownUnionBranch("null".to_string()))?,
            Some(_) if alternative.is_nullable_single() => alternative.non_null_index(),
            Some(TokenKind::StartObject) => {
                self.cursor.advance()?;
                let label = match self.cursor.current() {
                    Some(token) if token.kind == TokenKind::FieldName => token.text.clone(),
                    _ => return Err(self.type_error("start-union")),
                };
                self.cursor.advance()?;
                let index = alternative
                    .find_label(&label)
                    .ok_or_else(|| Error::UnknownUnionBranch(label.to_string()))?;
                self.stack.push(Symbol::UnionEnd);
                index
            }
            _ => return Err(self.type_error("start-union")),
        };
        self.stack.push(alternative.branch(index).clone());
        Ok(index)
    }

    /// Runs the trailing actions still pending after the last read (closing
    /// the outermost record and its unknown-field check) and verifies the
    /// input is exhausted.
    pub fn finish(&mut self) -> Result<()> {
        self.process_implicit_actions()?;
        if self.cursor.current().is_some() {
            return Err(self.type_error("end of input"));
        }
        Ok(())
    }

    /// Advances the grammar to `expected`, first flushing trailing actions
    /// left over from the previous value (field and record closings).
    fn advance(&mut self, expected: &Symbol) -> Result<()> {
        self.process_trailing_actions()?;
        if self.cursor.current().is_none() && self.stack.depth() == 1 {
            return Err(Error::UnexpectedEof);
        }
        self.advance_symbol(expected)
    }

    fn advance_symbol(&mut self, expected: &Symbol) -> Result<()> {
        loop {
            let Some(top) = self.stack.pop() else {
                return Err(Error::SymbolMismatch {
                    expected: expected.to_string(),
                    found: "an empty stack".to_string(),
                });
            };
            if top == *expected {
                return Ok(());
            }
            if top.is_implicit_action() {
                self.do_action(top)?;
                continue;
            }
            match &top {
                Symbol::Sequence(_) => self.stack.push_production(&top),
                Symbol::Repeater { end, .. } if **end == *expected => return Ok(()),
                Symbol::Repeater { .. } => self.stack.push_production(&top),
                _ => {
                    return Err(Error::SymbolMismatch {
                        expected: expected.to_string(),
                        found: top.to_string(),
                    })
                }
            }
        }
    }

    fn process_trailing_actions(&mut self) -> Result<()> {
        loop {
            let trailing = matches!(self.stack.top(), Some(top) if top.is_trailing_action());
            if !trailing {
                return Ok(());
            }
            if let Some(action) = self.stack.pop() {
                self.do_action(action)?;
            }
        }
    }

    fn process_implicit_actions(&mut self) -> Result<()> {
        loop {
            let implicit = matches!(self.stack.top(), Some(top) if top.is_implicit_action());
            if !implicit {
                return Ok(());
            }
            if let Some(action) = self.stack.pop() {
                self.do_action(action)?;
            }
        }
    }

    fn do_action(&mut self, action: Symbol) -> Result<()> {
        match action {
            Symbol::FieldAdjust(name) => self.adjust_field(&name),
            Symbol::FieldEnd => {
                // If this field was served from a replay cursor, the live
                // cursor comes back now.
                if let Some(buffer) = self.current_reorder.as_mut() {
                    if let Some(original) = buffer.parked.take() {
                        self.cursor = original;
                    }
                }
                Ok(())
            }
            Symbol::RecordStart => {
                if self.cursor.kind() != Some(TokenKind::StartObject) {
                    return Err(self.type_error("record-start"));
                }
                self.cursor.advance()?;
                self.reorder_stack.push(self.current_reorder.take());
                Ok(())
            }
            Symbol::RecordEnd => {
                self.capture_remaining_fields()?;
                self.expect_end_object("record-end")?;
                self.close_record()
            }
            Symbol::UnionEnd => self.expect_end_object("union-end"),
            other => Err(Error::UnsupportedAction(other.to_string())),
        }
    }

    /// The field reconciliation step. Serves the requested field from the
    /// reorder scope if it was already buffered, otherwise scans forward
    /// through the live object, capturing every non-matching field on the
    /// way.
    fn adjust_field(&mut self, name: &str) -> Result<()> {
        if let Some(buffer) = self.current_reorder.as_mut() {
            if let Some(tree) = buffer.saved.remove(name) {
                let original =
                    std::mem::replace(&mut self.cursor, Cursor::Replay(ReplayCursor::new(tree)));
                buffer.parked = Some(original);
                return Ok(());
            }
        }
        while self.cursor.kind() == Some(TokenKind::FieldName) {
            let field = match self.cursor.current() {
                Some(token) => token.text.clone(),
                None => break,
            };
            self.cursor.advance()?;
            if field == name {
                return Ok(());
            }
            let tree = capture_tree(&mut self.cursor)?;
            let limit = self.options.max_buffered_fields;
            let buffer = self.current_reorder.get_or_insert_with(ReorderBuffer::default);
            if buffer.saved.len() >= limit {
                return Err(Error::ReorderOverflow { limit });
            }
            buffer.saved.insert(field, tree);
        }
        Err(Error::MissingField(name.to_string()))
    }

    /// Fields left in the live object after every declared field was served
    /// are unclaimed. Strict mode records them for the unknown-field check
    /// at record close; lenient mode consumes and drops them.
    fn capture_remaining_fields(&mut self) -> Result<()> {
        while self.cursor.kind() == Some(TokenKind::FieldName) {
            let field = match self.cursor.current() {
                Some(token) => token.text.clone(),
                None => break,
            };
            self.cursor.advance()?;
            let tree = capture_tree(&mut self.cursor)?;
            if self.options.strict {
                let buffer = self.current_reorder.get_or_insert_with(ReorderBuffer::default);
                buffer.saved.insert(field, tree);
            }
        }
        Ok(())
    }

    fn expect_end_object(&mut self, what: &'static str) -> Result<()> {
        if self.cursor.kind() != Some(TokenKind::EndObject) {
            return Err(self.type_error(what));
        }
        self.cursor.advance()
    }

    fn close_record(&mut self) -> Result<()> {
        if let Some(buffer) = self.current_reorder.as_ref() {
            if !buffer.saved.is_empty() && self.options.strict {
                let mut names: Vec<String> =
                    buffer.saved.keys().map(ToString::to_string).collect();
                names.sort();
                return Err(Error::UnknownFields(names));
            }
        }
        self.current_reorder = self.reorder_stack.pop().flatten();
        Ok(())
    }

    fn numeric_text(&self, expected: &'static str) -> Result<SmolStr> {
        match self.cursor.current() {
            Some(token) if token.kind.is_numeric() => Ok(token.text.clone()),
            _ => Err(self.type_error(expected)),
        }
    }

    fn type_error(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.cursor.describe(),
        }
    }
}

fn symbol_mismatch(expected: &'static str, found: Option<Symbol>) -> Error {
    Error::SymbolMismatch {
        expected: expected.to_string(),
        found: found
            .map(|symbol| symbol.to_string())
            .unwrap_or_else(|| "an empty stack".to_string()),
    }
}

fn read_value(decoder: &mut Decoder<'_>, schema: &Schema) -> Result<Value> {
    match schema {
        Schema::Null => {
            decoder.read_null()?;
            Ok(Value::Null)
        }
        Schema::Boolean => Ok(Value::Bool(decoder.read_boolean()?)),
        Schema::Int => Ok(Value::from(decoder.read_int()?)),
        Schema::Long => Ok(Value::from(decoder.read_long()?)),
        Schema::Float => Ok(float_value(f64::from(decoder.read_float()?))),
        Schema::Double => Ok(float_value(decoder.read_double()?)),
        Schema::String => Ok(Value::String(decoder.read_string()?)),
        Schema::Bytes => Ok(Value::String(text::text_from_bytes(&decoder.read_bytes()?))),
        Schema::Fixed(fixed) => Ok(Value::String(text::text_from_bytes(
            &decoder.read_fixed(fixed.size)?,
        ))),
        Schema::Enum(inner) => {
            let index = decoder.read_enum()?;
            Ok(Value::String(inner.symbols[index].clone()))
        }
        Schema::Array(items) => {
            let mut out = Vec::new();
            let mut more = decoder.read_array_start()?;
            while more {
                out.push(read_value(decoder, items)?);
                more = decoder.array_next()?;
            }
            Ok(Value::Array(out))
        }
        Schema::Map(values) => {
            let mut map = Map::new();
            let mut more = decoder.read_map_start()?;
            while more {
                let key = decoder.read_string()?;
                map.insert(key, read_value(decoder, values)?);
                more = decoder.map_next()?;
            }
            Ok(Value::Object(map))
        }
        Schema::Record(record) => {
            let mut map = Map::new();
            for field in &record.fields {
                map.insert(field.name.clone(), read_value(decoder, &field.schema)?);
            }
            Ok(Value::Object(map))
        }
        Schema::Union(branches) => {
            let index = decoder.read_index()?;
            read_value(decoder, &branches[index])
        }
    }
}

fn float_value(value: f64) -> Value {
    match Number::from_f64(value) {
        Some(number) => Value::Number(number),
        None if value.is_nan() => Value::String("NaN".to_string()),
        None if value > 0.0 => Value::String("Infinity".to_string()),
        None => Value::String("-Infinity".to_string()),
    }
}
