//! Grammar interpreter, encode side.
//!
//! The encoder runs the same symbol stack as the decoder but emits tokens
//! instead of consuming them. Structural output (field names, braces) falls
//! out of the implicit actions; callers only supply leaf values in schema
//! order. Two-branch unions with a null branch are written without the
//! `{"label": value}` wrapper, and the null branch of any union is always a
//! bare `null`.

mod writer;

use serde_json::Value;

use crate::grammar::{self, stack::SymbolStack, Symbol};
use crate::schema::Schema;
use crate::text;
use crate::{EncodeOptions, Error, Result};

use writer::JsonWriter;

/// Encodes `value` against `schema` into a JSON string.
pub fn to_string(schema: &Schema, value: &Value, options: &EncodeOptions) -> Result<String> {
    let mut encoder = Encoder::new(schema, options);
    write_value(&mut encoder, schema, value)?;
    encoder.finish()
}

/// Same as [`to_string`] but returns the raw bytes.
pub fn to_vec(schema: &Schema, value: &Value, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(schema, options);
    write_value(&mut encoder, schema, value)?;
    encoder.finish_bytes()
}

/// Schema-directed JSON encoder. Not safe to keep using after an error.
#[derive(Debug)]
pub struct Encoder {
    stack: SymbolStack,
    writer: JsonWriter,
    // one flag per open container: an item was started and still owes its
    // item-end symbol
    item_started: Vec<bool>,
}

impl Encoder {
    pub fn new(schema: &Schema, options: &EncodeOptions) -> Self {
        Self {
            stack: SymbolStack::new(grammar::root_symbol(schema)),
            writer: JsonWriter::new(options.clone()),
            item_started: Vec::new(),
        }
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.advance(&Symbol::Null)?;
        self.writer.null()
    }

    pub fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.advance(&Symbol::Boolean)?;
        self.writer.boolean(value)
    }

    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.advance(&Symbol::Int)?;
        self.writer.int(i64::from(value))
    }

    pub fn write_long(&mut self, value: i64) -> Result<()> {
        self.advance(&Symbol::Long)?;
        self.writer.int(value)
    }

    pub fn write_float(&mut self, value: f32) -> Result<()> {
        self.advance(&Symbol::Float)?;
        self.writer.float(value)
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.advance(&Symbol::Double)?;
        self.writer.double(value)
    }

    /// Writes a string value, or a map key when the grammar expects one.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.advance(&Symbol::String)?;
        if self.stack.top() == Some(&Symbol::MapKeyMarker) {
            self.advance(&Symbol::MapKeyMarker)?;
            self.writer.field_name(value)
        } else {
            self.writer.string(value)
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.advance(&Symbol::Bytes)?;
        self.writer.string(&text::text_from_bytes(bytes))
    }

    pub fn write_fixed(&mut self, bytes: &[u8]) -> Result<()> {
        self.advance(&Symbol::Fixed)?;
        let size = match self.stack.pop() {
            Some(Symbol::FixedSize(size)) => size,
            other => return Err(symbol_mismatch("fixed-size", other)),
        };
        if bytes.len() != size {
            return Err(Error::FixedLengthMismatch {
                expected: size,
                actual: bytes.len(),
            });
        }
        self.writer.string(&text::text_from_bytes(bytes))
    }

    /// Writes the enum symbol at `index` in the schema's symbol set.
    pub fn write_enum(&mut self, index: usize) -> Result<()> {
        self.advance(&Symbol::Enum)?;
        let labels = match self.stack.pop() {
            Some(Symbol::EnumLabels(labels)) => labels,
            other => return Err(symbol_mismatch("enum-labels", other)),
        };
        let label = labels.get(index).ok_or_else(|| {
            Error::ValueMismatch(format!(
                "enum index {index} out of range, only {} symbols",
                labels.len()
            ))
        })?;
        self.writer.string(label)
    }

    pub fn write_array_start(&mut self) -> Result<()> {
        self.advance(&Symbol::ArrayStart)?;
        self.writer.begin_array()?;
        self.item_started.push(false);
        Ok(())
    }

    /// Called before each array element or map entry.
    pub fn start_item(&mut self) -> Result<()> {
        if self.item_started.last() == Some(&true) {
            self.advance(&Symbol::ItemEnd)?;
        }
        if let Some(flag) = self.item_started.last_mut() {
            *flag = true;
        }
        Ok(())
    }

    pub fn write_array_end(&mut self) -> Result<()> {
        self.finish_items()?;
        self.advance(&Symbol::ArrayEnd)?;
        self.writer.end_array()
    }

    pub fn write_map_start(&mut self) -> Result<()> {
        self.advance(&Symbol::MapStart)?;
        self.writer.begin_object()?;
        self.item_started.push(false);
        Ok(())
    }

    pub fn write_map_end(&mut self) -> Result<()> {
        self.finish_items()?;
        self.advance(&Symbol::MapEnd)?;
        self.writer.end_object()
    }

    /// Selects a union branch. The null branch is always a bare `null`;
    /// two-branch unions with a null branch skip the wrapper object for the
    /// other branch as well; everything else gets `{"label": value}`.
    pub fn write_index(&mut self, index: usize) -> Result<()> {
        self.advance(&Symbol::Union)?;
        let alternative = match self.stack.pop() {
            Some(Symbol::Alternative(alternative)) => alternative,
            other => return Err(symbol_mismatch("alternative", other)),
        };
        if index >= alternative.len() {
            return Err(Error::ValueMismatch(format!(
                "union index {index} out of range, only {} branches",
                alternative.len()
            )));
        }
        let branch = alternative.branch(index).clone();
        let bare = branch == Symbol::Null || alternative.is_nullable_single();
        if !bare {
            self.writer.begin_object()?;
            self.writer.field_name(alternative.label(index))?;
            self.stack.push(Symbol::UnionEnd);
        }
        self.stack.push(branch);
        Ok(())
    }

    /// Emits pre-rendered decimal text at the next numeric position,
    /// bypassing f64 so no precision is lost.
    pub fn write_decimal(&mut self, text: &str) -> Result<()> {
        if !text::is_json_number(text) {
            return Err(Error::ValueMismatch(format!(
                "not a valid JSON number: {text}"
            )));
        }
        self.advance_numeric(text)?;
        self.writer.raw_number(text)
    }

    /// Emits pre-rendered integer text at the next numeric position,
    /// bypassing i64 so no digits are lost.
    pub fn write_big_integer(&mut self, text: &str) -> Result<()> {
        if !text::is_json_integer(text) {
            return Err(Error::ValueMismatch(format!(
                "not a valid JSON integer: {text}"
            )));
        }
        self.advance_numeric(text)?;
        self.writer.raw_number(text)
    }

    /// Drains the trailing actions (closing braces of the outermost record)
    /// and returns the output. Fails if leaf writes stopped short of the
    /// schema.
    pub fn finish(mut self) -> Result<String> {
        self.drain()?;
        Ok(self.writer.finish())
    }

    pub fn finish_bytes(mut self) -> Result<Vec<u8>> {
        self.drain()?;
        Ok(self.writer.finish_bytes())
    }

    fn drain(&mut self) -> Result<()> {
        loop {
            let implicit = matches!(self.stack.top(), Some(top) if top.is_implicit_action());
            if !implicit {
                break;
            }
            if let Some(action) = self.stack.pop() {
                self.do_action(action)?;
            }
        }
        if self.stack.depth() != 0 {
            return Err(Error::ValueMismatch(
                "schema not fully written before finish".to_string(),
            ));
        }
        Ok(())
    }

    fn finish_items(&mut self) -> Result<()> {
        if self.item_started.pop() == Some(true) {
            self.advance(&Symbol::ItemEnd)?;
        }
        Ok(())
    }

    fn advance(&mut self, expected: &Symbol) -> Result<()> {
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

    /// Advances to whichever numeric terminal comes next.
    fn advance_numeric(&mut self, text: &str) -> Result<()> {
        loop {
            let Some(top) = self.stack.pop() else {
                return Err(Error::SymbolMismatch {
                    expected: "a numeric terminal".to_string(),
                    found: "an empty stack".to_string(),
                });
            };
            match &top {
                Symbol::Int | Symbol::Long | Symbol::Float | Symbol::Double => return Ok(()),
                Symbol::Sequence(_) | Symbol::Repeater { .. } => self.stack.push_production(&top),
                _ if top.is_implicit_action() => self.do_action(top)?,
                _ => {
                    return Err(Error::ValueMismatch(format!(
                        "no numeric position in the schema for {text}"
                    )))
                }
            }
        }
    }

    fn do_action(&mut self, action: Symbol) -> Result<()> {
        match action {
            Symbol::FieldAdjust(name) => self.writer.field_name(&name),
            Symbol::FieldEnd => Ok(()),
            Symbol::RecordStart => self.writer.begin_object(),
            Symbol::RecordEnd | Symbol::UnionEnd => self.writer.end_object(),
            other => Err(Error::UnsupportedAction(other.to_string())),
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

fn write_value(encoder: &mut Encoder, schema: &Schema, value: &Value) -> Result<()> {
    match schema {
        Schema::Null => match value {
            Value::Null => encoder.write_null(),
            other => Err(mismatch("null", other)),
        },
        Schema::Boolean => match value {
            Value::Bool(b) => encoder.write_boolean(*b),
            other => Err(mismatch("boolean", other)),
        },
        Schema::Int => {
            let number = value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| mismatch("int", value))?;
            encoder.write_int(number)
        }
        Schema::Long => {
            let number = value.as_i64().ok_or_else(|| mismatch("long", value))?;
            encoder.write_long(number)
        }
        Schema::Float => encoder.write_float(float_of(value, "float")? as f32),
        Schema::Double => encoder.write_double(float_of(value, "double")?),
        Schema::String => match value {
            Value::String(s) => encoder.write_string(s),
            other => Err(mismatch("string", other)),
        },
        Schema::Bytes => match value {
            Value::String(s) => encoder.write_bytes(&text::bytes_from_text(s)?),
            other => Err(mismatch("bytes", other)),
        },
        Schema::Fixed(_) => match value {
            Value::String(s) => encoder.write_fixed(&text::bytes_from_text(s)?),
            other => Err(mismatch("fixed", other)),
        },
        Schema::Enum(inner) => {
            let symbol = value.as_str().ok_or_else(|| mismatch("enum", value))?;
            let index = inner
                .symbols
                .iter()
                .position(|s| s == symbol)
                .ok_or_else(|| Error::UnknownEnumSymbol(symbol.to_string()))?;
            encoder.write_enum(index)
        }
        Schema::Array(items) => {
            let elements = value.as_array().ok_or_else(|| mismatch("array", value))?;
            encoder.write_array_start()?;
            for element in elements {
                encoder.start_item()?;
                write_value(encoder, items, element)?;
            }
            encoder.write_array_end()
        }
        Schema::Map(values) => {
            let entries = value.as_object().ok_or_else(|| mismatch("map", value))?;
            encoder.write_map_start()?;
            for (key, entry) in entries {
                encoder.start_item()?;
                encoder.write_string(key)?;
                write_value(encoder, values, entry)?;
            }
            encoder.write_map_end()
        }
        Schema::Record(record) => {
            let object = value.as_object().ok_or_else(|| mismatch("record", value))?;
            for field in &record.fields {
                let field_value = object
                    .get(&field.name)
                    .ok_or_else(|| Error::MissingField(field.name.clone()))?;
                write_value(encoder, &field.schema, field_value)?;
            }
            Ok(())
        }
        Schema::Union(branches) => {
            let index = branches
                .iter()
                .position(|branch| branch_accepts(branch, value))
                .ok_or_else(|| mismatch("a union branch", value))?;
            encoder.write_index(index)?;
            write_value(encoder, &branches[index], value)
        }
    }
}

/// Union branch resolution for the generic layer: first branch whose shape
/// the value fits wins.
fn branch_accepts(schema: &Schema, value: &Value) -> bool {
    match schema {
        Schema::Null => value.is_null(),
        Schema::Boolean => value.is_boolean(),
        Schema::Int => value
            .as_i64()
            .is_some_and(|n| i32::try_from(n).is_ok()),
        Schema::Long => value.is_i64(),
        Schema::Float | Schema::Double => {
            value.is_number()
                || matches!(value.as_str(), Some("NaN" | "Infinity" | "-Infinity"))
        }
        Schema::String => value.is_string(),
        Schema::Bytes => value
            .as_str()
            .is_some_and(|s| s.chars().all(|c| (c as u32) <= 0xFF)),
        Schema::Fixed(fixed) => value
            .as_str()
            .is_some_and(|s| s.chars().count() == fixed.size),
        Schema::Enum(inner) => value
            .as_str()
            .is_some_and(|s| inner.symbols.iter().any(|symbol| symbol == s)),
        Schema::Array(_) => value.is_array(),
        Schema::Map(_) => value.is_object(),
        Schema::Record(record) => value
            .as_object()
            .is_some_and(|object| record.fields.iter().all(|f| object.contains_key(&f.name))),
        Schema::Union(_) => false,
    }
}

fn float_of(value: &Value, expected: &'static str) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch(expected, value)),
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Err(mismatch(expected, value)),
        },
        other => Err(mismatch(expected, other)),
    }
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::ValueMismatch(format!("expected {expected}, got {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn schema(decl: &str) -> Schema {
        Schema::parse_str(decl).unwrap()
    }

    fn encode(decl: &str, value: Value) -> Result<String> {
        to_string(&schema(decl), &value, &EncodeOptions::default())
    }

    #[rstest::rstest]
    fn record_fields_come_out_in_schema_order() {
        let decl = r#"{"type":"record","name":"P","fields":[
            {"name":"name","type":"string"},{"name":"age","type":"int"}]}"#;
        let out = encode(decl, json!({"age": 30, "name": "Ana"})).unwrap();
        assert_eq!(out, r#"{"name":"Ana","age":30}"#);
    }

    #[rstest::rstest]
    fn nullable_single_union_is_unwrapped() {
        let decl = r#"["null","string"]"#;
        assert_eq!(encode(decl, json!(null)).unwrap(), "null");
        assert_eq!(encode(decl, json!("hi")).unwrap(), r#""hi""#);
    }

    #[rstest::rstest]
    fn wider_union_keeps_the_wrapper() {
        let decl = r#"["null","string","int"]"#;
        assert_eq!(encode(decl, json!(null)).unwrap(), "null");
        assert_eq!(encode(decl, json!("hi")).unwrap(), r#"{"string":"hi"}"#);
        assert_eq!(encode(decl, json!(7)).unwrap(), r#"{"int":7}"#);
    }

    #[rstest::rstest]
    fn map_keys_are_field_names() {
        let decl = r#"{"type":"map","values":"int"}"#;
        let out = encode(decl, json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(out, r#"{"a":1,"b":2}"#);
    }

    #[rstest::rstest]
    fn fixed_length_is_checked() {
        let decl = r#"{"type":"fixed","name":"F","size":2}"#;
        assert_eq!(encode(decl, json!("ab")).unwrap(), r#""ab""#);
        assert!(matches!(
            encode(decl, json!("abc")),
            Err(Error::FixedLengthMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[rstest::rstest]
    fn decimal_text_goes_out_verbatim() {
        let s = schema(r#"{"type":"record","name":"R","fields":[
            {"name":"v","type":"double"}]}"#);
        let mut encoder = Encoder::new(&s, &EncodeOptions::default());
        encoder
            .write_decimal("123456789012345678901234567890.25")
            .unwrap();
        assert_eq!(
            encoder.finish().unwrap(),
            r#"{"v":123456789012345678901234567890.25}"#
        );
    }

    #[rstest::rstest]
    fn big_integer_rejects_fractions() {
        let s = schema(r#""long""#);
        let mut encoder = Encoder::new(&s, &EncodeOptions::default());
        assert!(matches!(
            encoder.write_big_integer("1.5"),
            Err(Error::ValueMismatch(_))
        ));
    }
}
