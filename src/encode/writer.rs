//! Low-level JSON output buffer.
//!
//! Tracks open containers so callers never emit commas or colons themselves;
//! every value-producing method places its own separator first. Numbers go
//! through itoa/ryu, strings through the escape routine below.

use crate::options::EncodeOptions;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug)]
struct Scope {
    container: Container,
    entries: usize,
}

#[derive(Debug)]
pub(crate) struct JsonWriter {
    buffer: Vec<u8>,
    options: EncodeOptions,
    scopes: Vec<Scope>,
    // set between a field name and its value, where no separator belongs
    after_name: bool,
    indent_cache: Vec<String>,
}

impl JsonWriter {
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            buffer: Vec::new(),
            options,
            scopes: Vec::new(),
            after_name: false,
            indent_cache: vec![String::new()],
        }
    }

    pub fn finish(self) -> String {
        String::from_utf8(self.buffer).expect("writer output must be valid UTF-8")
    }

    pub fn finish_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn begin_object(&mut self) -> Result<()> {
        self.value_prefix();
        self.buffer.push(b'{');
        self.scopes.push(Scope {
            container: Container::Object,
            entries: 0,
        });
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<()> {
        let scope = self.close_scope(Container::Object)?;
        if self.options.pretty && scope.entries > 0 {
            self.newline_indent();
        }
        self.buffer.push(b'}');
        Ok(())
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.value_prefix();
        self.buffer.push(b'[');
        self.scopes.push(Scope {
            container: Container::Array,
            entries: 0,
        });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        let scope = self.close_scope(Container::Array)?;
        if self.options.pretty && scope.entries > 0 {
            self.newline_indent();
        }
        self.buffer.push(b']');
        Ok(())
    }

    pub fn field_name(&mut self, name: &str) -> Result<()> {
        self.value_prefix();
        self.write_escaped(name);
        self.buffer.push(b':');
        if self.options.pretty {
            self.buffer.push(b' ');
        }
        self.after_name = true;
        Ok(())
    }

    pub fn null(&mut self) -> Result<()> {
        self.value_prefix();
        self.buffer.extend_from_slice(b"null");
        Ok(())
    }

    pub fn boolean(&mut self, value: bool) -> Result<()> {
        self.value_prefix();
        self.buffer
            .extend_from_slice(if value { b"true" } else { b"false" });
        Ok(())
    }

    pub fn int(&mut self, value: i64) -> Result<()> {
        self.value_prefix();
        let mut buf = itoa::Buffer::new();
        self.buffer.extend_from_slice(buf.format(value).as_bytes());
        Ok(())
    }

    /// Non-finite floats have no JSON number form and are written as quoted
    /// strings, matching what the decoder accepts for `double`.
    pub fn float(&mut self, value: f32) -> Result<()> {
        if !value.is_finite() {
            return self.string(special_float(f64::from(value)));
        }
        self.value_prefix();
        let mut buf = ryu::Buffer::new();
        self.buffer.extend_from_slice(buf.format(value).as_bytes());
        Ok(())
    }

    pub fn double(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return self.string(special_float(value));
        }
        self.value_prefix();
        let mut buf = ryu::Buffer::new();
        self.buffer.extend_from_slice(buf.format(value).as_bytes());
        Ok(())
    }

    pub fn string(&mut self, value: &str) -> Result<()> {
        self.value_prefix();
        self.write_escaped(value);
        Ok(())
    }

    /// Emits pre-validated numeric text verbatim, preserving digits beyond
    /// what i64/f64 can represent.
    pub fn raw_number(&mut self, text: &str) -> Result<()> {
        self.value_prefix();
        self.buffer.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn close_scope(&mut self, expected: Container) -> Result<Scope> {
        match self.scopes.pop() {
            Some(scope) if scope.container == expected => Ok(scope),
            _ => Err(Error::ValueMismatch(
                "container close does not match the open container".to_string(),
            )),
        }
    }

    fn value_prefix(&mut self) {
        if self.after_name {
            self.after_name = false;
            return;
        }
        let pretty = self.options.pretty;
        if let Some(scope) = self.scopes.last_mut() {
            if scope.entries > 0 {
                self.buffer.push(b',');
            }
            scope.entries += 1;
            if pretty {
                self.newline_indent();
            }
        }
    }

    fn newline_indent(&mut self) {
        let depth = self.scopes.len();
        if depth >= self.indent_cache.len() {
            self.extend_indent_cache(depth);
        }
        self.buffer.push(b'\n');
        self.buffer
            .extend_from_slice(self.indent_cache[depth].as_bytes());
    }

    fn extend_indent_cache(&mut self, depth: usize) {
        while self.indent_cache.len() <= depth {
            let mut next = String::new();
            if let Some(prev) = self.indent_cache.last() {
                next.push_str(prev);
            }
            next.push_str("  ");
            self.indent_cache.push(next);
        }
    }

    fn write_escaped(&mut self, value: &str) {
        self.buffer.push(b'"');
        for ch in value.chars() {
            match ch {
                '"' => self.buffer.extend_from_slice(b"\\\""),
                '\\' => self.buffer.extend_from_slice(b"\\\\"),
                '\n' => self.buffer.extend_from_slice(b"\\n"),
                '\r' => self.buffer.extend_from_slice(b"\\r"),
                '\t' => self.buffer.extend_from_slice(b"\\t"),
                '\u{08}' => self.buffer.extend_from_slice(b"\\b"),
                '\u{0c}' => self.buffer.extend_from_slice(b"\\f"),
                c if (c as u32) < 0x20 => {
                    let code = c as u32;
                    self.buffer.extend_from_slice(b"\\u00");
                    self.buffer.push(HEX[(code >> 4) as usize]);
                    self.buffer.push(HEX[(code & 0xf) as usize]);
                }
                c if c.is_ascii() => self.buffer.push(c as u8),
                c => {
                    let mut buf = [0u8; 4];
                    self.buffer.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        self.buffer.push(b'"');
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

fn special_float(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> JsonWriter {
        JsonWriter::new(EncodeOptions::default())
    }

    #[rstest::rstest]
    fn separators_are_automatic() {
        let mut w = writer();
        w.begin_object().unwrap();
        w.field_name("a").unwrap();
        w.int(1).unwrap();
        w.field_name("b").unwrap();
        w.begin_array().unwrap();
        w.boolean(true).unwrap();
        w.null().unwrap();
        w.end_array().unwrap();
        w.end_object().unwrap();
        assert_eq!(w.finish(), r#"{"a":1,"b":[true,null]}"#);
    }

    #[rstest::rstest]
    fn escapes_strings() {
        let mut w = writer();
        w.string("a\"b\\c\nd\u{01}").unwrap();
        assert_eq!(w.finish(), "\"a\\\"b\\\\c\\nd\\u0001\"");
    }

    #[rstest::rstest]
    fn non_finite_doubles_are_quoted() {
        let mut w = writer();
        w.begin_array().unwrap();
        w.double(f64::NAN).unwrap();
        w.double(f64::INFINITY).unwrap();
        w.double(f64::NEG_INFINITY).unwrap();
        w.double(1.5).unwrap();
        w.end_array().unwrap();
        assert_eq!(w.finish(), r#"["NaN","Infinity","-Infinity",1.5]"#);
    }

    #[rstest::rstest]
    fn pretty_mode_indents() {
        let mut w = JsonWriter::new(EncodeOptions::default().with_pretty(true));
        w.begin_object().unwrap();
        w.field_name("a").unwrap();
        w.int(1).unwrap();
        w.field_name("b").unwrap();
        w.begin_array().unwrap();
        w.int(2).unwrap();
        w.end_array().unwrap();
        w.end_object().unwrap();
        assert_eq!(w.finish(), "{\n  \"a\": 1,\n  \"b\": [\n    2\n  ]\n}");
    }

    #[rstest::rstest]
    fn raw_number_is_verbatim() {
        let mut w = writer();
        w.raw_number("123456789012345678901234567890.5").unwrap();
        assert_eq!(w.finish(), "123456789012345678901234567890.5");
    }
}
