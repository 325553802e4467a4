pub mod decode;
pub mod encode;
pub mod error;
pub mod grammar;
pub mod options;
pub mod schema;
pub mod text;
pub mod token;

use serde_json::Value;

pub use crate::error::{Error, Result};
pub use crate::options::{DecodeOptions, EncodeOptions};
pub use crate::schema::Schema;

pub use crate::decode::Decoder;
pub use crate::encode::Encoder;

pub fn to_string(schema: &Schema, value: &Value) -> Result<String> {
    to_string_with_options(schema, value, &EncodeOptions::default())
}

pub fn to_string_with_options(
    schema: &Schema,
    value: &Value,
    options: &EncodeOptions,
) -> Result<String> {
    encode::to_string(schema, value, options)
}

pub fn to_vec(schema: &Schema, value: &Value) -> Result<Vec<u8>> {
    to_vec_with_options(schema, value, &EncodeOptions::default())
}

pub fn to_vec_with_options(
    schema: &Schema,
    value: &Value,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    encode::to_vec(schema, value, options)
}

pub fn from_str(schema: &Schema, input: &str) -> Result<Value> {
    from_str_with_options(schema, input, &DecodeOptions::default())
}

pub fn from_str_with_options(
    schema: &Schema,
    input: &str,
    options: &DecodeOptions,
) -> Result<Value> {
    decode::from_str(schema, input, options)
}
