//! Minimal Avro schema model.
//!
//! Covers the shapes the codec needs to drive its grammar: primitives,
//! records, enums, arrays, maps, unions and fixed. Schemas are assumed
//! pre-validated; named-type references and aliases are not supported.

use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record(RecordSchema),
    Enum(EnumSchema),
    Array(Box<Schema>),
    Map(Box<Schema>),
    Union(Vec<Schema>),
    Fixed(FixedSchema),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    pub name: String,
    pub size: usize,
}

impl Schema {
    /// Parses an Avro schema declaration from JSON text.
    pub fn parse_str(input: &str) -> Result<Schema> {
        let value: Value = serde_json::from_str(input)
            .map_err(|err| Error::Schema(format!("schema is not valid JSON: {err}")))?;
        Schema::parse_value(&value)
    }

    pub fn parse_value(value: &Value) -> Result<Schema> {
        match value {
            Value::String(name) => Schema::primitive(name),
            Value::Array(branches) => {
                let branches = branches
                    .iter()
                    .map(Schema::parse_value)
                    .collect::<Result<Vec<_>>>()?;
                if branches.is_empty() {
                    return Err(Error::Schema("union has no branches".into()));
                }
                Ok(Schema::Union(branches))
            }
            Value::Object(obj) => {
                let kind = obj
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::Schema("missing \"type\"".into()))?;
                match kind {
                    "record" => {
                        let name = required_str(obj, "name")?;
                        let fields = obj
                            .get("fields")
                            .and_then(Value::as_array)
                            .ok_or_else(|| Error::Schema("record is missing \"fields\"".into()))?
                            .iter()
                            .map(parse_field)
                            .collect::<Result<Vec<_>>>()?;
                        Ok(Schema::Record(RecordSchema { name, fields }))
                    }
                    "enum" => {
                        let name = required_str(obj, "name")?;
                        let symbols = obj
                            .get("symbols")
                            .and_then(Value::as_array)
                            .ok_or_else(|| Error::Schema("enum is missing \"symbols\"".into()))?
                            .iter()
                            .map(|symbol| {
                                symbol
                                    .as_str()
                                    .map(str::to_owned)
                                    .ok_or_else(|| Error::Schema("enum symbol must be a string".into()))
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Ok(Schema::Enum(EnumSchema { name, symbols }))
                    }
                    "fixed" => {
                        let name = required_str(obj, "name")?;
                        let size = obj
                            .get("size")
                            .and_then(Value::as_u64)
                            .ok_or_else(|| Error::Schema("fixed is missing \"size\"".into()))?;
                        Ok(Schema::Fixed(FixedSchema {
                            name,
                            size: size as usize,
                        }))
                    }
                    "array" => {
                        let items = obj
                            .get("items")
                            .ok_or_else(|| Error::Schema("array is missing \"items\"".into()))?;
                        Ok(Schema::Array(Box::new(Schema::parse_value(items)?)))
                    }
                    "map" => {
                        let values = obj
                            .get("values")
                            .ok_or_else(|| Error::Schema("map is missing \"values\"".into()))?;
                        Ok(Schema::Map(Box::new(Schema::parse_value(values)?)))
                    }
                    other => Schema::primitive(other),
                }
            }
            other => Err(Error::Schema(format!("unexpected schema element: {other}"))),
        }
    }

    fn primitive(name: &str) -> Result<Schema> {
        match name {
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "float" => Ok(Schema::Float),
            "double" => Ok(Schema::Double),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),
            other => Err(Error::Schema(format!("unknown type name {other:?}"))),
        }
    }

    /// The label naming this schema inside a union wrapper object.
    pub fn label(&self) -> &str {
        match self {
            Schema::Null => "null",
            Schema::Boolean => "boolean",
            Schema::Int => "int",
            Schema::Long => "long",
            Schema::Float => "float",
            Schema::Double => "double",
            Schema::Bytes => "bytes",
            Schema::String => "string",
            Schema::Record(record) => &record.name,
            Schema::Enum(inner) => &inner.name,
            Schema::Fixed(fixed) => &fixed.name,
            Schema::Array(_) => "array",
            Schema::Map(_) => "map",
            Schema::Union(_) => "union",
        }
    }
}

fn parse_field(value: &Value) -> Result<Field> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::Schema("record field must be an object".into()))?;
    let name = required_str(obj, "name")?;
    let schema = obj
        .get("type")
        .ok_or_else(|| Error::Schema(format!("field {name:?} is missing \"type\"")))?;
    Ok(Field {
        name,
        schema: Schema::parse_value(schema)?,
    })
}

fn required_str(obj: &serde_json::Map<String, Value>, key: &str) -> Result<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| Error::Schema(format!("missing \"{key}\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_record() {
        let schema = Schema::parse_str(
            r#"{"type":"record","name":"Person","fields":[
                {"name":"name","type":"string"},
                {"name":"age","type":"int"},
                {"name":"nick","type":["null","string"]}
            ]}"#,
        )
        .unwrap();
        let Schema::Record(record) = schema else {
            panic!("expected record");
        };
        assert_eq!(record.name, "Person");
        assert_eq!(record.fields.len(), 3);
        assert_eq!(
            record.fields[2].schema,
            Schema::Union(vec![Schema::Null, Schema::String])
        );
    }

    #[test]
    fn rejects_unknown_type_name() {
        let err = Schema::parse_str(r#""integer""#).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn union_labels() {
        let schema = Schema::parse_str(r#"{"type":"fixed","name":"md5","size":16}"#).unwrap();
        assert_eq!(schema.label(), "md5");
        assert_eq!(Schema::Array(Box::new(Schema::Int)).label(), "array");
    }
}
