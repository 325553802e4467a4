//! Grammar symbols derived from a schema.
//!
//! A schema compiles into a tree of symbols whose stack-driven expansion
//! dictates the exact sequence of terminals and actions the interpreters
//! must follow. Productions are stored in processing order (first symbol to
//! consume first); the stack pushes them reversed.

pub mod stack;

use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    // terminals
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Fixed,
    Enum,
    Union,
    ArrayStart,
    ArrayEnd,
    MapStart,
    MapEnd,
    ItemEnd,
    MapKeyMarker,
    // non-terminals
    Sequence(Rc<[Symbol]>),
    Repeater {
        end: Rc<Symbol>,
        body: Rc<[Symbol]>,
    },
    // actions handled by the interpreter callback
    FieldAdjust(SmolStr),
    FieldEnd,
    RecordStart,
    RecordEnd,
    UnionEnd,
    // value-carrying symbols popped explicitly after their terminal
    FixedSize(usize),
    EnumLabels(Rc<[SmolStr]>),
    Alternative(Rc<Alternative>),
}

/// Ordered, labeled set of union branches.
#[derive(Debug, PartialEq)]
pub struct Alternative {
    labels: Vec<SmolStr>,
    branches: Vec<Symbol>,
}

impl Alternative {
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }

    pub fn branch(&self, index: usize) -> &Symbol {
        &self.branches[index]
    }

    pub fn find_label(&self, name: &str) -> Option<usize> {
        self.labels.iter().position(|label| label == name)
    }

    /// The common optional-field idiom: exactly two branches, one of them
    /// null. Such unions skip the `{"label": value}` wrapper on the wire.
    pub fn is_nullable_single(&self) -> bool {
        self.len() == 2 && (self.labels[0] == "null" || self.labels[1] == "null")
    }

    /// Index of the non-null branch of a nullable single.
    pub fn non_null_index(&self) -> usize {
        if self.labels[0] == "null" {
            1
        } else {
            0
        }
    }
}

impl Symbol {
    pub fn is_implicit_action(&self) -> bool {
        matches!(
            self,
            Symbol::FieldAdjust(_)
                | Symbol::FieldEnd
                | Symbol::RecordStart
                | Symbol::RecordEnd
                | Symbol::UnionEnd
        )
    }

    /// Trailing actions run after their value is consumed; the decoder
    /// processes them before inspecting the next token.
    pub fn is_trailing_action(&self) -> bool {
        matches!(
            self,
            Symbol::FieldEnd | Symbol::RecordEnd | Symbol::UnionEnd
        )
    }

    fn name(&self) -> &'static str {
        match self {
            Symbol::Null => "null",
            Symbol::Boolean => "boolean",
            Symbol::Int => "int",
            Symbol::Long => "long",
            Symbol::Float => "float",
            Symbol::Double => "double",
            Symbol::String => "string",
            Symbol::Bytes => "bytes",
            Symbol::Fixed => "fixed",
            Symbol::Enum => "enum",
            Symbol::Union => "union",
            Symbol::ArrayStart => "array-start",
            Symbol::ArrayEnd => "array-end",
            Symbol::MapStart => "map-start",
            Symbol::MapEnd => "map-end",
            Symbol::ItemEnd => "item-end",
            Symbol::MapKeyMarker => "map-key-marker",
            Symbol::Sequence(_) => "sequence",
            Symbol::Repeater { .. } => "repeater",
            Symbol::FieldAdjust(_) => "field-adjust",
            Symbol::FieldEnd => "field-end",
            Symbol::RecordStart => "record-start",
            Symbol::RecordEnd => "record-end",
            Symbol::UnionEnd => "union-end",
            Symbol::FixedSize(_) => "fixed-size",
            Symbol::EnumLabels(_) => "enum-labels",
            Symbol::Alternative(_) => "alternative",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The root symbol driving an encode or decode of one value of `schema`.
pub fn root_symbol(schema: &Schema) -> Symbol {
    sequence(vec![generate(schema)])
}

fn generate(schema: &Schema) -> Symbol {
    match schema {
        Schema::Null => Symbol::Null,
        Schema::Boolean => Symbol::Boolean,
        Schema::Int => Symbol::Int,
        Schema::Long => Symbol::Long,
        Schema::Float => Symbol::Float,
        Schema::Double => Symbol::Double,
        Schema::Bytes => Symbol::Bytes,
        Schema::String => Symbol::String,
        Schema::Fixed(fixed) => sequence(vec![Symbol::Fixed, Symbol::FixedSize(fixed.size)]),
        Schema::Enum(inner) => {
            let labels: Vec<SmolStr> = inner.symbols.iter().map(SmolStr::new).collect();
            sequence(vec![Symbol::Enum, Symbol::EnumLabels(Rc::from(labels))])
        }
        Schema::Array(items) => sequence(vec![
            Symbol::ArrayStart,
            Symbol::Repeater {
                end: Rc::new(Symbol::ArrayEnd),
                body: Rc::from(vec![generate(items), Symbol::ItemEnd]),
            },
        ]),
        Schema::Map(values) => sequence(vec![
            Symbol::MapStart,
            Symbol::Repeater {
                end: Rc::new(Symbol::MapEnd),
                body: Rc::from(vec![
                    Symbol::String,
                    Symbol::MapKeyMarker,
                    generate(values),
                    Symbol::ItemEnd,
                ]),
            },
        ]),
        Schema::Record(record) => {
            let mut production = Vec::with_capacity(record.fields.len() * 3 + 2);
            production.push(Symbol::RecordStart);
            for field in &record.fields {
                production.push(Symbol::FieldAdjust(SmolStr::new(&field.name)));
                production.push(generate(&field.schema));
                production.push(Symbol::FieldEnd);
            }
            production.push(Symbol::RecordEnd);
            Symbol::Sequence(Rc::from(production))
        }
        Schema::Union(branches) => {
            let alternative = Alternative {
                labels: branches.iter().map(|b| SmolStr::new(b.label())).collect(),
                branches: branches.iter().map(generate).collect(),
            };
            sequence(vec![Symbol::Union, Symbol::Alternative(Rc::new(alternative))])
        }
    }
}

fn sequence(production: Vec<Symbol>) -> Symbol {
    Symbol::Sequence(Rc::from(production))
}
