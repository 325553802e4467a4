use thiserror::Error;

/// Errors raised while encoding or decoding. All of them are fatal to the
/// current call; the codec never retries or recovers internally, and a
/// decoder or encoder that returned an error is not safe to keep using.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The current token does not match what the schema grammar expects.
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Input ran out while the grammar was still at its outermost symbol.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A union wrapper names a branch absent from the branch descriptor.
    #[error("unknown union branch {0}")]
    UnknownUnionBranch(String),

    /// Fields were buffered for reordering but never claimed by the schema.
    #[error("unknown fields: {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    /// The live object ran out of fields before a schema-declared one
    /// appeared.
    #[error("expected field name not found: {0}")]
    MissingField(String),

    /// Caller-declared fixed size disagrees with the schema's.
    #[error("incorrect length for fixed binary: expected {expected} but received {actual} bytes")]
    FixedLengthMismatch { expected: usize, actual: usize },

    /// Decoded fixed payload has the wrong byte count.
    #[error("expected fixed length {expected}, but got {actual}")]
    FixedContentMismatch { expected: usize, actual: usize },

    /// Decoded enum text is not in the schema's symbol set.
    #[error("unknown symbol in enum: {0}")]
    UnknownEnumSymbol(String),

    /// The grammar handed the interpreter an action it does not recognize.
    /// Indicates a grammar/interpreter mismatch, not bad input.
    #[error("unknown action symbol {0}")]
    UnsupportedAction(String),

    /// The grammar stack held a symbol incompatible with the requested one.
    #[error("attempt to process a {found} when a {expected} was expected")]
    SymbolMismatch { expected: String, found: String },

    /// A numeric token parsed but does not fit the target primitive.
    #[error("number out of range for {expected}: {text}")]
    NumberOutOfRange {
        expected: &'static str,
        text: String,
    },

    /// Too many out-of-order fields buffered for a single record.
    #[error("too many buffered fields in record, limit is {limit}")]
    ReorderOverflow { limit: usize },

    /// The input is not well-formed JSON.
    #[error("{message} at offset {offset}")]
    Syntax {
        message: &'static str,
        offset: usize,
    },

    /// The schema declaration itself could not be parsed.
    #[error("invalid schema: {0}")]
    Schema(String),

    /// A value handed to the encoder does not conform to the schema.
    #[error("value does not match schema: {0}")]
    ValueMismatch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
