#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Reject fields the schema never claims. When false, leftover buffered
    /// fields are dropped at record close instead of raising
    /// [`Error::UnknownFields`](crate::Error::UnknownFields).
    pub strict: bool,
    /// Cap on out-of-order fields buffered per record scope.
    pub max_buffered_fields: usize,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_max_buffered_fields(mut self, max_buffered_fields: usize) -> Self {
        self.max_buffered_fields = max_buffered_fields;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict: true,
            max_buffered_fields: 1024,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Two-space pretty printing.
    pub pretty: bool,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}
