use core::fmt;

/// The JSON type of a matched value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JsonKind {
    String,
    Number,
    Object,
    Array,
    Boolean,
    Null,
}

impl JsonKind {
    /// Returns `true` for objects and arrays.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, JsonKind::Object | JsonKind::Array)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JsonKind::String => "string",
            JsonKind::Number => "number",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
            JsonKind::Boolean => "boolean",
            JsonKind::Null => "null",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
