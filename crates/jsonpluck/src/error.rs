use thiserror::Error;

use crate::source::SourceError;

/// Error returned by [`compile`](crate::compile) for a malformed path
/// expression.
///
/// `offset` is the byte offset of the offending character in the expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at offset {offset}")]
pub struct CompileError {
    /// What went wrong.
    pub kind: CompileErrorKind,
    /// Byte offset into the path expression.
    pub offset: usize,
}

/// The reason a path expression was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    #[error("expected '$' at the start of the path")]
    ExpectedRoot,
    #[error("unexpected character '{}'", .0.escape_debug())]
    UnexpectedChar(char),
    #[error("unexpected end of path")]
    UnexpectedEnd,
    #[error("empty key")]
    EmptyKey,
    #[error("empty index expression")]
    EmptyIndex,
    #[error("negative indices are not supported")]
    NegativeIndex,
    #[error("index does not fit in usize")]
    IndexOverflow,
    #[error("unbalanced '{0}'")]
    Unbalanced(char),
    #[error("malformed filter: {0}")]
    MalformedFilter(&'static str),
    #[error("unterminated string literal")]
    UnterminatedLiteral,
    #[error("selector is already marked")]
    RepeatedMarker,
}

/// A malformed JSON document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at byte {offset} ({line}:{column})")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset of the offending byte from the start of the input.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("invalid character {}", escape_byte(.0))]
    InvalidCharacter(u8),
    #[error("invalid escape sequence '\\{}'", escape_byte(.0))]
    InvalidEscape(u8),
    #[error("invalid unicode escape digit {}", escape_byte(.0))]
    InvalidUnicodeEscape(u8),
    #[error("mismatched closing bracket {}", escape_byte(.0))]
    MismatchedBracket(u8),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
}

/// Fatal error recorded by an [`Eval`](crate::Eval) session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("nesting depth {depth} exceeds the configured limit at byte {offset}")]
    DepthLimitExceeded { depth: usize, offset: usize },
    #[error("read failed at byte {offset}: {source}")]
    Read { offset: usize, source: SourceError },
    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),
}

fn escape_byte(b: &u8) -> alloc::string::String {
    use alloc::string::ToString;

    match *b {
        b'\'' => "'\\''".to_string(),
        0x20..=0x7e => alloc::format!("'{}'", *b as char),
        other => alloc::format!("0x{other:02X}"),
    }
}
