//! Scanner: structural JSON tokenizer over a [`ByteSource`].
//!
//! The scanner recognizes value boundaries and classifies them without
//! building any tree. Keys and scalar values are copied, raw and undecoded,
//! into a reusable scratch buffer that stays valid until the next call to
//! [`Scanner::next_token`]. Commas and colons are validated and consumed
//! internally; the token stream carries only what the matcher needs.
//!
//! Structure is validated with a parse-state machine plus a container stack,
//! so mismatched brackets, trailing commas and truncated input are reported
//! as [`SyntaxError`]s tagged with the byte offset of the offending byte.
//!
//! Invariants
//! - The lexeme of a string includes both quotes and every escape sequence
//!   exactly as it appeared in the input.
//! - Number and literal lexemes are byte-exact.
//! - After `Token::Eof` or an error, the scanner keeps returning the same
//!   outcome class: `Eof` forever after `Eof`.

use alloc::vec::Vec;
use core::ops::Range;

use crate::{
    EvalError, JsonKind,
    error::{SyntaxError, SyntaxErrorKind},
    literal_buffer::{ExpectedLiteralBuffer, Step},
    source::{ByteSource, SourceError},
};


/// A structural event produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    ObjectBegin,
    ObjectEnd,
    ArrayBegin,
    ArrayEnd,
    /// An object member name; the quoted bytes are in [`Scanner::lexeme`].
    Key,
    /// A scalar value; its raw bytes are in [`Scanner::lexeme`].
    Scalar(JsonKind),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    /// Just after `{`: a key or `}`.
    ObjectOpen,
    /// After a `,` in an object: a key only.
    BeforePropertyName,
    AfterPropertyName,
    BeforePropertyValue,
    AfterPropertyValue,
    /// Just after `[`: a value or `]`.
    ArrayOpen,
    /// After a `,` in an array: a value only.
    BeforeArrayValue,
    AfterArrayValue,
    End,
    Eof,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScannerConfig {
    pub max_depth: usize,
    pub multiple_values: bool,
    pub unicode_whitespace: bool,
}

pub(crate) struct Scanner<S> {
    source: S,
    state: ParseState,
    stack: Vec<Container>,
    scratch: Vec<u8>,
    token_start: usize,
    offset: usize,
    line: usize,
    column: usize,
    config: ScannerConfig,
}

impl<S: ByteSource> Scanner<S> {
    pub(crate) fn new(source: S, config: ScannerConfig) -> Self {
        Self {
            source,
            state: ParseState::Start,
            stack: Vec::with_capacity(16),
            scratch: Vec::new(),
            token_start: 0,
            offset: 0,
            line: 1,
            column: 1,
            config,
        }
    }

    /// Raw bytes of the last `Key` or `Scalar` token.
    pub(crate) fn lexeme(&self) -> &[u8] {
        &self.scratch
    }

    /// Byte range of the last token in the input.
    pub(crate) fn span(&self) -> Range<usize> {
        self.token_start..self.offset
    }

    #[cfg(test)]
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// Scans up to and including the next structural token.
    pub(crate) fn next_token(&mut self) -> Result<Token, EvalError> {
        loop {
            self.skip_whitespace()?;
            self.token_start = self.offset;

            let Some(b) = self.peek()? else {
                return self.end_of_input();
            };

            match self.state {
                ParseState::Start
                | ParseState::BeforePropertyValue
                | ParseState::BeforeArrayValue => return self.value(b),

                ParseState::ArrayOpen => {
                    if b == b']' {
                        return self.close(b, Container::Array);
                    }
                    return self.value(b);
                }

                ParseState::ObjectOpen | ParseState::BeforePropertyName => match b {
                    b'"' => {
                        self.lex_string()?;
                        self.state = ParseState::AfterPropertyName;
                        return Ok(Token::Key);
                    }
                    b'}' if self.state == ParseState::ObjectOpen => {
                        return self.close(b, Container::Object);
                    }
                    _ => return Err(self.syntax_error(SyntaxErrorKind::InvalidCharacter(b))),
                },

                ParseState::AfterPropertyName => {
                    if b != b':' {
                        return Err(self.syntax_error(SyntaxErrorKind::InvalidCharacter(b)));
                    }
                    self.bump(b);
                    self.state = ParseState::BeforePropertyValue;
                }

                ParseState::AfterPropertyValue => match b {
                    b',' => {
                        self.bump(b);
                        self.state = ParseState::BeforePropertyName;
                    }
                    b'}' => return self.close(b, Container::Object),
                    b']' => return Err(self.syntax_error(SyntaxErrorKind::MismatchedBracket(b))),
                    _ => return Err(self.syntax_error(SyntaxErrorKind::InvalidCharacter(b))),
                },

                ParseState::AfterArrayValue => match b {
                    b',' => {
                        self.bump(b);
                        self.state = ParseState::BeforeArrayValue;
                    }
                    b']' => return self.close(b, Container::Array),
                    b'}' => return Err(self.syntax_error(SyntaxErrorKind::MismatchedBracket(b))),
                    _ => return Err(self.syntax_error(SyntaxErrorKind::InvalidCharacter(b))),
                },

                ParseState::End => {
                    if !self.config.multiple_values {
                        return Err(self.syntax_error(SyntaxErrorKind::InvalidCharacter(b)));
                    }
                    self.state = ParseState::Start;
                }

                ParseState::Eof => return Ok(Token::Eof),
            }
        }
    }

    fn end_of_input(&mut self) -> Result<Token, EvalError> {
        match self.state {
            ParseState::End | ParseState::Eof => {}
            ParseState::Start if self.config.multiple_values => {}
            _ => return Err(self.syntax_error(SyntaxErrorKind::UnexpectedEndOfInput)),
        }
        self.state = ParseState::Eof;
        Ok(Token::Eof)
    }

    // ------------------------------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------------------------------

    fn value(&mut self, b: u8) -> Result<Token, EvalError> {
        let token = match b {
            b'{' => return self.open(b, Container::Object),
            b'[' => return self.open(b, Container::Array),
            b'"' => {
                self.lex_string()?;
                Token::Scalar(JsonKind::String)
            }
            b'-' | b'0'..=b'9' => {
                self.lex_number()?;
                Token::Scalar(JsonKind::Number)
            }
            b't' | b'f' | b'n' => Token::Scalar(self.lex_literal(b)?),
            _ => return Err(self.syntax_error(SyntaxErrorKind::InvalidCharacter(b))),
        };
        self.after_value();
        Ok(token)
    }

    fn after_value(&mut self) {
        self.state = match self.stack.last() {
            None => ParseState::End,
            Some(Container::Array) => ParseState::AfterArrayValue,
            Some(Container::Object) => ParseState::AfterPropertyValue,
        };
    }

    fn open(&mut self, b: u8, container: Container) -> Result<Token, EvalError> {
        if self.stack.len() >= self.config.max_depth {
            return Err(EvalError::DepthLimitExceeded {
                depth: self.stack.len() + 1,
                offset: self.offset,
            });
        }
        self.bump(b);
        self.stack.push(container);
        Ok(match container {
            Container::Object => {
                self.state = ParseState::ObjectOpen;
                Token::ObjectBegin
            }
            Container::Array => {
                self.state = ParseState::ArrayOpen;
                Token::ArrayBegin
            }
        })
    }

    fn close(&mut self, b: u8, container: Container) -> Result<Token, EvalError> {
        if self.stack.last() != Some(&container) {
            return Err(self.syntax_error(SyntaxErrorKind::MismatchedBracket(b)));
        }
        self.bump(b);
        self.stack.pop();
        self.after_value();
        Ok(match container {
            Container::Object => Token::ObjectEnd,
            Container::Array => Token::ArrayEnd,
        })
    }

    // ------------------------------------------------------------------------------------------------
    // Lexer
    // ------------------------------------------------------------------------------------------------

    fn lex_string(&mut self) -> Result<(), EvalError> {
        self.scratch.clear();
        self.capture(b'"');

        loop {
            // Fast path: everything up to a quote, backslash or control byte.
            let copied = self
                .source
                .take_while(&mut self.scratch, |b| b != b'"' && b != b'\\' && b >= 0x20)
                .map_err(|err| self.read_error(err))?;
            self.offset += copied;
            self.column += copied;

            match self.peek()? {
                None => return Err(self.syntax_error(SyntaxErrorKind::UnexpectedEndOfInput)),
                Some(b'"') => {
                    self.capture(b'"');
                    return Ok(());
                }
                Some(b'\\') => {
                    self.capture(b'\\');
                    self.lex_escape()?;
                }
                Some(b) => return Err(self.syntax_error(SyntaxErrorKind::InvalidCharacter(b))),
            }
        }
    }

    fn lex_escape(&mut self) -> Result<(), EvalError> {
        match self.peek()? {
            None => Err(self.syntax_error(SyntaxErrorKind::UnexpectedEndOfInput)),
            Some(b @ (b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't')) => {
                self.capture(b);
                Ok(())
            }
            Some(b'u') => {
                self.capture(b'u');
                for _ in 0..4 {
                    match self.peek()? {
                        Some(h) if h.is_ascii_hexdigit() => self.capture(h),
                        Some(h) => {
                            return Err(self.syntax_error(SyntaxErrorKind::InvalidUnicodeEscape(h)));
                        }
                        None => {
                            return Err(self.syntax_error(SyntaxErrorKind::UnexpectedEndOfInput));
                        }
                    }
                }
                Ok(())
            }
            Some(b) => Err(self.syntax_error(SyntaxErrorKind::InvalidEscape(b))),
        }
    }

    fn lex_number(&mut self) -> Result<(), EvalError> {
        self.scratch.clear();

        if self.peek()? == Some(b'-') {
            self.capture(b'-');
        }

        // Integer part: a single zero, or a non-zero digit followed by digits.
        match self.peek()? {
            Some(b'0') => self.capture(b'0'),
            Some(b @ b'1'..=b'9') => {
                self.capture(b);
                self.capture_digits()?;
            }
            other => return Err(self.unexpected(other)),
        }

        if self.peek()? == Some(b'.') {
            self.capture(b'.');
            self.expect_digits()?;
        }

        if let Some(b @ (b'e' | b'E')) = self.peek()? {
            self.capture(b);
            if let Some(sign @ (b'+' | b'-')) = self.peek()? {
                self.capture(sign);
            }
            self.expect_digits()?;
        }

        Ok(())
    }

    fn expect_digits(&mut self) -> Result<(), EvalError> {
        match self.peek()? {
            Some(b) if b.is_ascii_digit() => {
                self.capture(b);
                self.capture_digits()
            }
            other => Err(self.unexpected(other)),
        }
    }

    fn capture_digits(&mut self) -> Result<(), EvalError> {
        let copied = self
            .source
            .take_while(&mut self.scratch, |b| b.is_ascii_digit())
            .map_err(|err| self.read_error(err))?;
        self.offset += copied;
        self.column += copied;
        Ok(())
    }

    fn lex_literal(&mut self, first: u8) -> Result<JsonKind, EvalError> {
        self.scratch.clear();
        self.capture(first);
        let mut expected = ExpectedLiteralBuffer::new(first);

        loop {
            let Some(b) = self.peek()? else {
                return Err(self.syntax_error(SyntaxErrorKind::UnexpectedEndOfInput));
            };
            match expected.step(b) {
                Step::NeedMore => self.capture(b),
                Step::Done(kind) => {
                    self.capture(b);
                    return Ok(kind);
                }
                Step::Reject => {
                    return Err(self.syntax_error(SyntaxErrorKind::InvalidCharacter(b)));
                }
            }
        }
    }

    // ------------------------------------------------------------------------------------------------
    // Whitespace
    // ------------------------------------------------------------------------------------------------

    fn skip_whitespace(&mut self) -> Result<(), EvalError> {
        while let Some(b) = self.peek()? {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.bump(b),
                0xC2 | 0xE1 | 0xE2 | 0xE3 | 0xEF if self.config.unicode_whitespace => {
                    self.skip_unicode_whitespace(b)?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Consumes one UTF-8 encoded whitespace character starting with `lead`.
    ///
    /// Non-ASCII bytes can never start a token, so anything that is not
    /// whitespace is reported as an invalid character at the lead byte.
    fn skip_unicode_whitespace(&mut self, lead: u8) -> Result<(), EvalError> {
        let start = (self.offset, self.line, self.column);
        let width = if lead == 0xC2 { 2 } else { 3 };
        let mut encoded = [lead, 0, 0];
        self.bump(lead);
        for slot in encoded.iter_mut().take(width).skip(1) {
            match self.peek()? {
                Some(b) if b & 0xC0 == 0x80 => {
                    *slot = b;
                    self.bump(b);
                }
                _ => break,
            }
        }
        let is_whitespace = core::str::from_utf8(&encoded[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .is_some_and(|c| c.is_whitespace() || c == '\u{FEFF}');
        if is_whitespace {
            return Ok(());
        }
        Err(EvalError::Syntax(SyntaxError {
            kind: SyntaxErrorKind::InvalidCharacter(lead),
            offset: start.0,
            line: start.1,
            column: start.2,
        }))
    }

    // ------------------------------------------------------------------------------------------------
    // Input helpers
    // ------------------------------------------------------------------------------------------------

    #[inline]
    fn peek(&mut self) -> Result<Option<u8>, EvalError> {
        self.source.peek().map_err(|err| self.read_error(err))
    }

    #[inline]
    fn bump(&mut self, b: u8) {
        self.source.bump();
        self.offset += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Consumes `b` (already peeked) into the lexeme.
    #[inline]
    fn capture(&mut self, b: u8) {
        self.scratch.push(b);
        self.bump(b);
    }

    // ------------------------------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------------------------------

    fn unexpected(&self, b: Option<u8>) -> EvalError {
        match b {
            Some(b) => self.syntax_error(SyntaxErrorKind::InvalidCharacter(b)),
            None => self.syntax_error(SyntaxErrorKind::UnexpectedEndOfInput),
        }
    }

    fn syntax_error(&self, kind: SyntaxErrorKind) -> EvalError {
        EvalError::Syntax(SyntaxError {
            kind,
            offset: self.offset,
            line: self.line,
            column: self.column,
        })
    }

    fn read_error(&self, source: SourceError) -> EvalError {
        EvalError::Read {
            offset: self.offset,
            source,
        }
    }
}
