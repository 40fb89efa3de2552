//! Path compiler.
//!
//! Turns a path expression such as `$.items[*]?(@.name == "bravo").value+`
//! into a [`PathProgram`]: the flat selector chain plus the per-level steps
//! the matcher walks. Compilation is a single left-to-right pass; nothing
//! after a failure is examined and no partial program is returned.
//!
//! ```text
//! path       := "$" marker? segment*
//! segment    := ( "." key | "[" ws index-expr ws "]" | "?(" predicate ")" ) marker?
//! key        := identifier | "*"
//! index-expr := integer | "*" | integer? ":" integer? | "?(" predicate ")" | literal
//! predicate  := operand "==" operand
//! operand    := literal | "@." key
//! marker     := "+"
//! ```

use alloc::{sync::Arc, vec::Vec};
use core::{fmt, str::FromStr};

use bstr::BString;

use crate::{
    CompileError, CompileErrorKind,
    filter::{Field, Predicate},
};

/// What a selector matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// `$`, the document root.
    Root,
    /// `.name` or `["name"]`; the raw bytes of the member name.
    Key(BString),
    /// `[n]`
    Index(usize),
    /// `.*` or `[*]`
    Wildcard,
    /// `[start:end]`, half open. A missing `end` is unbounded.
    Slice { start: usize, end: Option<usize> },
    /// `?( ... )`, guarding the value selected by the preceding selector.
    Filter(Predicate),
}

impl SelectorKind {
    /// Whether the selector moves one level down the document.
    #[must_use]
    pub fn is_consuming(&self) -> bool {
        !matches!(self, SelectorKind::Filter(_))
    }
}

/// One unit of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub kind: SelectorKind,
    /// Set by a trailing `+`: values reached here are emitted.
    pub marker: bool,
}

/// One nesting level of the path: a consuming selector plus the filters and
/// markers attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    /// Index of the consuming selector in the chain.
    pub(crate) selector: usize,
    /// Indices of the filter selectors guarding this level, in order.
    pub(crate) guards: Vec<usize>,
    /// One entry per marker: how many leading guards must pass before the
    /// marked value is emitted.
    pub(crate) marks: Vec<usize>,
}

/// A child position offered to a step.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Child<'a> {
    /// An object member; the quoted name as written in the document.
    Member(&'a [u8]),
    Element(usize),
}

/// A compiled path expression.
///
/// Programs are immutable and can be shared by any number of evaluation
/// sessions, including across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathProgram {
    source: Arc<str>,
    selectors: Vec<Selector>,
    steps: Vec<Step>,
}

impl PathProgram {
    /// The expression this program was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn shared_source(&self) -> &Arc<str> {
        &self.source
    }

    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Number of selectors flagged with `+`.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.selectors.iter().filter(|s| s.marker).count()
    }

    pub(crate) fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub(crate) fn guard(&self, step: usize, guard: usize) -> &Predicate {
        match &self.selectors[self.steps[step].guards[guard]].kind {
            SelectorKind::Filter(predicate) => predicate,
            _ => unreachable!("step guards always point at filter selectors"),
        }
    }

    /// Whether the child at `child` of a value sitting on `step` advances
    /// to `step + 1`.
    pub(crate) fn accepts(&self, step: usize, child: Child<'_>) -> bool {
        let Some(next) = self.steps.get(step + 1) else {
            return false;
        };
        match (&self.selectors[next.selector].kind, child) {
            (SelectorKind::Wildcard, _) => true,
            (SelectorKind::Key(name), Child::Member(key)) => {
                crate::filter::unquote(key) == name.as_slice()
            }
            (SelectorKind::Index(n), Child::Element(i)) => *n == i,
            (SelectorKind::Slice { start, end }, Child::Element(i)) => {
                *start <= i && end.is_none_or(|end| i < end)
            }
            _ => false,
        }
    }
}

impl fmt::Display for PathProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for PathProgram {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        compile(s)
    }
}

/// Compiles a path expression.
///
/// # Errors
///
/// Returns a [`CompileError`] pointing at the first offending character.
///
/// # Examples
///
/// ```rust
/// let program = jsonpluck::compile("$.aKey[1:3]+").unwrap();
/// assert_eq!(program.selectors().len(), 3);
/// assert_eq!(program.marker_count(), 1);
///
/// let err = jsonpluck::compile("$.aKey[-1]+").unwrap_err();
/// assert_eq!(err.to_string(), "negative indices are not supported at offset 7");
/// ```
pub fn compile(expr: &str) -> Result<PathProgram, CompileError> {
    let selectors = Compiler::new(expr).run()?;
    let steps = plan(&selectors);
    log::debug!(
        "compiled path {expr:?}: {} selectors, {} levels",
        selectors.len(),
        steps.len()
    );
    Ok(PathProgram {
        source: Arc::from(expr),
        selectors,
        steps,
    })
}

/// Compiles a set of path expressions for evaluation in a single scan.
///
/// # Errors
///
/// Returns the [`CompileError`] of the first expression that fails to
/// compile.
///
/// # Examples
///
/// ```rust
/// let programs = jsonpluck::compile_paths(["$.a+", "$.b[*]+"]).unwrap();
/// assert_eq!(programs[1].source(), "$.b[*]+");
/// ```
pub fn compile_paths<I>(exprs: I) -> Result<Vec<PathProgram>, CompileError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    exprs
        .into_iter()
        .map(|expr| {
            compile(expr.as_ref()).inspect_err(|err| {
                log::debug!("rejected path {:?}: {err}", expr.as_ref());
            })
        })
        .collect()
}

/// Groups the selector chain into levels and drops the levels below the
/// deepest marker, which can never produce output.
fn plan(selectors: &[Selector]) -> Vec<Step> {
    let mut steps: Vec<Step> = Vec::new();
    for (i, selector) in selectors.iter().enumerate() {
        if selector.kind.is_consuming() {
            steps.push(Step {
                selector: i,
                guards: Vec::new(),
                marks: if selector.marker { alloc::vec![0] } else { Vec::new() },
            });
        } else if let Some(step) = steps.last_mut() {
            step.guards.push(i);
            if selector.marker {
                step.marks.push(step.guards.len());
            }
        }
    }
    let deepest = steps.iter().rposition(|s| !s.marks.is_empty()).map_or(0, |i| i + 1);
    steps.truncate(deepest.max(1));
    steps
}

struct Compiler<'a> {
    src: &'a str,
    pos: usize,
    selectors: Vec<Selector>,
}

impl<'a> Compiler<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            selectors: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Selector>, CompileError> {
        if self.peek() != Some(b'$') {
            return Err(self.error(CompileErrorKind::ExpectedRoot));
        }
        self.pos += 1;
        self.push(SelectorKind::Root);
        self.marker()?;

        while let Some(b) = self.peek() {
            match b {
                b'.' => {
                    self.pos += 1;
                    let kind = if self.peek() == Some(b'*') {
                        self.pos += 1;
                        SelectorKind::Wildcard
                    } else {
                        SelectorKind::Key(self.identifier()?)
                    };
                    self.push(kind);
                }
                b'[' => self.bracket()?,
                b'?' => {
                    let predicate = self.filter()?;
                    self.push(SelectorKind::Filter(predicate));
                }
                _ => return Err(self.unexpected()),
            }
            self.marker()?;
        }
        Ok(self.selectors)
    }

    fn push(&mut self, kind: SelectorKind) {
        self.selectors.push(Selector {
            kind,
            marker: false,
        });
    }

    fn marker(&mut self) -> Result<(), CompileError> {
        if self.peek() != Some(b'+') {
            return Ok(());
        }
        self.pos += 1;
        if let Some(last) = self.selectors.last_mut() {
            last.marker = true;
        }
        if self.peek() == Some(b'+') {
            return Err(self.error(CompileErrorKind::RepeatedMarker));
        }
        Ok(())
    }

    fn bracket(&mut self) -> Result<(), CompileError> {
        let open = self.pos;
        self.pos += 1;
        self.skip_ws();

        match self.peek() {
            None => return Err(self.error_at(open, CompileErrorKind::Unbalanced('['))),
            Some(b'*') => {
                self.pos += 1;
                self.push(SelectorKind::Wildcard);
            }
            Some(b'?') => {
                let predicate = self.filter()?;
                self.push(SelectorKind::Wildcard);
                self.push(SelectorKind::Filter(predicate));
            }
            Some(b'"') => {
                let key = self.literal()?;
                self.push(SelectorKind::Key(key));
            }
            Some(b'0'..=b'9' | b':') => {
                let kind = self.index_or_slice()?;
                self.push(kind);
            }
            Some(b'-') => return Err(self.error(CompileErrorKind::NegativeIndex)),
            Some(b']') => return Err(self.error(CompileErrorKind::EmptyIndex)),
            Some(_) => return Err(self.unexpected()),
        }

        self.skip_ws();
        match self.peek() {
            Some(b']') => {
                self.pos += 1;
                Ok(())
            }
            None => Err(self.error_at(open, CompileErrorKind::Unbalanced('['))),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn index_or_slice(&mut self) -> Result<SelectorKind, CompileError> {
        let start = self.integer()?;
        self.skip_ws();
        if self.peek() != Some(b':') {
            return match start {
                Some(index) => Ok(SelectorKind::Index(index)),
                None => Err(self.error(CompileErrorKind::EmptyIndex)),
            };
        }
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(b'-') {
            return Err(self.error(CompileErrorKind::NegativeIndex));
        }
        let end = self.integer()?;
        Ok(SelectorKind::Slice {
            start: start.unwrap_or(0),
            end,
        })
    }

    fn integer(&mut self) -> Result<Option<usize>, CompileError> {
        let begin = self.pos;
        let mut value: usize = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(usize::from(b - b'0')))
                .ok_or_else(|| self.error_at(begin, CompileErrorKind::IndexOverflow))?;
            self.pos += 1;
        }
        Ok((self.pos > begin).then_some(value))
    }

    fn filter(&mut self) -> Result<Predicate, CompileError> {
        let at = self.pos;
        self.pos += 1;
        let paren = self.pos;
        match self.peek() {
            Some(b'(') => self.pos += 1,
            None => return Err(self.error(CompileErrorKind::UnexpectedEnd)),
            Some(_) => return Err(self.unexpected()),
        }

        self.skip_ws();
        let left = self.operand()?;
        self.skip_ws();
        if !self.src[self.pos..].starts_with("==") {
            return Err(self.error(CompileErrorKind::MalformedFilter("expected '=='")));
        }
        self.pos += 2;
        self.skip_ws();
        let right = self.operand()?;
        self.skip_ws();
        match self.peek() {
            Some(b')') => self.pos += 1,
            None => return Err(self.error_at(paren, CompileErrorKind::Unbalanced('('))),
            Some(_) => return Err(self.unexpected()),
        }

        match (left, right) {
            (Operand::Literal(left), Operand::Literal(right)) => {
                Ok(Predicate::Literals { left, right })
            }
            (Operand::Field(field), Operand::Literal(literal))
            | (Operand::Literal(literal), Operand::Field(field)) => {
                Ok(Predicate::Field { field, literal })
            }
            (Operand::Field(_), Operand::Field(_)) => Err(self.error_at(
                at,
                CompileErrorKind::MalformedFilter("one operand must be a string literal"),
            )),
        }
    }

    fn operand(&mut self) -> Result<Operand, CompileError> {
        match self.peek() {
            Some(b'"') => Ok(Operand::Literal(self.literal()?)),
            Some(b'@') => {
                self.pos += 1;
                if self.peek() != Some(b'.') {
                    return Err(self.error(CompileErrorKind::MalformedFilter(
                        "expected '.' after '@'",
                    )));
                }
                self.pos += 1;
                if self.peek() == Some(b'*') {
                    self.pos += 1;
                    return Ok(Operand::Field(Field::Any));
                }
                Ok(Operand::Field(Field::Named(self.identifier()?)))
            }
            None => Err(self.error(CompileErrorKind::UnexpectedEnd)),
            Some(_) => Err(self.error(CompileErrorKind::MalformedFilter(
                "expected a string literal or '@.'",
            ))),
        }
    }

    /// A double-quoted literal; returns the raw bytes between the quotes.
    fn literal(&mut self) -> Result<BString, CompileError> {
        let open = self.pos;
        let bytes = self.src.as_bytes();
        let mut i = open + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'"' => {
                    self.pos = i + 1;
                    return Ok(BString::from(&bytes[open + 1..i]));
                }
                b'\\' => i += 2,
                _ => i += 1,
            }
        }
        Err(self.error_at(open, CompileErrorKind::UnterminatedLiteral))
    }

    fn identifier(&mut self) -> Result<BString, CompileError> {
        let begin = self.pos;
        while let Some(b) = self.peek() {
            if is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == begin {
            return Err(match self.peek() {
                None => self.error(CompileErrorKind::UnexpectedEnd),
                Some(_) => self.error(CompileErrorKind::EmptyKey),
            });
        }
        Ok(BString::from(&self.src.as_bytes()[begin..self.pos]))
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn unexpected(&self) -> CompileError {
        match self.src.get(self.pos..).and_then(|rest| rest.chars().next()) {
            Some(c) => self.error(CompileErrorKind::UnexpectedChar(c)),
            None => self.error(CompileErrorKind::UnexpectedEnd),
        }
    }

    fn error(&self, kind: CompileErrorKind) -> CompileError {
        self.error_at(self.pos, kind)
    }

    fn error_at(&self, offset: usize, kind: CompileErrorKind) -> CompileError {
        CompileError { kind, offset }
    }
}

enum Operand {
    Literal(BString),
    Field(Field),
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'.' | b'[' | b']' | b'(' | b')' | b'+' | b'?' | b'"' | b'=' | b'@' | b'*' | b' ' | b'\t' | b'\n' | b'\r'
    )
}
