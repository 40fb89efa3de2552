//! Evaluation sessions.
//!
//! An [`Eval`] walks the scanner's token stream once, keeping an explicit
//! stack of open containers, and applies any number of programs to it at the
//! same time. Each frame records, per program, how far down the path its
//! container sits and the state of the filters guarding it, along with the
//! child currently being visited and the captures recording it.
//!
//! Results are staged in *slots*, reserved in the order in which matched
//! values start (and in program order for a value several programs reach).
//! A slot is released once its value is complete and every filter it depends
//! on has passed; a failing filter kills the slot. The iterator only ever
//! hands out the front slot, so output follows document order even when a
//! filter is decided by a field that comes after the extracted one.
//!
//! Container values are re-assembled on a shared tape from their tokens,
//! which drops every insignificant whitespace byte while keeping scalar
//! text exactly as written.

use alloc::{collections::VecDeque, vec::Vec};
use core::iter::FusedIterator;

use bstr::BString;

use crate::{
    EvalError, EvalOptions, JsonKind, PathComponent, PathProgram,
    compiler::Child,
    filter::unquote,
    scanner::{Container, Scanner, ScannerConfig, Token},
    source::{ByteSource, SliceSource},
};

/// One extracted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The expression of the program that produced this match.
    pub path: alloc::sync::Arc<str>,
    /// Raw text of the value. Scalars are byte-exact; objects and arrays
    /// have their insignificant whitespace removed.
    pub value: BString,
    pub kind: JsonKind,
    /// Route from the document root to the value.
    pub keys: Vec<PathComponent>,
}

#[cfg(feature = "serde")]
impl serde::Serialize for Match {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use bstr::ByteSlice;
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Match", 4)?;
        state.serialize_field("path", &*self.path)?;
        state.serialize_field("value", &self.value.to_str_lossy())?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("keys", &self.keys)?;
        state.end()
    }
}

/// Evaluates `program` against an in-memory document.
///
/// # Errors
///
/// Never fails for the default options; the result type matches
/// [`Eval::new`].
///
/// # Examples
///
/// ```rust
/// let program = jsonpluck::compile("$.aKey[*]+").unwrap();
/// let values: Vec<_> = jsonpluck::eval_bytes(br#"{"aKey":[123, 456]}"#, &program)
///     .unwrap()
///     .map(|m| m.value)
///     .collect();
/// assert_eq!(values, ["123", "456"]);
/// ```
pub fn eval_bytes<'a, 'p>(
    doc: &'a [u8],
    program: &'p PathProgram,
) -> Result<Eval<'p, SliceSource<'a>>, EvalError> {
    Eval::new(SliceSource::new(doc), program, EvalOptions::default())
}

/// Evaluates several programs against an in-memory document in one scan.
///
/// Every [`Match`] names the program that produced it in [`Match::path`].
///
/// # Errors
///
/// Never fails for the default options; the result type matches
/// [`Eval::with_programs`].
///
/// # Examples
///
/// ```rust
/// let programs = jsonpluck::compile_paths(["$.b+", "$.a+"]).unwrap();
/// let found: Vec<_> = jsonpluck::eval_paths_bytes(br#"{"a":1,"b":2}"#, &programs)
///     .unwrap()
///     .map(|m| format!("{} {}", m.path, m.value))
///     .collect();
/// assert_eq!(found, ["$.a+ 1", "$.b+ 2"]);
/// ```
pub fn eval_paths_bytes<'a, 'p>(
    doc: &'a [u8],
    programs: &'p [PathProgram],
) -> Result<Eval<'p, SliceSource<'a>>, EvalError> {
    Eval::with_programs(SliceSource::new(doc), programs, EvalOptions::default())
}

/// Evaluates `program` against a byte stream, reading it incrementally.
///
/// # Errors
///
/// Never fails for the default options; the result type matches
/// [`Eval::new`].
#[cfg(feature = "std")]
pub fn eval_reader<R: std::io::Read>(
    reader: R,
    program: &PathProgram,
) -> Result<Eval<'_, crate::ReaderSource<R>>, EvalError> {
    Eval::from_reader(reader, program, EvalOptions::default())
}

/// Evaluates several programs against a byte stream in one scan.
///
/// # Errors
///
/// Never fails for the default options; the result type matches
/// [`Eval::with_programs`].
#[cfg(feature = "std")]
pub fn eval_paths_reader<R: std::io::Read>(
    reader: R,
    programs: &[PathProgram],
) -> Result<Eval<'_, crate::ReaderSource<R>>, EvalError> {
    Eval::from_reader_with_programs(reader, programs, EvalOptions::default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Unknown,
    Pass,
    Fail,
}

#[derive(Debug)]
struct Guard {
    outcome: Outcome,
    /// Slots waiting on this guard.
    dependents: Vec<usize>,
}

impl Guard {
    fn decided(pass: bool) -> Self {
        Self {
            outcome: if pass { Outcome::Pass } else { Outcome::Fail },
            dependents: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Capture {
    start: usize,
    slots: Vec<usize>,
}

/// Where one program stands in a container that is on its path.
#[derive(Debug)]
struct Track {
    /// Index of the program in the session.
    program: usize,
    /// Path level of the container.
    step: usize,
    /// Set once one of the guards failed: no child is on the path any more.
    blocked: bool,
    guards: Vec<Guard>,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    /// Elements (arrays) or members (objects) seen so far.
    count: usize,
    /// Quoted name of the current member, kept while any program is on
    /// this path.
    key: Vec<u8>,
    /// One entry per program on this path; empty when off every path.
    tracks: Vec<Track>,
    capture: Option<Capture>,
}

impl Frame {
    fn component(&self) -> PathComponent {
        match self.container {
            Container::Array => PathComponent::Index(self.count.saturating_sub(1)),
            Container::Object => PathComponent::Key(BString::from(unquote(&self.key))),
        }
    }
}

#[derive(Debug)]
struct Slot {
    program: usize,
    kind: JsonKind,
    keys: Vec<PathComponent>,
    value: Option<BString>,
    /// Unresolved guards this slot depends on.
    pending: usize,
    dead: bool,
}

impl Slot {
    fn is_ready(&self) -> bool {
        !self.dead && self.pending == 0 && self.value.is_some()
    }
}

/// Queue of staged results, addressed by absolute slot number.
#[derive(Debug, Default)]
struct Slots {
    queue: VecDeque<Slot>,
    /// Absolute number of the slot at the front of `queue`.
    base: usize,
}

impl Slots {
    fn next_id(&self) -> usize {
        self.base + self.queue.len()
    }

    fn get_mut(&mut self, id: usize) -> Option<&mut Slot> {
        id.checked_sub(self.base).and_then(|i| self.queue.get_mut(i))
    }

    fn pop_front(&mut self) -> Option<Slot> {
        let slot = self.queue.pop_front()?;
        self.base += 1;
        Some(slot)
    }

    /// Records the outcome of `guard` on every slot waiting for it.
    fn settle(&mut self, guard: &mut Guard, pass: bool) {
        guard.outcome = if pass { Outcome::Pass } else { Outcome::Fail };
        for id in guard.dependents.drain(..) {
            let Some(slot) = self.get_mut(id) else {
                continue;
            };
            if pass {
                slot.pending = slot.pending.saturating_sub(1);
            } else {
                slot.dead = true;
            }
        }
    }
}

/// An evaluation session: a set of programs applied to one document.
///
/// `Eval` is an iterator of [`Match`]es. It reads only as much input as is
/// needed to produce the next match. When the input turns out to be
/// malformed, matches that were already complete are still returned, the
/// iterator then ends and [`Eval::error`] reports what went wrong.
pub struct Eval<'p, S> {
    scanner: Scanner<S>,
    programs: &'p [PathProgram],
    frames: Vec<Frame>,
    slots: Slots,
    tape: Vec<u8>,
    open_captures: usize,
    finished: bool,
    error: Option<EvalError>,
    yielded: usize,
}

impl<'p, S: ByteSource> Eval<'p, S> {
    /// Starts a session applying one program to `source`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidOptions`] if `options` are out of range.
    pub fn new(source: S, program: &'p PathProgram, options: EvalOptions) -> Result<Self, EvalError> {
        Self::with_programs(source, core::slice::from_ref(program), options)
    }

    /// Starts a session applying every program in `programs` to `source`.
    ///
    /// Matches of all programs come out interleaved in document order; a
    /// value reached by several programs is reported once per program, in
    /// the order of `programs`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidOptions`] if `options` are out of range.
    pub fn with_programs(
        source: S,
        programs: &'p [PathProgram],
        options: EvalOptions,
    ) -> Result<Self, EvalError> {
        options.validate()?;
        log::debug!(
            "starting evaluation of {:?}",
            programs.iter().map(PathProgram::source).collect::<Vec<_>>()
        );
        Ok(Self {
            scanner: Scanner::new(
                source,
                ScannerConfig {
                    max_depth: options.max_depth,
                    multiple_values: options.allow_multiple_json_values,
                    unicode_whitespace: options.allow_unicode_whitespace,
                },
            ),
            programs,
            frames: Vec::new(),
            slots: Slots::default(),
            tape: Vec::new(),
            open_captures: 0,
            finished: false,
            error: None,
            yielded: 0,
        })
    }

    /// The error that ended the session, if any.
    #[must_use]
    pub fn error(&self) -> Option<&EvalError> {
        self.error.as_ref()
    }

    /// Runs the session to completion.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the session; matches found before it are
    /// discarded.
    pub fn into_matches(mut self) -> Result<Vec<Match>, EvalError> {
        let matches: Vec<Match> = self.by_ref().collect();
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(matches),
        }
    }

    /// Pulls one token and updates the session. Returns `false` at the end
    /// of input.
    fn advance(&mut self) -> Result<bool, EvalError> {
        match self.scanner.next_token()? {
            Token::Eof => return Ok(false),
            Token::Key => self.on_key(),
            Token::Scalar(kind) => self.on_value(kind, None),
            Token::ObjectBegin => self.on_value(JsonKind::Object, Some(Container::Object)),
            Token::ArrayBegin => self.on_value(JsonKind::Array, Some(Container::Array)),
            Token::ObjectEnd | Token::ArrayEnd => self.on_close(),
        }
        Ok(true)
    }

    fn on_key(&mut self) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        let lexeme = self.scanner.lexeme();
        if self.open_captures > 0 {
            if frame.count > 0 {
                self.tape.push(b',');
            }
            self.tape.extend_from_slice(lexeme);
            self.tape.push(b':');
        }
        if !frame.tracks.is_empty() {
            frame.key.clear();
            frame.key.extend_from_slice(lexeme);
        }
    }

    fn on_value(&mut self, kind: JsonKind, container: Option<Container>) {
        let located = self.locate(kind, container);

        let programs = self.programs;
        let mut tracks = Vec::with_capacity(located.len());
        let mut captured = Vec::new();
        for (index, step) in located {
            let program = &programs[index];
            let level = &program.steps()[step];
            let mut guards: Vec<Guard> = (0..level.guards.len())
                .map(|i| match program.guard(step, i).constant() {
                    Some(pass) => Guard::decided(pass),
                    None if container == Some(Container::Object) => Guard {
                        outcome: Outcome::Unknown,
                        dependents: Vec::new(),
                    },
                    None => Guard::decided(false),
                })
                .collect();

            for &threshold in &level.marks {
                if let Some(id) = self.stage(index, kind, &mut guards[..threshold]) {
                    captured.push(id);
                }
            }

            tracks.push(Track {
                program: index,
                step,
                blocked: guards.iter().any(|g| g.outcome == Outcome::Fail),
                guards,
            });
        }

        match container {
            Some(container) => {
                let capture = (!captured.is_empty()).then(|| Capture {
                    start: self.tape.len(),
                    slots: captured,
                });
                self.open(Frame {
                    container,
                    count: 0,
                    key: Vec::new(),
                    tracks,
                    capture,
                });
            }
            None => {
                if !captured.is_empty() {
                    let value = BString::from(self.scanner.lexeme());
                    for id in captured {
                        if let Some(slot) = self.slots.get_mut(id) {
                            slot.value = Some(value.clone());
                        }
                    }
                }
                if self.open_captures > 0 {
                    self.tape.extend_from_slice(self.scanner.lexeme());
                }
            }
        }
    }

    /// Registers a new value with its parent and returns, for every program
    /// the value is on the path of, the program index and the path level.
    fn locate(&mut self, kind: JsonKind, container: Option<Container>) -> Vec<(usize, usize)> {
        let Some(parent) = self.frames.last_mut() else {
            // A root value.
            return (0..self.programs.len()).map(|program| (program, 0)).collect();
        };

        let position = parent.count;
        parent.count += 1;
        if self.open_captures > 0 && parent.container == Container::Array && position > 0 {
            self.tape.push(b',');
        }

        let scalar = container.is_none().then(|| (kind, self.scanner.lexeme()));
        let mut located = Vec::new();
        for track in &mut parent.tracks {
            let program = &self.programs[track.program];
            if parent.container == Container::Object {
                for (i, guard) in track.guards.iter_mut().enumerate() {
                    if guard.outcome != Outcome::Unknown {
                        continue;
                    }
                    if let Some(pass) = program.guard(track.step, i).offer_child(&parent.key, scalar) {
                        self.slots.settle(guard, pass);
                        track.blocked |= !pass;
                    }
                }
            }

            if track.blocked {
                continue;
            }
            let child = match parent.container {
                Container::Array => Child::Element(position),
                Container::Object => Child::Member(&parent.key),
            };
            if program.accepts(track.step, child) {
                located.push((track.program, track.step + 1));
            }
        }
        located
    }

    /// Reserves a slot for a value that `program` reached with a marker.
    /// `own` are the guards of the value's level that precede the marker.
    fn stage(&mut self, program: usize, kind: JsonKind, own: &mut [Guard]) -> Option<usize> {
        if own.iter().any(|g| g.outcome == Outcome::Fail) {
            return None;
        }
        let id = self.slots.next_id();
        let mut pending = 0;
        let ancestors = self
            .frames
            .iter_mut()
            .flat_map(|f| f.tracks.iter_mut())
            .filter(|t| t.program == program)
            .flat_map(|t| t.guards.iter_mut());
        for guard in ancestors.chain(own.iter_mut()) {
            if guard.outcome == Outcome::Unknown {
                guard.dependents.push(id);
                pending += 1;
            }
        }
        let keys = self.frames.iter().map(Frame::component).collect();
        log::trace!(
            "staged slot {id} ({kind}) of {:?} at bytes {:?}, {pending} guards pending",
            self.programs[program].source(),
            self.scanner.span()
        );
        self.slots.queue.push_back(Slot {
            program,
            kind,
            keys,
            value: None,
            pending,
            dead: false,
        });
        Some(id)
    }

    fn open(&mut self, frame: Frame) {
        if frame.capture.is_some() {
            self.open_captures += 1;
        }
        if self.open_captures > 0 {
            self.tape.push(match frame.container {
                Container::Object => b'{',
                Container::Array => b'[',
            });
        }
        self.frames.push(frame);
    }

    fn on_close(&mut self) {
        let Some(mut frame) = self.frames.pop() else {
            return;
        };

        for guard in frame.tracks.iter_mut().flat_map(|t| t.guards.iter_mut()) {
            if guard.outcome == Outcome::Unknown {
                self.slots.settle(guard, false);
            }
        }

        if self.open_captures > 0 {
            self.tape.push(match frame.container {
                Container::Object => b'}',
                Container::Array => b']',
            });
        }

        if let Some(capture) = frame.capture {
            let value = BString::from(&self.tape[capture.start..]);
            for id in capture.slots {
                if let Some(slot) = self.slots.get_mut(id) {
                    slot.value = Some(value.clone());
                }
            }
            self.open_captures -= 1;
            if self.open_captures == 0 {
                self.tape.clear();
            }
        }
    }

    /// Pops the front slot if it can be handed out, discarding dead ones.
    fn pop_ready(&mut self) -> Option<Match> {
        while let Some(front) = self.slots.queue.front() {
            if front.dead {
                self.slots.pop_front();
            } else if front.is_ready() {
                let slot = self.slots.pop_front()?;
                return Some(self.emit(slot));
            } else {
                return None;
            }
        }
        None
    }

    fn emit(&mut self, slot: Slot) -> Match {
        self.yielded += 1;
        Match {
            path: self.programs[slot.program].shared_source().clone(),
            value: slot.value.unwrap_or_default(),
            kind: slot.kind,
            keys: slot.keys,
        }
    }

    fn finish(&mut self, error: Option<EvalError>) {
        self.finished = true;
        match &error {
            Some(err) => log::warn!(
                "evaluation of {} paths aborted after {} matches: {err}",
                self.programs.len(),
                self.yielded
            ),
            None => log::debug!(
                "evaluation of {} paths reached end of input after {} matches",
                self.programs.len(),
                self.yielded
            ),
        }
        self.error = error;
    }
}

impl<S: ByteSource> Iterator for Eval<'_, S> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        loop {
            if let Some(m) = self.pop_ready() {
                return Some(m);
            }
            if self.finished {
                // Whatever is still unresolved can no longer complete.
                self.slots.pop_front()?;
                continue;
            }
            match self.advance() {
                Ok(true) => {}
                Ok(false) => self.finish(None),
                Err(err) => self.finish(Some(err)),
            }
        }
    }
}

impl<S: ByteSource> FusedIterator for Eval<'_, S> {}

#[cfg(feature = "std")]
impl<'p, R: std::io::Read> Eval<'p, crate::ReaderSource<R>> {
    /// Starts a session that reads `reader` in chunks of
    /// [`EvalOptions::read_chunk_size`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidOptions`] if `options` are out of range.
    pub fn from_reader(
        reader: R,
        program: &'p PathProgram,
        options: EvalOptions,
    ) -> Result<Self, EvalError> {
        Self::from_reader_with_programs(reader, core::slice::from_ref(program), options)
    }

    /// Like [`Eval::from_reader`], applying every program in `programs`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidOptions`] if `options` are out of range.
    pub fn from_reader_with_programs(
        reader: R,
        programs: &'p [PathProgram],
        options: EvalOptions,
    ) -> Result<Self, EvalError> {
        options.validate()?;
        let source = crate::ReaderSource::with_chunk_size(reader, options.read_chunk_size);
        Self::with_programs(source, programs, options)
    }
}
