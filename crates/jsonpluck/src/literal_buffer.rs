use crate::JsonKind;

/// What happened after feeding one more byte into the literal matcher?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Byte matched, but the literal is not finished yet.
    NeedMore,
    /// Byte matched *and* it was the last byte of the literal.
    Done(JsonKind),
    /// Byte did **not** match the expected byte.
    Reject,
}

/// `None`  ➜  we are **not** in the middle of a literal
/// `Some`  ➜  `(remaining_bytes, kind)` while matching
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct ExpectedLiteralBuffer(Option<(&'static [u8], JsonKind)>);

impl ExpectedLiteralBuffer {
    /// No literal is in flight
    pub(crate) fn none() -> Self {
        ExpectedLiteralBuffer(None)
    }

    /// Start matching after the *first* byte (`n`, `t`, or `f`)
    pub(crate) fn new(first: u8) -> Self {
        match first {
            b'n' => ExpectedLiteralBuffer(Some((b"ull", JsonKind::Null))),
            b't' => ExpectedLiteralBuffer(Some((b"rue", JsonKind::Boolean))),
            b'f' => ExpectedLiteralBuffer(Some((b"alse", JsonKind::Boolean))),
            _ => ExpectedLiteralBuffer::none(),
        }
    }

    pub(crate) fn step(&mut self, b: u8) -> Step {
        let Some((bytes, kind)) = self.0.take() else {
            return Step::Reject;
        };

        match bytes.split_first() {
            Some((expected, rest)) if *expected == b => {
                if rest.is_empty() {
                    Step::Done(kind)
                } else {
                    self.0 = Some((rest, kind));
                    Step::NeedMore
                }
            }
            _ => {
                // Mismatch – restore the state we took at the top
                self.0 = Some((bytes, kind));
                Step::Reject
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_true() {
        let mut lit = ExpectedLiteralBuffer::new(b't');
        assert_eq!(lit.step(b'r'), Step::NeedMore);
        assert_eq!(lit.step(b'u'), Step::NeedMore);
        assert_eq!(lit.step(b'e'), Step::Done(JsonKind::Boolean));
        assert_eq!(lit.step(b'e'), Step::Reject);
    }

    #[test]
    fn rejects_wrong_byte_and_keeps_state() {
        let mut lit = ExpectedLiteralBuffer::new(b'n');
        assert_eq!(lit.step(b'x'), Step::Reject);
        assert_eq!(lit.step(b'u'), Step::NeedMore);
    }
}
