//! Equality predicates used by `?( ... )` filter selectors.
//!
//! A predicate either compares two literals, and is therefore decided when
//! the path is compiled, or compares a direct child of the candidate object
//! with a literal. The latter is decided while the candidate is being
//! scanned: the first child that the field selects settles it.
//!
//! Comparison works on raw text. String values have their quotes stripped,
//! escape sequences are compared as written, and numbers or literals are
//! compared by their exact spelling.

use core::fmt;

use bstr::{BString, ByteSlice};

use crate::JsonKind;

/// The child a field operand refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// `@.name`
    Named(BString),
    /// `@.*`: any direct child.
    Any,
}

/// A compiled `?( ... )` predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// `"left" == "right"`, with both sides as raw bytes between the quotes.
    Literals { left: BString, right: BString },
    /// `@.field == "literal"`, in either operand order.
    Field { field: Field, literal: BString },
}

impl Predicate {
    /// The outcome of a predicate that does not look at the document.
    #[must_use]
    pub fn constant(&self) -> Option<bool> {
        match self {
            Predicate::Literals { left, right } => Some(left == right),
            Predicate::Field { .. } => None,
        }
    }

    /// Offers one direct child of the candidate object to the predicate.
    ///
    /// `key` is the quoted member name as it appears in the document and
    /// `scalar` is the raw text of the child, or `None` when the child is an
    /// object or array. Returns `None` while the predicate stays undecided.
    pub(crate) fn offer_child(&self, key: &[u8], scalar: Option<(JsonKind, &[u8])>) -> Option<bool> {
        let Predicate::Field { field, literal } = self else {
            return None;
        };
        let equal = scalar.is_some_and(|(kind, raw)| {
            let text = if kind == JsonKind::String { unquote(raw) } else { raw };
            text == literal.as_bytes()
        });
        match field {
            Field::Named(name) if unquote(key) == name.as_bytes() => Some(equal),
            Field::Named(_) => None,
            Field::Any => equal.then_some(true),
        }
    }
}

/// Strips one pair of surrounding double quotes, if present.
pub(crate) fn unquote(raw: &[u8]) -> &[u8] {
    match raw {
        [b'"', inner @ .., b'"'] => inner,
        _ => raw,
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Named(name) => write!(f, "@.{}", name.as_bstr()),
            Field::Any => f.write_str("@.*"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Literals { left, right } => {
                write!(f, "\"{}\" == \"{}\"", left.as_bstr(), right.as_bstr())
            }
            Predicate::Field { field, literal } => {
                write!(f, "{field} == \"{}\"", literal.as_bstr())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use rstest::rstest;

    use super::*;

    fn named(name: &str, literal: &str) -> Predicate {
        Predicate::Field {
            field: Field::Named(name.into()),
            literal: literal.into(),
        }
    }

    #[rstest]
    #[case("bravo", "bravo", Some(true))]
    #[case("bravo", "alpha", Some(false))]
    #[case("", "", Some(true))]
    fn literals_are_decided_up_front(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Option<bool>,
    ) {
        let p = Predicate::Literals {
            left: left.into(),
            right: right.into(),
        };
        assert_eq!(p.constant(), expected);
    }

    #[test]
    fn field_predicates_wait_for_the_document() {
        assert_eq!(named("name", "bravo").constant(), None);
    }

    #[rstest]
    #[case(br#""name""#, Some((JsonKind::String, &br#""bravo""#[..])), Some(true))]
    #[case(br#""name""#, Some((JsonKind::String, &br#""alpha""#[..])), Some(false))]
    #[case(br#""name""#, None, Some(false))]
    #[case(br#""other""#, Some((JsonKind::String, &br#""bravo""#[..])), None)]
    fn named_field(
        #[case] key: &[u8],
        #[case] scalar: Option<(JsonKind, &[u8])>,
        #[case] expected: Option<bool>,
    ) {
        assert_eq!(named("name", "bravo").offer_child(key, scalar), expected);
    }

    #[test]
    fn numbers_compare_by_spelling() {
        let p = named("n", "22");
        assert_eq!(
            p.offer_child(br#""n""#, Some((JsonKind::Number, b"22"))),
            Some(true)
        );
        assert_eq!(
            p.offer_child(br#""n""#, Some((JsonKind::Number, b"22.0"))),
            Some(false)
        );
    }

    #[test]
    fn escapes_are_not_decoded() {
        let p = named("s", r#"a\"b"#);
        assert_eq!(
            p.offer_child(br#""s""#, Some((JsonKind::String, &br#""a\"b""#[..]))),
            Some(true)
        );
    }

    #[test]
    fn any_field_keeps_looking() {
        let p = Predicate::Field {
            field: Field::Any,
            literal: "x".into(),
        };
        assert_eq!(p.offer_child(br#""a""#, None), None);
        assert_eq!(
            p.offer_child(br#""b""#, Some((JsonKind::String, &br#""y""#[..]))),
            None
        );
        assert_eq!(
            p.offer_child(br#""c""#, Some((JsonKind::String, &br#""x""#[..]))),
            Some(true)
        );
    }

    #[test]
    fn display() {
        assert_eq!(named("name", "bravo").to_string(), r#"@.name == "bravo""#);
        let p = Predicate::Literals {
            left: "a".into(),
            right: "b".into(),
        };
        assert_eq!(p.to_string(), r#""a" == "b""#);
    }

    #[test]
    fn unquote_only_strips_a_full_pair() {
        assert_eq!(unquote(br#""abc""#), b"abc");
        assert_eq!(unquote(b"abc"), b"abc");
        assert_eq!(unquote(br#"""#), br#"""#);
    }
}
