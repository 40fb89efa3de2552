//! Single-pass extraction of values from JSON documents using JSONPath-style
//! expressions.
//!
//! A path such as `$.items[*]?(@.name == "bravo").value+` is compiled once
//! into a [`PathProgram`] and can then be evaluated against any number of
//! documents, either complete buffers ([`eval_bytes`]) or byte streams
//! ([`eval_reader`]). Selectors suffixed with `+` are *markers*: every value
//! they reach is returned as a [`Match`] carrying its raw text, its JSON type
//! and the keys leading to it. The document is scanned once, never parsed
//! into a tree, and values are returned in document order as soon as they
//! are complete.
//!
//! ```rust
//! use jsonpluck::{JsonKind, compile, eval_bytes, keys};
//!
//! let program = compile(r#"$.items[*]?(@.name == "bravo").value+"#).unwrap();
//! let doc = br#"{"items":[{"name":"alpha","value":11},{"name":"bravo","value":22}]}"#;
//! let matches = eval_bytes(doc, &program).unwrap().into_matches().unwrap();
//!
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].value, "22");
//! assert_eq!(matches[0].kind, JsonKind::Number);
//! assert_eq!(matches[0].keys, keys!["items", 1, "value"]);
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod compiler;
mod error;
mod eval;
mod filter;
mod kind;
mod literal_buffer;
mod options;
mod path_component;
mod scanner;
mod source;

#[doc(hidden)]
pub mod chunk_utils;

#[cfg(test)]
mod tests;

pub use compiler::{PathProgram, Selector, SelectorKind, compile, compile_paths};
pub use error::{CompileError, CompileErrorKind, EvalError, SyntaxError, SyntaxErrorKind};
#[cfg(feature = "std")]
pub use eval::{eval_paths_reader, eval_reader};
pub use eval::{Eval, Match, eval_bytes, eval_paths_bytes};
pub use filter::{Field, Predicate};
pub use kind::JsonKind;
pub use options::EvalOptions;
pub use path_component::{Index, Key, PathComponent, PathComponentFrom};
#[cfg(feature = "std")]
pub use source::ReaderSource;
pub use source::{ByteSource, SliceSource, SourceError};

#[doc(hidden)]
pub use alloc::vec;

/// Macro to build a `Vec<PathComponent>` from a heterogeneous list of keys and
/// indices.
///
/// ```rust
/// # use jsonpluck::{keys, PathComponent};
/// let k = keys!["aKey", 3, "michael"];
/// assert_eq!(
///     k,
///     vec![
///         PathComponent::Key("aKey".into()),
///         PathComponent::Index(3),
///         PathComponent::Key("michael".into())
///     ]
/// );
/// ```
#[macro_export]
macro_rules! keys {
    ( $( $elem:expr ),* $(,)? ) => {{
        use $crate::PathComponentFrom;
        $crate::vec![$($crate::PathComponent::from_path_component($elem)),*]
    }};
}
