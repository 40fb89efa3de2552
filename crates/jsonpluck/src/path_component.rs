use core::fmt;

use bstr::{BStr, BString, ByteSlice};

pub type Key = BString;
pub type Index = usize;

/// One step of a keys chain.
///
/// A match records the route from the document root to the matched value as a
/// sequence of object keys and array indices. Keys hold the raw bytes found
/// between the quotes in the document; escape sequences are not decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    Key(Key),
    Index(Index),
}

// Convenient conversions so users can write `keys![0, "foo"]` etc.
macro_rules! impl_from_int_for_pathcomponent {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PathComponent {
                fn from(i: $t) -> Self {
                    #[allow(clippy::cast_possible_truncation)]
                    PathComponent::Index(i as Index)
                }
            }
        )*
    };
}

impl_from_int_for_pathcomponent!(u8, u16, u32, u64, usize);

impl From<&str> for PathComponent {
    fn from(s: &str) -> Self {
        Self::Key(s.into())
    }
}

impl From<&[u8]> for PathComponent {
    fn from(s: &[u8]) -> Self {
        Self::Key(s.into())
    }
}

#[doc(hidden)]
pub trait PathComponentFrom<T> {
    fn from_path_component(value: T) -> PathComponent;
}

macro_rules! impl_integer_as_path_component {
    ($($t:ty),+) => {
        $(
            impl PathComponentFrom<$t> for PathComponent {
                fn from_path_component(value: $t) -> Self {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    PathComponent::Index(value as Index)
                }
            }
        )+
    };
}
impl_integer_as_path_component!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl PathComponentFrom<&str> for PathComponent {
    fn from_path_component(value: &str) -> Self {
        PathComponent::Key(value.into())
    }
}

impl PathComponentFrom<&[u8]> for PathComponent {
    fn from_path_component(value: &[u8]) -> Self {
        PathComponent::Key(value.into())
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Key(k) => write!(f, "{:?}", k.as_bstr()),
            PathComponent::Index(i) => write!(f, "{i}"),
        }
    }
}

// A keys chain serializes as e.g. `["foo", 0, "bar"]` instead of the default
// tagged representation.
#[cfg(feature = "serde")]
mod serde_impls {
    use bstr::ByteSlice;
    use serde::{Serialize, Serializer};

    use super::PathComponent;

    impl Serialize for PathComponent {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match self {
                PathComponent::Key(k) => serializer.serialize_str(&k.to_str_lossy()),
                PathComponent::Index(i) => serializer.serialize_u64(*i as u64),
            }
        }
    }
}

impl PathComponent {
    #[must_use]
    /// Returns the index if this component is an index, otherwise `None`.
    pub fn as_index(&self) -> Option<Index> {
        if let Self::Index(v) = self {
            Some(*v)
        } else {
            None
        }
    }

    #[must_use]
    /// Returns the key bytes if this component is a key, otherwise `None`.
    pub fn as_key(&self) -> Option<&BStr> {
        if let Self::Key(v) = self {
            Some(v.as_bstr())
        } else {
            None
        }
    }
}
