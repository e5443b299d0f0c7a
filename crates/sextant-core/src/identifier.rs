//! Identifier management using string interning for efficient string storage and comparison
//!
//! This module provides the [`Id`] type with an efficient string-interner based approach,
//! and the typed [`EnvironmentId`] and [`DiagramId`] wrappers the model uses for
//! cross-references.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        // The interner is append-only, so a poisoned lock still holds consistent data.
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Efficient identifier type using string interning
///
/// This type provides efficient storage and comparison of string identifiers through
/// string interning. It serializes as a plain string.
///
/// # Examples
///
/// ```
/// use sextant_core::identifier::Id;
///
/// let billing = Id::new("billing");
/// assert_eq!(billing, "billing");
/// assert_eq!(billing, Id::new("billing"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Arguments
    ///
    /// * `name` - The string representation of the identifier
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Creates an `Id` of the form `<prefix>-<n>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sextant_core::identifier::Id;
    ///
    /// assert_eq!(Id::numbered("env", 3), "env-3");
    /// ```
    pub fn numbered(prefix: &str, n: usize) -> Self {
        Self::new(&format!("{prefix}-{n}"))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let str_value = interner.resolve(self.0).unwrap_or_default();
        write!(f, "{str_value}")
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    /// Creates an `Id` from a string slice
    ///
    /// This is a convenience implementation that calls `Id::new`.
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Id);

        impl $name {
            /// Prefix used for freshly generated identifiers of this kind.
            pub const PREFIX: &'static str = $prefix;

            /// Wraps an existing identifier.
            pub fn new(id: impl Into<Id>) -> Self {
                Self(id.into())
            }

            /// Returns the `n`-th generated identifier of this kind.
            pub fn numbered(n: usize) -> Self {
                Self(Id::numbered(Self::PREFIX, n))
            }

            /// Returns `n` if this identifier reads `<PREFIX>-<n>`.
            pub fn number(self) -> Option<usize> {
                self.0
                    .to_string()
                    .strip_prefix(Self::PREFIX)?
                    .strip_prefix('-')?
                    .parse()
                    .ok()
            }

            /// Returns the next generated identifier after `*last` for which
            /// `is_taken` is false, and records its number in `last`.
            ///
            /// Numbers only ever grow, so an identifier is never handed out twice.
            pub fn fresh(last: &mut usize, is_taken: impl Fn(Self) -> bool) -> Self {
                loop {
                    *last += 1;
                    let candidate = Self::numbered(*last);
                    if !is_taken(candidate) {
                        return candidate;
                    }
                }
            }

            /// Returns the underlying interned identifier.
            pub fn id(self) -> Id {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(Id::new(name))
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

typed_id!(
    /// Stable identifier of an [`Environment`](crate::model::Environment).
    EnvironmentId,
    "env"
);

typed_id!(
    /// Stable identifier of a [`SequenceDiagram`](crate::model::SequenceDiagram).
    DiagramId,
    "diagram"
);
