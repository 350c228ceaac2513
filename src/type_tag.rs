//! 128-bit type tags for opaque host values.
//!
//! A tag is stamped on an external value when it is handed to a host runtime,
//! so a later consumer can check that an opaque value really is what it
//! claims to be before dereferencing it. The layout matches N-API's
//! `napi_type_tag`: two 64-bit halves, `lower` first.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// A fixed 128-bit identity constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct TypeTag {
    pub lower: u64,
    pub upper: u64,
}

/// Tag carried by every grammar handle.
///
/// "tree-sitter", "language" hashed with BLAKE2. Consumers of tree-sitter
/// language handles compare against this exact value.
pub const LANGUAGE_TYPE_TAG: TypeTag = TypeTag::new(0x8AF2E5212AD58ABF, 0xD5006CAD83ABBA16);

impl TypeTag {
    pub const fn new(lower: u64, upper: u64) -> Self {
        Self { lower, upper }
    }

    pub const fn as_u128(&self) -> u128 {
        ((self.upper as u128) << 64) | self.lower as u128
    }

    pub const fn from_u128(value: u128) -> Self {
        Self {
            lower: value as u64,
            upper: (value >> 64) as u64,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.as_u128())
    }
}

/// Error returned when a string is not a 128-bit hex tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTagError(String);

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid type tag '{}': expected 32 hex digits", self.0)
    }
}

impl std::error::Error for ParseTagError {}

impl FromStr for TypeTag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 32 {
            return Err(ParseTagError(s.to_string()));
        }
        u128::from_str_radix(digits, 16)
            .map(Self::from_u128)
            .map_err(|_| ParseTagError(s.to_string()))
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
