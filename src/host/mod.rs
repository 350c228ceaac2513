//! Host-side values for exported grammars.
//!
//! A host runtime receives each grammar as an object `{ name, language }`
//! where `language` is an opaque external value stamped with
//! [`LANGUAGE_TYPE_TAG`]. Hosts implement [`ExportTarget`] to build those
//! objects in their own value representation. [`HostObject`] is the
//! in-process representation, used by the CLI and by embedders that do not
//! run a script engine.

#[cfg(feature = "plugins")]
pub mod quickjs;

use std::collections::BTreeMap;
use std::fmt;
use std::ptr::NonNull;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::language::LanguageHandle;
use crate::type_tag::{TypeTag, LANGUAGE_TYPE_TAG};

/// A host export container that can receive grammar entries.
pub trait ExportTarget {
    type Error;

    /// Publish `{ name, language }` under `name`, with `language` stamped
    /// with `tag`.
    fn export_language(
        &mut self,
        name: &str,
        language: LanguageHandle,
        tag: &TypeTag,
    ) -> Result<(), Self::Error>;
}

/// Errors raised by host values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The external already carries a tag; tags are stamped once.
    AlreadyTagged,
    /// The value's tag differs from the expected one.
    TagMismatch {
        expected: TypeTag,
        found: Option<TypeTag>,
    },
    /// The value has a different kind than required.
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    /// A required field is absent.
    MissingField(String),
    /// The script engine reported an error.
    Runtime(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::AlreadyTagged => write!(f, "value is already type-tagged"),
            HostError::TagMismatch {
                expected,
                found: Some(found),
            } => write!(f, "type tag mismatch: expected {expected}, found {found}"),
            HostError::TagMismatch {
                expected,
                found: None,
            } => write!(f, "type tag mismatch: expected {expected}, value is untagged"),
            HostError::UnexpectedType { expected, found } => {
                write!(f, "expected {expected} value, got {found}")
            }
            HostError::MissingField(field) => write!(f, "missing field '{field}'"),
            HostError::Runtime(msg) => write!(f, "host runtime error: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Opaque host value wrapping a native pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct External {
    ptr: NonNull<()>,
    tag: Option<TypeTag>,
}

impl External {
    /// An untagged external for a grammar handle.
    pub fn new(handle: LanguageHandle) -> Self {
        Self {
            ptr: handle.as_non_null(),
            tag: None,
        }
    }

    /// Stamp the external with `tag`. An external is tagged at most once.
    pub fn type_tag(&mut self, tag: &TypeTag) -> Result<(), HostError> {
        if self.tag.is_some() {
            return Err(HostError::AlreadyTagged);
        }
        self.tag = Some(*tag);
        Ok(())
    }

    /// Whether the external carries exactly `tag`.
    pub fn check_type_tag(&self, tag: &TypeTag) -> bool {
        self.tag.as_ref() == Some(tag)
    }

    pub fn tag(&self) -> Option<TypeTag> {
        self.tag
    }

    pub fn as_ptr(&self) -> *const () {
        self.ptr.as_ptr()
    }
}

impl Serialize for External {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("External", 3)?;
        state.serialize_field("type", "external")?;
        state.serialize_field("address", &format!("{:p}", self.ptr))?;
        state.serialize_field("tag", &self.tag)?;
        state.end()
    }
}

/// Checked downcast of an external to a grammar handle.
///
/// Only an external stamped with [`LANGUAGE_TYPE_TAG`] is accepted.
pub fn language_from_external(external: &External) -> Result<LanguageHandle, HostError> {
    if !external.check_type_tag(&LANGUAGE_TYPE_TAG) {
        return Err(HostError::TagMismatch {
            expected: LANGUAGE_TYPE_TAG,
            found: external.tag(),
        });
    }
    Ok(LanguageHandle::from_non_null(external.ptr))
}

/// A value in the in-process host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HostValue {
    String(String),
    External(External),
    Object(HostObject),
}

impl HostValue {
    fn kind(&self) -> &'static str {
        match self {
            HostValue::String(_) => "string",
            HostValue::External(_) => "external",
            HostValue::Object(_) => "object",
        }
    }
}

/// An object with named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HostObject {
    fields: BTreeMap<String, HostValue>,
}

impl HostObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: HostValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&HostValue> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get_str(&self, key: &str) -> Result<&str, HostError> {
        match self.get(key) {
            Some(HostValue::String(s)) => Ok(s.as_str()),
            Some(other) => Err(HostError::UnexpectedType {
                expected: "string",
                found: other.kind(),
            }),
            None => Err(HostError::MissingField(key.to_string())),
        }
    }

    pub fn get_object(&self, key: &str) -> Result<&HostObject, HostError> {
        match self.get(key) {
            Some(HostValue::Object(obj)) => Ok(obj),
            Some(other) => Err(HostError::UnexpectedType {
                expected: "object",
                found: other.kind(),
            }),
            None => Err(HostError::MissingField(key.to_string())),
        }
    }

    pub fn get_external(&self, key: &str) -> Result<&External, HostError> {
        match self.get(key) {
            Some(HostValue::External(external)) => Ok(external),
            Some(other) => Err(HostError::UnexpectedType {
                expected: "external",
                found: other.kind(),
            }),
            None => Err(HostError::MissingField(key.to_string())),
        }
    }

    /// Look up an exported grammar entry and downcast its `language`.
    pub fn language(&self, key: &str) -> Result<LanguageHandle, HostError> {
        language_from_external(self.get_object(key)?.get_external("language")?)
    }
}

impl ExportTarget for HostObject {
    type Error = HostError;

    fn export_language(
        &mut self,
        name: &str,
        language: LanguageHandle,
        tag: &TypeTag,
    ) -> Result<(), HostError> {
        let mut external = External::new(language);
        external.type_tag(tag)?;

        let mut entry = HostObject::new();
        entry.set("name", HostValue::String(name.to_string()));
        entry.set("language", HostValue::External(external));

        self.set(name, HostValue::Object(entry));
        Ok(())
    }
}
