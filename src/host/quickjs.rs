//! QuickJS host: exposes the phpx grammars to JavaScript plugin contexts.
//!
//! Each grammar is published as `{ name, language }` where `language` is a
//! `Language` class instance wrapping a tagged [`External`]. Values coming
//! back from JS are only accepted as grammars after the class and the tag
//! check both pass.

use rquickjs::{Class, Ctx, Object, Value};

use super::{language_from_external, ExportTarget, External, HostError};
use crate::language::LanguageHandle;
use crate::registry::GrammarRegistry;
use crate::type_tag::TypeTag;

/// JavaScript-side grammar handle. Opaque to scripts.
#[derive(rquickjs::class::Trace, rquickjs::JsLifetime)]
#[rquickjs::class(rename = "Language")]
pub struct JsLanguage {
    #[qjs(skip_trace)]
    external: External,
}

impl JsLanguage {
    pub fn external(&self) -> &External {
        &self.external
    }
}

impl From<rquickjs::Error> for HostError {
    fn from(err: rquickjs::Error) -> Self {
        HostError::Runtime(err.to_string())
    }
}

/// An exports object inside a QuickJS context.
pub struct QuickJsExports<'js> {
    ctx: Ctx<'js>,
    object: Object<'js>,
}

impl<'js> QuickJsExports<'js> {
    /// A new, empty exports object.
    pub fn new(ctx: Ctx<'js>) -> Result<Self, HostError> {
        let object = Object::new(ctx.clone())?;
        Ok(Self { ctx, object })
    }

    /// Wrap an existing object, e.g. a module's `exports`.
    pub fn from_object(ctx: Ctx<'js>, object: Object<'js>) -> Self {
        Self { ctx, object }
    }

    pub fn object(&self) -> &Object<'js> {
        &self.object
    }

    pub fn into_object(self) -> Object<'js> {
        self.object
    }
}

impl<'js> ExportTarget for QuickJsExports<'js> {
    type Error = HostError;

    fn export_language(
        &mut self,
        name: &str,
        language: LanguageHandle,
        tag: &TypeTag,
    ) -> Result<(), HostError> {
        let mut external = External::new(language);
        external.type_tag(tag)?;

        let entry = Object::new(self.ctx.clone())?;
        entry.set("name", name)?;
        entry.set(
            "language",
            Class::<JsLanguage>::instance(self.ctx.clone(), JsLanguage { external })?,
        )?;
        self.object.set(name, entry)?;
        Ok(())
    }
}

/// Publish the registry's grammars as `globalThis[global_name]`.
pub fn install<'js>(
    ctx: &Ctx<'js>,
    registry: &GrammarRegistry,
    global_name: &str,
) -> Result<Object<'js>, HostError> {
    let mut exports = QuickJsExports::new(ctx.clone())?;
    registry.initialize(&mut exports)?;
    ctx.globals().set(global_name, exports.object().clone())?;
    tracing::debug!("Installed phpx grammars as globalThis.{}", global_name);
    Ok(exports.into_object())
}

/// Checked downcast of a JS value to a grammar handle.
pub fn language_from_value<'js>(value: &Value<'js>) -> Result<LanguageHandle, HostError> {
    if !value.is_object() {
        return Err(HostError::UnexpectedType {
            expected: "external",
            found: value.type_name(),
        });
    }
    let class: Class<'js, JsLanguage> = value.get().map_err(|_| HostError::UnexpectedType {
        expected: "external",
        found: "object",
    })?;
    let language = class.borrow();
    language_from_external(language.external())
}
