use std::collections::BTreeMap;

use cvpipe_image::DynImage;

use crate::error::{PipelineError, TransformError};
use crate::schema::{Params, TransformSpec};

/// The signature of a transform: input images and resolved parameters to a new image.
pub type TransformFn =
    dyn Fn(&[&DynImage], &Params) -> Result<DynImage, TransformError> + Send + Sync;

/// A registered transform and its declaration.
pub struct TransformEntry {
    func: Box<TransformFn>,
    spec: TransformSpec,
}

impl TransformEntry {
    /// The declaration of the transform.
    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    /// Invoke the transform.
    ///
    /// The caller is responsible for resolving the parameters against the [`TransformSpec`].
    pub fn call(&self, inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
        (self.func)(inputs, params)
    }
}

impl std::fmt::Debug for TransformEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformEntry")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// A name to transform mapping.
///
/// The registry is built once and then only read; the executor borrows it.
///
/// # Example
///
/// ```
/// use cvpipe_pipeline::{TransformRegistry, TransformSpec};
///
/// let mut registry = TransformRegistry::new();
/// registry
///     .register(
///         "identity",
///         |inputs, _| Ok(inputs[0].clone()),
///         TransformSpec::new("Return the input unchanged"),
///     )
///     .unwrap();
///
/// assert!(registry.resolve("identity").is_ok());
/// assert!(registry.resolve("sharpen").is_err());
/// ```
#[derive(Debug, Default)]
pub struct TransformRegistry {
    entries: BTreeMap<String, TransformEntry>,
}

impl TransformRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in transform.
    pub fn with_builtins() -> Result<Self, PipelineError> {
        let mut registry = Self::new();
        crate::builtins::register_all(&mut registry)?;
        log::debug!("registered {} built-in transforms", registry.len());
        Ok(registry)
    }

    /// Register a transform under a new name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateTransform`] if the name is taken.
    pub fn register<F>(&mut self, name: &str, func: F, spec: TransformSpec) -> Result<(), PipelineError>
    where
        F: Fn(&[&DynImage], &Params) -> Result<DynImage, TransformError> + Send + Sync + 'static,
    {
        if self.entries.contains_key(name) {
            return Err(PipelineError::DuplicateTransform(name.to_string()));
        }

        self.entries.insert(
            name.to_string(),
            TransformEntry {
                func: Box::new(func),
                spec,
            },
        );

        Ok(())
    }

    /// Look up a transform by name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownTransform`] if the name is not registered.
    pub fn resolve(&self, name: &str) -> Result<&TransformEntry, PipelineError> {
        self.entries
            .get(name)
            .ok_or_else(|| PipelineError::UnknownTransform {
                name: name.to_string(),
                step: None,
            })
    }

    /// The registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// The registered transforms sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TransformEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of registered transforms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no transform is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() -> Result<(), PipelineError> {
        let mut registry = TransformRegistry::new();
        assert!(registry.is_empty());

        registry.register(
            "identity",
            |inputs, _| Ok(inputs[0].clone()),
            TransformSpec::new("identity"),
        )?;

        let res = registry.register(
            "identity",
            |inputs, _| Ok(inputs[0].clone()),
            TransformSpec::new("identity again"),
        );
        assert!(matches!(res, Err(PipelineError::DuplicateTransform(name)) if name == "identity"));

        assert_eq!(registry.resolve("identity")?.spec().description, "identity");
        assert!(matches!(
            registry.resolve("blur"),
            Err(PipelineError::UnknownTransform { step: None, .. })
        ));

        Ok(())
    }

    #[test]
    fn builtins_are_declared_consistently() -> Result<(), PipelineError> {
        let registry = TransformRegistry::with_builtins()?;
        assert!(registry.len() >= 38);

        for (name, entry) in registry.iter() {
            let spec = entry.spec();
            assert!(spec.min_inputs >= 1, "{name}");
            assert!(spec.min_inputs <= spec.max_inputs, "{name}");
            for param in &spec.params {
                let raw = match &param.default {
                    crate::schema::ParamValue::Int(v) => serde_json::json!(v),
                    crate::schema::ParamValue::Float(v) => serde_json::json!(v),
                    crate::schema::ParamValue::Bool(v) => serde_json::json!(v),
                    crate::schema::ParamValue::Choice(v) => serde_json::json!(v),
                    crate::schema::ParamValue::Size(w, h) => serde_json::json!([w, h]),
                    crate::schema::ParamValue::Vector(v) => serde_json::json!(v),
                };
                assert_eq!(
                    param.coerce(&raw).as_ref(),
                    Ok(&param.default),
                    "default of {name}.{}",
                    param.name
                );
            }
        }

        Ok(())
    }
}
