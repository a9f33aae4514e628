//! Backend registry: detector selection keyed on a configuration tag.

use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::backend::DetectorBackend;

/// Registry of detector backends.
///
/// The pipeline selects a backend by the tag carried in configuration; the
/// first registered backend becomes the default when no tag is given.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn DetectorBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Box::new(backend));
    }

    /// List registered backend names.
    pub fn list(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Take ownership of the backend matching `tag`, or the default backend
    /// when `tag` is `None`. Consumes the registry entry: a pipeline owns its
    /// backend exclusively for the life of a run.
    pub fn take(&mut self, tag: Option<&str>) -> Result<Box<dyn DetectorBackend>> {
        let name = match tag {
            Some(name) => name.to_string(),
            None => self
                .default_name
                .clone()
                .ok_or_else(|| anyhow!("no detector backend registered"))?,
        };
        self.backends.remove(&name).ok_or_else(|| {
            anyhow!(
                "detector backend '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            )
        })
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::StubBackend;

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::empty());
        let backend = registry.take(None).expect("default backend");
        assert_eq!(backend.name(), "stub");
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::empty());
        assert!(registry.take(Some("hog")).is_err());
    }
}
