//! Registry core implementation
//!
//! Type tag -> (constructor, validator?) lookup.

use std::collections::HashMap;

use contracts::{AdapterConfig, ContractError};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{RegistryError, Result};

/// Builds an instance from its configured name and raw payload
pub type Constructor<T> = Box<dyn Fn(&str, &Value) -> std::result::Result<T, ContractError> + Send + Sync>;

/// Checks a raw payload before anything is constructed
pub type Validator = Box<dyn Fn(&Value) -> std::result::Result<(), ContractError> + Send + Sync>;

struct RegistryEntry<T> {
    constructor: Constructor<T>,
    validator: Option<Validator>,
}

/// Capability registry
///
/// Maps a type tag chosen by the operator to the code that builds it.
///
/// # Precondition
/// All `register` calls happen during start-up, before the registry is
/// shared (typically behind an `Arc`). After that it is only read, so no
/// locking is involved.
pub struct Registry<T> {
    kind: &'static str,
    entries: HashMap<String, RegistryEntry<T>>,
}

impl<T> Registry<T> {
    /// Create an empty registry; `kind` ("sink", "source") labels errors
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Register a type tag
    ///
    /// Registering an existing tag replaces the previous entry (last writer
    /// wins). Registration is driven by static adapter code at start-up, not
    /// by user input.
    pub fn register<C>(&mut self, type_name: impl Into<String>, constructor: C, validator: Option<Validator>)
    where
        C: Fn(&str, &Value) -> std::result::Result<T, ContractError> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        let entry = RegistryEntry {
            constructor: Box::new(constructor),
            validator,
        };
        if self.entries.insert(type_name.clone(), entry).is_some() {
            debug!(kind = self.kind, type_name = %type_name, "Registry entry replaced");
        }
    }

    /// Whether `type_name` has been registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Registered type tags, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate a payload for `type_name`
    ///
    /// # Errors
    /// - `UnknownType` if the tag is not registered
    /// - `InvalidConfig` if the registered validator rejects the payload
    ///
    /// Entries without a validator accept any payload.
    pub fn validate(&self, type_name: &str, config: &Value) -> Result<()> {
        let entry = self.entry(type_name)?;
        match &entry.validator {
            Some(validator) => validator(config).map_err(|source| RegistryError::InvalidConfig {
                kind: self.kind,
                type_name: type_name.to_string(),
                source,
            }),
            None => Ok(()),
        }
    }

    /// Build an instance named `name` of type `type_name`
    ///
    /// # Errors
    /// - `UnknownType` if the tag is not registered (a start-up failure)
    /// - `Construction` if the constructor fails
    #[instrument(name = "registry_create", skip(self, config), fields(kind = self.kind))]
    pub fn create(&self, type_name: &str, name: &str, config: &Value) -> Result<T> {
        let entry = self.entry(type_name)?;
        (entry.constructor)(name, config).map_err(|source| RegistryError::Construction {
            kind: self.kind,
            name: name.to_string(),
            type_name: type_name.to_string(),
            source,
        })
    }

    /// Validate every entry, in order, stopping at the first failure
    pub fn validate_all(&self, configs: &[AdapterConfig]) -> Result<()> {
        for config in configs {
            self.validate(&config.adapter_type, &config.config)?;
        }
        Ok(())
    }

    /// Validate then build every entry, preserving order
    ///
    /// Nothing is constructed unless every payload validates.
    pub fn create_all(&self, configs: &[AdapterConfig]) -> Result<Vec<(String, T)>> {
        self.validate_all(configs)?;
        configs
            .iter()
            .map(|c| {
                self.create(&c.adapter_type, &c.name, &c.config)
                    .map(|instance| (c.name.clone(), instance))
            })
            .collect()
    }

    fn entry(&self, type_name: &str) -> Result<&RegistryEntry<T>> {
        self.entries
            .get(type_name)
            .ok_or_else(|| RegistryError::unknown_type(self.kind, type_name))
    }
}

impl<T> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reject_all() -> Validator {
        Box::new(|_| Err(ContractError::config_validation("config", "always rejected")))
    }

    #[test]
    fn test_create_registered() {
        let mut registry: Registry<String> = Registry::new("sink");
        registry.register("echo", |name, _| Ok(format!("echo:{name}")), None);

        let instance = registry.create("echo", "first", &Value::Null).unwrap();
        assert_eq!(instance, "echo:first");
        assert!(registry.contains("echo"));
    }

    #[test]
    fn test_create_unknown_type() {
        let registry: Registry<String> = Registry::new("sink");
        let err = registry.create("nope", "x", &Value::Null).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownType { kind: "sink", .. }));
        assert_eq!(err.type_name(), "nope");
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_reregistration_replaces_previous() {
        let mut registry: Registry<&'static str> = Registry::new("sink");
        registry.register("dup", |_, _| Ok("first"), None);
        registry.register("dup", |_, _| Ok("second"), None);

        assert_eq!(registry.create("dup", "x", &Value::Null).unwrap(), "second");
        assert_eq!(registry.type_names(), vec!["dup"]);
    }

    #[test]
    fn test_validate_without_validator_succeeds() {
        let mut registry: Registry<()> = Registry::new("source");
        registry.register("plain", |_, _| Ok(()), None);
        assert!(registry.validate("plain", &json!({"anything": 1})).is_ok());
    }

    #[test]
    fn test_validate_propagates_rejection() {
        let mut registry: Registry<()> = Registry::new("source");
        registry.register("strict", |_, _| Ok(()), Some(reject_all()));

        let err = registry.validate("strict", &Value::Null).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidConfig { .. }));
    }

    #[test]
    fn test_validate_unknown_type() {
        let registry: Registry<()> = Registry::new("source");
        assert!(matches!(
            registry.validate("ghost", &Value::Null),
            Err(RegistryError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_create_all_builds_nothing_when_validation_fails() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let mut registry: Registry<()> = Registry::new("sink");
        registry.register(
            "counted",
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            None,
        );
        registry.register("strict", |_, _| Ok(()), Some(reject_all()));

        let configs = vec![
            AdapterConfig::new("a", "counted"),
            AdapterConfig::new("b", "strict"),
        ];
        assert!(registry.create_all(&configs).is_err());
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_create_all_preserves_order() {
        let mut registry: Registry<String> = Registry::new("sink");
        registry.register("echo", |name, _| Ok(name.to_uppercase()), None);

        let configs = vec![
            AdapterConfig::new("zeta", "echo"),
            AdapterConfig::new("alpha", "echo"),
        ];
        let built = registry.create_all(&configs).unwrap();
        assert_eq!(
            built,
            vec![
                ("zeta".to_string(), "ZETA".to_string()),
                ("alpha".to_string(), "ALPHA".to_string())
            ]
        );
    }

    #[test]
    fn test_construction_error_carries_name() {
        let mut registry: Registry<()> = Registry::new("sink");
        registry.register(
            "broken",
            |name, _| Err(ContractError::sink_connection(name, "refused")),
            None,
        );
        let err = registry.create("broken", "alerts", &Value::Null).unwrap_err();
        assert!(matches!(err, RegistryError::Construction { ref name, .. } if name == "alerts"));
    }
}
