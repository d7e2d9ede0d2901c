//! Namespace registry: `Namespace.method` → native function name

use crate::interp::value::{NAMESPACE_TYPE, NAME_KEY, TYPE_KEY};
use crate::interp::{Value, ValueMap};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    /// namespace → (method → function)
    namespaces: HashMap<String, BTreeMap<String, String>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or extend) a namespace with `(method, function)` pairs
    pub fn register_namespace<'a>(
        &mut self,
        name: &str,
        methods: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let entry = self.namespaces.entry(name.to_uppercase()).or_default();
        for (method, function) in methods {
            entry.insert(method.to_uppercase(), function.to_uppercase());
        }
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.contains_key(&name.to_uppercase())
    }

    /// Function name backing `namespace.method`
    pub fn resolve_method(&self, namespace: &str, method: &str) -> Option<&str> {
        self.namespaces
            .get(&namespace.to_uppercase())
            .and_then(|methods| methods.get(&method.to_uppercase()))
            .map(String::as_str)
    }

    /// Map value standing for the namespace itself, with one method object
    /// per registered method
    pub fn create_namespace_object(&self, name: &str) -> Option<Value> {
        let key = name.to_uppercase();
        let methods = self.namespaces.get(&key)?;
        let mut map = ValueMap::new();
        map.insert(TYPE_KEY.to_string(), Value::from(NAMESPACE_TYPE));
        map.insert(NAME_KEY.to_string(), Value::Str(key.clone()));
        for (method, function) in methods {
            map.insert(method.clone(), Value::namespace_method(&key, method, function));
        }
        Some(Value::Map(map))
    }

    /// Registered namespace names, sorted
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.namespaces.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
