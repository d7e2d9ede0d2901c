//! User-defined type descriptors

use crate::ast::TypeDecl;
use crate::interp::value::TYPE_KEY;
use crate::interp::{Value, ValueMap};
use std::collections::HashMap;

/// Field of a registered type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    /// Declared type name, picks the default value
    pub type_name: Option<String>,
}

/// Registered type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<String>,
}

impl TypeInfo {
    pub fn new(name: &str) -> Self {
        TypeInfo {
            name: name.to_uppercase(),
            parent: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_uppercase());
        self
    }

    pub fn with_field(mut self, name: &str, type_name: Option<&str>) -> Self {
        self.fields.push(FieldInfo {
            name: name.to_uppercase(),
            type_name: type_name.map(str::to_uppercase),
        });
        self
    }

    pub fn with_method(mut self, name: &str) -> Self {
        self.methods.push(name.to_uppercase());
        self
    }

    /// Descriptor for a program `TYPE ... END TYPE` block
    pub fn from_decl(decl: &TypeDecl) -> Self {
        TypeInfo {
            name: decl.name.to_string(),
            parent: decl.parent.as_ref().map(ToString::to_string),
            fields: decl
                .fields
                .iter()
                .map(|f| FieldInfo {
                    name: f.name.to_string(),
                    type_name: f.type_name.as_ref().map(ToString::to_string),
                })
                .collect(),
            methods: decl.methods.iter().map(|m| m.name().to_string()).collect(),
        }
    }
}

/// Zero value for a declared field type
pub fn default_for_type(type_name: Option<&str>) -> Value {
    match type_name.map(str::to_uppercase).as_deref() {
        Some("INTEGER" | "INT" | "LONG") => Value::Int(0),
        Some("DOUBLE" | "SINGLE" | "FLOAT" | "NUMBER") => Value::Float(0.0),
        Some("STRING") => Value::Str(String::new()),
        Some("BOOLEAN" | "BOOL") => Value::Bool(false),
        _ => Value::Nil,
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeInfo>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any previous one with the same name
    pub fn register_type(&mut self, info: TypeInfo) {
        tracing::debug!(name = %info.name, parent = ?info.parent, "registering type");
        self.types.insert(info.name.clone(), info);
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(&name.to_uppercase())
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.get_type(name).is_some()
    }

    /// New instance with `_type` set and every field (inherited ones
    /// included) at its default value
    pub fn create_instance(&self, name: &str) -> Option<Value> {
        let info = self.get_type(name)?;
        let mut map = ValueMap::new();
        self.fill_fields(info, &mut map, 0);
        map.insert(TYPE_KEY.to_string(), Value::Str(info.name.clone()));
        Some(Value::Map(map))
    }

    fn fill_fields(&self, info: &TypeInfo, map: &mut ValueMap, depth: usize) {
        // Cyclic parent chains stop here
        if depth > self.types.len() {
            return;
        }
        if let Some(parent) = info.parent.as_deref().and_then(|p| self.get_type(p)) {
            self.fill_fields(parent, map, depth + 1);
        }
        for field in &info.fields {
            map.insert(field.name.clone(), default_for_type(field.type_name.as_deref()));
        }
    }

    /// True if `child` is `parent` or inherits from it
    pub fn is_subtype(&self, child: &str, parent: &str) -> bool {
        let target = parent.to_uppercase();
        let mut current = Some(child.to_uppercase());
        let mut steps = 0;
        while let Some(name) = current {
            if name == target {
                return true;
            }
            steps += 1;
            if steps > self.types.len() {
                return false;
            }
            current = self.types.get(&name).and_then(|info| info.parent.clone());
        }
        false
    }

    /// Parent type name of `name`
    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.get_type(name).and_then(|info| info.parent.as_deref())
    }

    /// Method names of `name`, inherited ones after its own
    pub fn methods_of(&self, name: &str) -> Vec<String> {
        let mut methods = Vec::new();
        let mut current = self.get_type(name);
        let mut steps = 0;
        while let Some(info) = current {
            for method in &info.methods {
                if !methods.contains(method) {
                    methods.push(method.clone());
                }
            }
            steps += 1;
            if steps > self.types.len() {
                break;
            }
            current = info.parent.as_deref().and_then(|p| self.get_type(p));
        }
        methods
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
