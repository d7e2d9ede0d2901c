//! Runtime values for the interpreter

use std::collections::BTreeMap;
use std::fmt;

/// Ordered string-keyed map backing objects
pub type ValueMap = BTreeMap<String, Value>;

/// Dispatch tag key carried by typed maps
pub const TYPE_KEY: &str = "_type";
/// Native handle correlation key
pub const ID_KEY: &str = "_id";
/// Bound receiver of a method object
pub const OBJECT_KEY: &str = "_object";
/// Method name of a method object
pub const METHOD_KEY: &str = "_method";
/// Callable name of a method object
pub const FUNCTION_KEY: &str = "_function";
/// Namespace a method object was resolved through
pub const NAMESPACE_KEY: &str = "_namespace";
/// Name of a namespace object
pub const NAME_KEY: &str = "_name";

/// `_type` of method objects
pub const METHOD_TYPE: &str = "Method";
/// `_type` of namespace objects
pub const NAMESPACE_TYPE: &str = "Namespace";
/// `_type` of lambda values
pub const LAMBDA_TYPE: &str = "Lambda";

/// Runtime value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    Str(String),
    /// Dense, 0-based, resizable
    Array(Vec<Value>),
    /// Keys are case-normalized before storage
    Map(ValueMap),
}

impl Value {
    /// Truthiness used by conditions and AND/OR/XOR/NOT
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Nil | Value::Array(_) | Value::Map(_) => false,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get type name for error messages and TYPEOF
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "NIL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "NUMBER",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Map(_) => "MAP",
        }
    }

    /// The `_type` tag of a map, if any
    pub fn type_tag(&self) -> Option<&str> {
        match self {
            Value::Map(map) => match map.get(TYPE_KEY) {
                Some(Value::Str(tag)) => Some(tag.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Try to convert to i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to convert to f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Try to convert to bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Text used for string concatenation; NIL renders as empty
    pub fn to_text(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Build a map value from `(key, value)` pairs, normalizing keys
    pub fn map_from<K: AsRef<str>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (normalize_key(k.as_ref()), v))
                .collect(),
        )
    }

    /// Method object bound to `receiver`, calling `function`
    pub fn bound_method(receiver: Value, method: &str, function: &str) -> Value {
        let mut map = ValueMap::new();
        map.insert(TYPE_KEY.to_string(), Value::from(METHOD_TYPE));
        map.insert(OBJECT_KEY.to_string(), receiver);
        map.insert(METHOD_KEY.to_string(), Value::from(method));
        map.insert(FUNCTION_KEY.to_string(), Value::from(function));
        Value::Map(map)
    }

    /// Unbound method object resolved through a namespace
    pub fn namespace_method(namespace: &str, method: &str, function: &str) -> Value {
        let mut map = ValueMap::new();
        map.insert(TYPE_KEY.to_string(), Value::from(METHOD_TYPE));
        map.insert(NAMESPACE_KEY.to_string(), Value::from(namespace));
        map.insert(METHOD_KEY.to_string(), Value::from(method));
        map.insert(FUNCTION_KEY.to_string(), Value::from(function));
        Value::Map(map)
    }

    /// Build a typed map (`_type` set) from field pairs
    pub fn typed_map<K: AsRef<str>>(type_name: &str, fields: impl IntoIterator<Item = (K, Value)>) -> Value {
        let mut map: ValueMap = fields
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v))
            .collect();
        map.insert(TYPE_KEY.to_string(), Value::Str(type_name.to_string()));
        Value::Map(map)
    }
}

/// Case-normalize a map key; reserved `_` keys are kept verbatim
pub fn normalize_key(key: &str) -> String {
    if key.starts_with('_') {
        key.to_string()
    } else {
        key.to_uppercase()
    }
}

/// Find the stored key matching `key`: exact normalized key first, then a
/// case-insensitive scan
pub fn find_key<'a>(map: &'a ValueMap, key: &str) -> Option<&'a str> {
    let normalized = normalize_key(key);
    if let Some((stored, _)) = map.get_key_value(&normalized) {
        return Some(stored.as_str());
    }
    map.keys()
        .find(|stored| stored.eq_ignore_ascii_case(key))
        .map(String::as_str)
}

/// Look up a map field by exact key, then case-insensitively
pub fn map_lookup<'a>(map: &'a ValueMap, key: &str) -> Option<&'a Value> {
    find_key(map, key).and_then(|stored| map.get(stored))
}

fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "NIL"),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
