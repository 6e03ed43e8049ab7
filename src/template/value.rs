// Data model that templates are expanded against

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

static UNDEFINED: Value = Value::Undefined;

/// Shape of a [`Value`], as seen by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Undefined,
    Scalar,
    List,
    Mapping,
}

/// A variable value.
///
/// Anything a template can be expanded against converts into this type:
/// strings and numbers become scalars, sequences become lists, maps and
/// records become mappings, and absent values (`None`, JSON `null`) become
/// [`Value::Undefined`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Scalar(String),
    List(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Undefined => Kind::Undefined,
            Value::Scalar(_) => Kind::Scalar,
            Value::List(_) => Kind::List,
            Value::Mapping(_) => Kind::Mapping,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Wraps anything with a string representation as a scalar.
    pub fn display(value: &impl fmt::Display) -> Self {
        Value::Scalar(value.to_string())
    }

    /// Converts any serializable value. Structs become mappings keyed by
    /// their serialized field names.
    ///
    /// Only the serialized name survives: a field declared as `first_name`
    /// with `#[serde(rename = "firstName")]` answers to `firstName` alone.
    /// Build the mapping with [`Mapping::insert_aliased`] to keep both names.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<serde_json::Value>(json).map(Value::from)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str::<serde_yaml::Value>(yaml).map(Value::from)
    }

    /// Looks up a single name: a mapping key, or a field alias. Every other
    /// shape has no members.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Mapping(mapping) => mapping.get(name),
            _ => None,
        }
    }

    /// Walks a dotted path. Any missing step resolves to
    /// [`Value::Undefined`].
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> &Value {
        let mut value = self;
        for segment in path {
            match value.get(segment.as_ref()) {
                Some(next) => value = next,
                None => return &UNDEFINED,
            }
        }
        value
    }

    /// String form used when a composite value ends up where a single string
    /// is expected, such as a list nested in a list.
    pub fn to_scalar_string(&self) -> Cow<'_, str> {
        match self {
            Value::Undefined => Cow::Borrowed(""),
            Value::Scalar(s) => Cow::Borrowed(s),
            Value::List(items) => Cow::Owned(
                items
                    .iter()
                    .filter(|item| !item.is_undefined())
                    .map(|item| item.to_scalar_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::Mapping(mapping) => Cow::Owned(
                mapping
                    .iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .flat_map(|(k, v)| [Cow::Borrowed(k), v.to_scalar_string()])
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }
}

/// Ordered key/value pairs.
///
/// Entries keep their insertion order, which is also the order they are
/// expanded in. An entry may carry an alias: a second name it answers to
/// when no key matches, like a record field with an alternate name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping {
    entries: IndexMap<String, Value>,
    /// Alias to key
    aliases: HashMap<String, String>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing the value of an existing entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Sets `key` and registers `alias` as its alternate name.
    pub fn insert_aliased(
        &mut self,
        key: impl Into<String>,
        alias: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        let key = key.into();
        self.aliases.insert(alias.into(), key.clone());
        self.insert(key, value)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Exact key match first, then alias match.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|key| self.entries.get(key))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Mapping(iter.into_iter().collect())
    }
}

macro_rules! scalar_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Scalar(value.to_string())
                }
            }
        )*
    };
}

scalar_from!(
    &str, String, &String, Cow<'_, str>, char, bool, i8, i16, i32, i64, i128, isize, u8, u16,
    u32, u64, u128, usize, f32, f64
);

impl From<Mapping> for Value {
    fn from(mapping: Mapping) -> Self {
        Value::Mapping(mapping)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Undefined, Into::into)
    }
}

impl<T: Into<Value>> From<Box<T>> for Value {
    fn from(value: Box<T>) -> Self {
        (*value).into()
    }
}

impl<T: Into<Value> + Clone> From<Rc<T>> for Value {
    fn from(value: Rc<T>) -> Self {
        (*value).clone().into()
    }
}

impl<T: Into<Value> + Clone> From<Arc<T>> for Value {
    fn from(value: Arc<T>) -> Self {
        (*value).clone().into()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(items: &[T]) -> Self {
        Value::List(items.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>, S> From<HashMap<K, V, S>> for Value {
    fn from(map: HashMap<K, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Undefined,
            serde_json::Value::Bool(b) => b.into(),
            serde_json::Value::Number(n) => Value::Scalar(n.to_string()),
            serde_json::Value::String(s) => Value::Scalar(s),
            serde_json::Value::Array(items) => items.into(),
            serde_json::Value::Object(map) => map.into_iter().collect(),
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::Undefined,
            serde_yaml::Value::Bool(b) => b.into(),
            serde_yaml::Value::Number(n) => Value::Scalar(n.to_string()),
            serde_yaml::Value::String(s) => Value::Scalar(s),
            serde_yaml::Value::Sequence(items) => items.into(),
            serde_yaml::Value::Mapping(map) => map
                .into_iter()
                .filter_map(|(k, v)| match Value::from(k) {
                    Value::Scalar(key) => Some((key, v)),
                    _ => None,
                })
                .collect(),
            serde_yaml::Value::Tagged(tagged) => tagged.value.into(),
        }
    }
}
