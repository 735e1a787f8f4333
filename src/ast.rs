use std::{collections::HashMap, fmt};

use derive_more::with_trait::Display;
use graphql_parser::query::Value as QueryValue;
use indexmap::IndexMap;

/// The map of variables used for substitution during query execution.
pub type Variables = HashMap<String, InputValue>;

/// Kind of an executable operation.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum OperationType {
    /// A read-only fetch.
    #[display("query")]
    Query,
    /// A write followed by a fetch.
    #[display("mutation")]
    Mutation,
}

/// A JSON-like value that can be passed into the query execution, either
/// out-of-band, or in-band as default variable values and literal arguments.
///
/// Variables referenced by a query are substituted while converting the parsed
/// literal, so an `InputValue` is always constant.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum InputValue {
    Null,
    Int(i32),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    List(Vec<InputValue>),
    Object(IndexMap<String, InputValue>),
}

/// Parse an unstructured input value into a Rust data type.
///
/// The conversion _can_ fail, and must in that case return `None`.
pub trait FromInputValue: Sized {
    /// Performs the conversion.
    fn from_input_value(v: &InputValue) -> Option<Self>;
}

impl InputValue {
    /// Construct a null value.
    pub fn null() -> Self {
        Self::Null
    }

    /// Construct a scalar value.
    pub fn scalar<T: Into<Self>>(v: T) -> Self {
        v.into()
    }

    /// Construct an enum value.
    pub fn enum_value<T: AsRef<str>>(s: T) -> Self {
        Self::Enum(s.as_ref().into())
    }

    /// Construct a list value.
    pub fn list(l: Vec<Self>) -> Self {
        Self::List(l)
    }

    /// Construct an object value.
    pub fn object<K>(o: IndexMap<K, Self>) -> Self
    where
        K: Into<String>,
    {
        Self::Object(o.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Converts a literal of a parsed query into a constant value, resolving
    /// variable references with the given `vars`.
    ///
    /// Unknown variables resolve to `null`.
    pub fn from_query_value(value: &QueryValue<'_, String>, vars: &Variables) -> Self {
        match value {
            QueryValue::Variable(name) => vars.get(name).cloned().unwrap_or(Self::Null),
            QueryValue::Int(n) => match n.as_i64() {
                Some(i) => i32::try_from(i).map_or(Self::Float(i as f64), Self::Int),
                None => Self::Null,
            },
            QueryValue::Float(f) => Self::Float(*f),
            QueryValue::String(s) => Self::String(s.clone()),
            QueryValue::Boolean(b) => Self::Boolean(*b),
            QueryValue::Null => Self::Null,
            QueryValue::Enum(e) => Self::Enum(e.clone()),
            QueryValue::List(l) => {
                Self::List(l.iter().map(|v| Self::from_query_value(v, vars)).collect())
            }
            QueryValue::Object(o) => Self::Object(
                o.iter()
                    .map(|(k, v)| (k.clone(), Self::from_query_value(v, vars)))
                    .collect(),
            ),
        }
    }

    /// Shorthand form of invoking [`FromInputValue::from_input_value()`].
    pub fn convert<T: FromInputValue>(&self) -> Option<T> {
        T::from_input_value(self)
    }

    /// Does the value represent null?
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// View the underlying enum value, if present.
    pub fn as_enum_value(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// View the underlying string value, if present.
    pub fn as_string_value(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// View the underlying object value, if present.
    pub fn to_object_value(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// View the underlying list value, if present.
    pub fn to_list_value(&self) -> Option<&[Self]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Enum(e) => write!(f, "{e}"),
            Self::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    write!(f, "{v}")?;
                    if i < l.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "]")
            }
            Self::Object(o) => {
                write!(f, "{{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    write!(f, "{k}: {v}")?;
                    if i < o.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<i32> for InputValue {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for InputValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl FromInputValue for InputValue {
    fn from_input_value(v: &InputValue) -> Option<Self> {
        Some(v.clone())
    }
}

impl FromInputValue for bool {
    fn from_input_value(v: &InputValue) -> Option<Self> {
        match v {
            InputValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromInputValue for i32 {
    fn from_input_value(v: &InputValue) -> Option<Self> {
        match v {
            InputValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromInputValue for f64 {
    fn from_input_value(v: &InputValue) -> Option<Self> {
        match v {
            InputValue::Int(i) => Some(f64::from(*i)),
            InputValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl FromInputValue for String {
    fn from_input_value(v: &InputValue) -> Option<Self> {
        match v {
            InputValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<T: FromInputValue> FromInputValue for Option<T> {
    fn from_input_value(v: &InputValue) -> Option<Self> {
        match v {
            InputValue::Null => Some(None),
            v => v.convert().map(Some),
        }
    }
}

impl<T: FromInputValue> FromInputValue for Vec<T> {
    fn from_input_value(v: &InputValue) -> Option<Self> {
        match v {
            InputValue::List(l) => l.iter().map(InputValue::convert).collect(),
            // A single item is coerced into a list of one.
            other => other.convert().map(|e| vec![e]),
        }
    }
}
