//! Primitive coercion: turn arbitrary values into a target kind
//!
//! The sanitation engine never converts primitives itself. It asks a
//! `CoercionProvider` for a `Coercer` and treats a `Null` result as "could
//! not coerce", which lets the enclosing mask fall back to its default.
//! `StandardCoercion` is the provider used unless a mask is built with
//! another one.

use crate::value::{number_to_string, Kind, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Maps an input value to a coerced value, or `Null` when impossible
pub type Coercer = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Per-kind coercion table
///
/// Input is routed by its runtime kind. Kinds without an entry, and kinds
/// mapped to `None`, coerce to `Null`.
#[derive(Clone, Default)]
pub struct CoercionMap {
    entries: BTreeMap<Kind, Option<Coercer>>,
}

impl CoercionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce values of `kind` with `f`
    pub fn with(
        mut self,
        kind: Kind,
        f: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.entries.insert(kind, Some(Arc::new(f)));
        self
    }

    /// Reject values of `kind` explicitly
    pub fn reject(mut self, kind: Kind) -> Self {
        self.entries.insert(kind, None);
        self
    }

    /// Table that passes `kind` through untouched and rejects every other kind
    ///
    /// A name that is not a runtime kind (e.g. `"text"`) rejects everything.
    pub fn strict(kind: &str) -> Self {
        let mut map = Kind::ALL
            .into_iter()
            .fold(Self::new(), |map, other| map.reject(other));
        if let Some(kind) = Kind::from_name(kind) {
            map = map.with(kind, Value::clone);
        }
        map
    }

    /// Kinds that have an entry, whether mapped or rejected
    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.entries.keys().copied()
    }

    /// Whether values of `kind` have a coercion function
    pub fn accepts(&self, kind: Kind) -> bool {
        matches!(self.entries.get(&kind), Some(Some(_)))
    }

    pub fn coerce(&self, input: &Value) -> Value {
        match self.entries.get(&input.kind()) {
            Some(Some(f)) => f(input),
            _ => Value::Null,
        }
    }

    pub fn to_coercer(&self) -> Coercer {
        let map = self.clone();
        Arc::new(move |input: &Value| map.coerce(input))
    }
}

impl fmt::Debug for CoercionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(kind, entry)| {
                (kind.name(), if entry.is_some() { "coerce" } else { "reject" })
            }))
            .finish()
    }
}

/// Identifies the coercion a schema node asks for
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// Type name, optionally suffixed with `:strict`
    Named(String),
    /// Custom per-kind coercion table
    Custom(CoercionMap),
}

impl TypeSpec {
    /// The type name, if this is a named spec
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeSpec::Named(name) => Some(name),
            TypeSpec::Custom(_) => None,
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        TypeSpec::Named(name.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(name: String) -> Self {
        TypeSpec::Named(name)
    }
}

impl From<CoercionMap> for TypeSpec {
    fn from(map: CoercionMap) -> Self {
        TypeSpec::Custom(map)
    }
}

/// Source of primitive coercion functions
///
/// Implementations decide how loosely a kind name is interpreted. The only
/// contract is that a failed coercion yields `Value::Null`.
pub trait CoercionProvider: Send + Sync {
    /// Coercer for a kind name such as `"number"` or `"text"`
    fn named(&self, kind: &str) -> Coercer;

    /// Coercer for any type spec
    ///
    /// Default implementation routes custom tables through the table itself.
    fn coercer(&self, spec: &TypeSpec) -> Coercer {
        match spec {
            TypeSpec::Named(name) => self.named(name),
            TypeSpec::Custom(map) => map.to_coercer(),
        }
    }
}

/// Best-effort coercion for the common primitive kinds
///
/// | kind | accepts |
/// |---|---|
/// | `any` | everything, unchanged |
/// | `number` | numbers, numeric strings, booleans (1/0) |
/// | `integer` | as `number`, truncated toward zero |
/// | `string` | strings, numbers, booleans |
/// | `text` | as `string`, plus `undefined`/`null` as `""` and arrays joined with `,` |
/// | `boolean` | booleans, numbers (non-zero), strings, arrays, objects, functions |
/// | other runtime kinds | only values of exactly that kind |
///
/// Unknown kind names never coerce.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCoercion;

impl CoercionProvider for StandardCoercion {
    fn named(&self, kind: &str) -> Coercer {
        match kind {
            "any" => Arc::new(Value::clone),
            "number" => Arc::new(to_number),
            "integer" => Arc::new(to_integer),
            "string" => Arc::new(to_string),
            "text" => Arc::new(to_text),
            "boolean" => Arc::new(to_boolean),
            other => match Kind::from_name(other) {
                Some(kind) => Arc::new(move |input: &Value| {
                    if input.kind() == kind {
                        input.clone()
                    } else {
                        Value::Null
                    }
                }),
                None => {
                    tracing::debug!(kind = other, "Unknown coercion kind, input will never coerce");
                    Arc::new(|_: &Value| Value::Null)
                }
            },
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn to_number(input: &Value) -> Value {
    match input {
        Value::Number(n) if !n.is_nan() => Value::Number(*n),
        Value::String(s) => parse_number(s).map_or(Value::Null, Value::Number),
        Value::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
        _ => Value::Null,
    }
}

fn to_integer(input: &Value) -> Value {
    match to_number(input) {
        Value::Number(n) => Value::Number(n.trunc()),
        other => other,
    }
}

fn to_string(input: &Value) -> Value {
    match input {
        Value::String(s) => Value::String(s.clone()),
        Value::Number(n) => Value::String(number_to_string(*n)),
        Value::Bool(b) => Value::String(b.to_string()),
        _ => Value::Null,
    }
}

fn to_text(input: &Value) -> Value {
    match input {
        Value::Undefined | Value::Null => Value::String(String::new()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match to_text(item) {
                    Value::String(s) => s,
                    _ => String::new(),
                })
                .collect();
            Value::String(parts.join(","))
        }
        other => to_string(other),
    }
}

fn to_boolean(input: &Value) -> Value {
    match input {
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Bool(*n != 0.0 && !n.is_nan()),
        Value::String(s) => Value::Bool(!matches!(s.as_str(), "" | "false" | "0")),
        Value::Array(_) | Value::Object(_) | Value::Function(_) => Value::Bool(true),
        Value::Undefined | Value::Null => Value::Null,
    }
}
