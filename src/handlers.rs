//! Type handlers: one evaluation strategy per schema type
//!
//! A `Plan` is compiled from configuration when a mask is built. Each
//! variant computes a candidate result from already parsed and validated
//! input; the owning mask applies `validate_after` and default substitution.

use crate::coerce::Coercer;
use crate::config::FilterFn;
use crate::mask::Mask;
use crate::value::{Map, Value};
use std::sync::Arc;

/// Compiled evaluation strategy of a mask
#[derive(Clone)]
pub(crate) enum Plan {
    Any,
    Object(ObjectPlan),
    Set(Vec<Value>),
    List(Vec<Value>),
    Combined(Vec<Arc<Mask>>),
    ListOf(ListOfPlan),
    Coerce(Coercer),
}

#[derive(Clone)]
pub(crate) struct ObjectPlan {
    /// `None` means free-form passthrough
    pub properties: Option<Vec<(String, Arc<Mask>)>>,
    pub keep_properties: bool,
}

#[derive(Clone)]
pub(crate) struct ListOfPlan {
    pub element: Element,
    pub filter: Option<FilterFn>,
}

/// Per-element sanitizer of a `list_of`
#[derive(Clone)]
pub(crate) enum Element {
    /// Full recursive sanitation
    Mask(Arc<Mask>),
    /// Coercion only, no parse or validate step
    Coerce(Coercer),
}

impl Plan {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Plan::Any => "any",
            Plan::Object(_) => "object",
            Plan::Set(_) => "set",
            Plan::List(_) => "list",
            Plan::Combined(_) => "combined",
            Plan::ListOf(_) => "list_of",
            Plan::Coerce(_) => "coerce",
        }
    }

    pub(crate) fn apply(&self, input: Value, default_value: &Value, param: &Value) -> Value {
        match self {
            Plan::Any => handle_any(input, default_value),
            Plan::Object(plan) => plan.apply(input, param),
            Plan::Set(values) => handle_set(input, values, default_value),
            Plan::List(values) => handle_list(input, values),
            Plan::Combined(submasks) => handle_combined(&input, submasks, param),
            Plan::ListOf(plan) => plan.apply(input, param),
            Plan::Coerce(coerce) => coerce(&input),
        }
    }
}

fn handle_any(input: Value, default_value: &Value) -> Value {
    if input.is_undefined() {
        default_value.clone()
    } else {
        input
    }
}

/// Membership test only; no coercion
fn handle_set(input: Value, values: &[Value], default_value: &Value) -> Value {
    if values.contains(&input) {
        input
    } else {
        default_value.clone()
    }
}

/// Keeps members of `values`, in input order, duplicates included
fn handle_list(input: Value, values: &[Value]) -> Value {
    ensure_array(input)
        .into_iter()
        .filter(|item| values.contains(item))
        .collect()
}

/// First non-null alternative wins; later alternatives are not evaluated
fn handle_combined(input: &Value, submasks: &[Arc<Mask>], param: &Value) -> Value {
    submasks
        .iter()
        .map(|mask| mask.sanitize_with(input.clone(), param))
        .find(|result| !result.is_null())
        .unwrap_or(Value::Null)
}

impl ObjectPlan {
    fn apply(&self, input: Value, param: &Value) -> Value {
        let input = match input {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let Some(properties) = &self.properties else {
            return Value::Object(input);
        };

        let mut result = if self.keep_properties {
            input.clone()
        } else {
            Map::new()
        };
        for (key, mask) in properties {
            let value = input.get(key).cloned().unwrap_or_default();
            result.insert(key.clone(), mask.sanitize_with(value, param));
        }
        Value::Object(result)
    }
}

impl ListOfPlan {
    fn apply(&self, input: Value, param: &Value) -> Value {
        let items: Vec<Value> = ensure_array(input)
            .into_iter()
            .map(|item| match &self.element {
                Element::Mask(mask) => mask.sanitize_with(item, param),
                Element::Coerce(coerce) => coerce(&item),
            })
            .collect();
        Value::Array(apply_filter(items, self.filter.as_ref()))
    }
}

/// Arrays pass through, `Undefined` becomes empty, anything else is wrapped
pub(crate) fn ensure_array(input: Value) -> Vec<Value> {
    match input {
        Value::Array(items) => items,
        Value::Undefined => Vec::new(),
        other => vec![other],
    }
}

fn apply_filter(items: Vec<Value>, filter: Option<&FilterFn>) -> Vec<Value> {
    match filter {
        Some(keep) => items.into_iter().filter(|item| keep(item)).collect(),
        None => items,
    }
}
