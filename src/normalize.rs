//! Schema normalization: turn authored configuration into a runnable plan
//!
//! Shorthand forms (property name lists, bare kind names, `:strict` type
//! suffixes) are expanded here, and every nested schema is resolved to a
//! shared `Mask` once, when the owning mask is built.

use crate::coerce::{CoercionMap, CoercionProvider, Coercer, TypeSpec};
use crate::config::{MaskConfig, Properties, SubSchema};
use crate::handlers::{Element, ListOfPlan, ObjectPlan, Plan};
use crate::mask::Mask;
use crate::value::Value;
use std::sync::Arc;

/// Default value of a node
///
/// A `set` without an explicit default falls back to its first member; an
/// empty or missing `values` list leaves the default undefined.
pub(crate) fn default_value(config: &MaskConfig) -> Value {
    match (config.type_name(), &config.default) {
        (_, Some(value)) => value.clone(),
        (Some("set"), None) => config
            .values
            .as_ref()
            .and_then(|values| values.first())
            .cloned()
            .unwrap_or_default(),
        (_, None) => Value::Undefined,
    }
}

/// Configuration behind a bare kind name: strict coercion with a `null` default
pub(crate) fn strict_schema(kind: &str) -> MaskConfig {
    MaskConfig::new(CoercionMap::strict(kind)).with_default(Value::Null)
}

/// Resolve a nested schema to a mask sharing the parent's provider
pub(crate) fn resolve(schema: &SubSchema, provider: &Arc<dyn CoercionProvider>) -> Arc<Mask> {
    match schema {
        SubSchema::Mask(mask) => Arc::clone(mask),
        SubSchema::Config(config) => Arc::new(Mask::with_provider(
            config.as_ref().clone(),
            Arc::clone(provider),
        )),
        SubSchema::Kind(kind) => {
            Arc::new(Mask::with_provider(strict_schema(kind), Arc::clone(provider)))
        }
    }
}

/// Expand a property name list into `any` schemas
pub(crate) fn normalize_properties(properties: &Properties) -> Vec<(String, SubSchema)> {
    match properties {
        Properties::Fields(fields) => fields.clone(),
        Properties::Names(names) => names
            .iter()
            .map(|name| (name.clone(), SubSchema::from(MaskConfig::new("any"))))
            .collect(),
    }
}

/// Coercer for a type spec, honouring the `:strict` suffix on named types
pub(crate) fn coercer_for(spec: &TypeSpec, provider: &dyn CoercionProvider) -> Coercer {
    match spec {
        TypeSpec::Named(name) => {
            let mut parts = name.split(':');
            let kind = parts.next().unwrap_or_default();
            if parts.next() == Some("strict") {
                CoercionMap::strict(kind).to_coercer()
            } else {
                provider.named(kind)
            }
        }
        TypeSpec::Custom(_) => provider.coercer(spec),
    }
}

/// Build the evaluation plan for a configuration
pub(crate) fn compile(config: &MaskConfig, provider: &Arc<dyn CoercionProvider>) -> Plan {
    let Some(spec) = &config.type_spec else {
        tracing::debug!("Mask has no type, it will always yield its default");
        return Plan::Coerce(Arc::new(|_: &Value| Value::Null));
    };

    match spec.name() {
        Some("any") => Plan::Any,
        Some("object") => Plan::Object(ObjectPlan {
            properties: config.properties.as_ref().map(|properties| {
                normalize_properties(properties)
                    .into_iter()
                    .map(|(name, schema)| (name, resolve(&schema, provider)))
                    .collect()
            }),
            keep_properties: config.keep_properties.unwrap_or(false),
        }),
        Some("set") => Plan::Set(config.values.clone().unwrap_or_default()),
        Some("list") => Plan::List(config.values.clone().unwrap_or_default()),
        Some("combined") => Plan::Combined(
            config
                .submasks
                .iter()
                .flatten()
                .map(|schema| resolve(schema, provider))
                .collect(),
        ),
        Some("list_of") => {
            let element = match (&config.submask, &config.subtype) {
                (Some(schema), _) => Element::Mask(resolve(schema, provider)),
                (None, Some(subtype)) => Element::Coerce(provider.coercer(subtype)),
                (None, None) => Element::Mask(resolve(
                    &SubSchema::from(MaskConfig::new("any")),
                    provider,
                )),
            };
            Plan::ListOf(ListOfPlan {
                element,
                filter: config.filter.clone(),
            })
        }
        _ => Plan::Coerce(coercer_for(spec, provider.as_ref())),
    }
}
