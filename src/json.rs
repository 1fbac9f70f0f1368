//! Plain-data (JSON) form of a mask configuration
//!
//! The raw types mirror `MaskConfig` field for field. Every field that can
//! have the wrong shape is wrapped in `Field`, so deserialization accepts
//! any document and shape errors are reported afterwards with the path of
//! the offending field.

use crate::coerce::TypeSpec;
use crate::config::{MaskConfig, Properties, SubSchema};
use crate::error::{MaskError, Result};
use crate::value::Value;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// A well-formed `T`, or whatever JSON stood in its place
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum Field<T> {
    Valid(T),
    Invalid(serde_json::Value),
}

impl<T> Field<T> {
    fn valid(self, path: &str, reason: &str) -> Result<T> {
        match self {
            Field::Valid(value) => Ok(value),
            Field::Invalid(_) => Err(MaskError::invalid(path, reason)),
        }
    }
}

/// Root of a JSON-authored schema
pub(crate) type RawSchema = Field<Box<RawConfig>>;

impl Field<Box<RawConfig>> {
    pub(crate) fn into_config(self, path: &str) -> Result<MaskConfig> {
        let raw = self.valid(path, "expected a configuration object")?;
        (*raw).into_config(path)
    }
}

#[derive(Deserialize)]
pub(crate) struct RawConfig {
    #[serde(rename = "type")]
    type_spec: Option<Field<String>>,
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
    values: Option<Field<Vec<Value>>>,
    properties: Option<Field<RawProperties>>,
    keep_properties: Option<Field<bool>>,
    submasks: Option<Field<Vec<Field<RawSubSchema>>>>,
    submask: Option<Field<RawSubSchema>>,
    subtype: Option<Field<String>>,

    // Hooks are only recorded so they can be rejected
    #[serde(default, deserialize_with = "present")]
    parse: Option<IgnoredAny>,
    #[serde(default, deserialize_with = "present")]
    validate: Option<IgnoredAny>,
    #[serde(default, deserialize_with = "present")]
    validate_after: Option<IgnoredAny>,
    #[serde(default, deserialize_with = "present")]
    on_invalid: Option<IgnoredAny>,
    #[serde(default, deserialize_with = "present")]
    filter: Option<IgnoredAny>,

    #[serde(flatten)]
    unknown: BTreeMap<String, IgnoredAny>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProperties {
    Fields(BTreeMap<String, Field<RawSubSchema>>),
    Names(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubSchema {
    Kind(String),
    Config(Box<RawConfig>),
}

/// A present key is `Some`, even when its value is `null`
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl RawConfig {
    fn into_config(self, path: &str) -> Result<MaskConfig> {
        let at = |field: &str| format!("{}.{}", path, field);

        for key in self.unknown.keys() {
            tracing::debug!(path = %at(key), "Ignoring unknown configuration field");
        }

        let hooks = [
            ("parse", self.parse.is_some()),
            ("validate", self.validate.is_some()),
            ("validate_after", self.validate_after.is_some()),
            ("on_invalid", self.on_invalid.is_some()),
            ("filter", self.filter.is_some()),
        ];
        if let Some((name, _)) = hooks.into_iter().find(|(_, present)| *present) {
            return Err(MaskError::invalid(at(name), "hooks cannot be loaded from JSON"));
        }

        Ok(MaskConfig {
            type_spec: self
                .type_spec
                .map(|spec| type_spec(spec, &at("type")))
                .transpose()?,
            default: self.default,
            values: self
                .values
                .map(|values| values.valid(&at("values"), "expected an array"))
                .transpose()?,
            properties: self
                .properties
                .map(|fields| properties(fields, &at("properties")))
                .transpose()?,
            keep_properties: self
                .keep_properties
                .map(|keep| keep.valid(&at("keep_properties"), "expected a boolean"))
                .transpose()?,
            submasks: self
                .submasks
                .map(|items| submasks(items, &at("submasks")))
                .transpose()?,
            submask: self
                .submask
                .map(|schema| sub_schema(schema, &at("submask")))
                .transpose()?,
            subtype: self
                .subtype
                .map(|spec| type_spec(spec, &at("subtype")))
                .transpose()?,
            ..MaskConfig::default()
        })
    }
}

fn type_spec(field: Field<String>, path: &str) -> Result<TypeSpec> {
    match field {
        Field::Valid(name) => Ok(TypeSpec::Named(name)),
        Field::Invalid(serde_json::Value::Object(_)) => Err(MaskError::invalid(
            path,
            "custom coercion tables cannot be loaded from JSON",
        )),
        Field::Invalid(_) => Err(MaskError::invalid(path, "expected a type name")),
    }
}

fn sub_schema(field: Field<RawSubSchema>, path: &str) -> Result<SubSchema> {
    match field.valid(path, "expected a schema object or type name")? {
        RawSubSchema::Kind(kind) => Ok(SubSchema::Kind(kind)),
        RawSubSchema::Config(raw) => (*raw).into_config(path).map(SubSchema::from),
    }
}

fn submasks(field: Field<Vec<Field<RawSubSchema>>>, path: &str) -> Result<Vec<SubSchema>> {
    field
        .valid(path, "expected an array")?
        .into_iter()
        .enumerate()
        .map(|(i, item)| sub_schema(item, &format!("{}[{}]", path, i)))
        .collect()
}

fn properties(field: Field<RawProperties>, path: &str) -> Result<Properties> {
    match field.valid(path, "expected an object or a list of names")? {
        RawProperties::Fields(fields) => fields
            .into_iter()
            .map(|(key, schema)| {
                let schema = sub_schema(schema, &format!("{}.{}", path, key))?;
                Ok((key, schema))
            })
            .collect::<Result<Vec<_>>>()
            .map(Properties::Fields),
        RawProperties::Names(names) => Ok(Properties::Names(names)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(json: serde_json::Value) -> Result<MaskConfig> {
        RawSchema::deserialize(&json)?.into_config("$")
    }

    #[test]
    fn test_null_default_is_kept() {
        let config = load(json!({"type": "number", "default": null})).unwrap();
        assert_eq!(config.default, Some(Value::Null));

        let config = load(json!({"type": "number"})).unwrap();
        assert!(config.default.is_none());
    }

    #[test]
    fn test_null_hook_is_still_rejected() {
        let err = load(json!({"type": "list_of", "filter": null})).unwrap_err();
        assert!(matches!(err, MaskError::InvalidConfig { ref path, .. } if path == "$.filter"));
    }

    #[test]
    fn test_property_names_must_be_strings() {
        let err = load(json!({"type": "object", "properties": ["a", 1]})).unwrap_err();
        assert!(matches!(err, MaskError::InvalidConfig { ref path, .. } if path == "$.properties"));
    }

    #[test]
    fn test_nested_list_is_not_a_schema() {
        let err = load(json!({
            "type": "object",
            "properties": {"meta": ["author"]}
        }))
        .unwrap_err();
        assert!(
            matches!(err, MaskError::InvalidConfig { ref path, .. } if path == "$.properties.meta")
        );
    }

    #[test]
    fn test_keep_properties_must_be_boolean() {
        let err = load(json!({"type": "object", "keep_properties": "yes"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration at '$.keep_properties': expected a boolean"
        );
    }

    #[test]
    fn test_subtype_loaded_as_named_spec() {
        let config = load(json!({"type": "list_of", "subtype": "text"})).unwrap();
        assert_eq!(config.subtype.as_ref().and_then(TypeSpec::name), Some("text"));
    }
}
