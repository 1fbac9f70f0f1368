//! Mask configuration: the plain-data description of one schema node
//!
//! A `MaskConfig` is what a schema author writes, either through the
//! builder methods or as JSON via [`MaskConfig::from_json`]. Every field is
//! optional; which ones matter depends on `type`. Hooks are shared closures,
//! so cloning or merging a configuration is always shallow.

use crate::coerce::TypeSpec;
use crate::error::{MaskError, Result};
use crate::json::RawSchema;
use crate::mask::Mask;
use crate::value::Value;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Transforms input before validation and sanitation
pub type ParseFn = Arc<dyn Fn(Value, &Value) -> Value + Send + Sync>;

/// Accepts or rejects a value; the second argument is the context parameter
pub type ValidateFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Notified with every value a validation step rejects
pub type InvalidFn = Arc<dyn Fn(&Value, &Value) + Send + Sync>;

/// Keeps (`true`) or drops (`false`) an element of a `list_of` result
pub type FilterFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A nested schema: raw configuration, a built mask, or a bare kind name
///
/// A bare kind name is shorthand for strict coercion to that kind with a
/// `null` default.
#[derive(Debug, Clone)]
pub enum SubSchema {
    Config(Box<MaskConfig>),
    Mask(Arc<Mask>),
    Kind(String),
}

impl From<MaskConfig> for SubSchema {
    fn from(config: MaskConfig) -> Self {
        SubSchema::Config(Box::new(config))
    }
}

impl From<Mask> for SubSchema {
    fn from(mask: Mask) -> Self {
        SubSchema::Mask(Arc::new(mask))
    }
}

impl From<Arc<Mask>> for SubSchema {
    fn from(mask: Arc<Mask>) -> Self {
        SubSchema::Mask(mask)
    }
}

impl From<&str> for SubSchema {
    fn from(kind: &str) -> Self {
        SubSchema::Kind(kind.to_string())
    }
}

impl From<String> for SubSchema {
    fn from(kind: String) -> Self {
        SubSchema::Kind(kind)
    }
}

/// Declared properties of an `object` schema
#[derive(Debug, Clone)]
pub enum Properties {
    /// Property name → schema, in declaration order
    Fields(Vec<(String, SubSchema)>),
    /// Property names whose values pass through unchanged
    Names(Vec<String>),
}

/// Configuration record of one schema node
#[derive(Clone, Default)]
pub struct MaskConfig {
    /// Evaluation strategy: `any`, `object`, `set`, `list`, `combined`,
    /// `list_of`, or a coercion spec
    pub type_spec: Option<TypeSpec>,
    /// Value used when input is missing or invalid
    pub default: Option<Value>,
    /// Valid members for `set` and `list`
    pub values: Option<Vec<Value>>,
    /// Shape of an `object`
    pub properties: Option<Properties>,
    /// Keep undeclared properties of an `object`
    pub keep_properties: Option<bool>,
    /// Ordered alternatives of a `combined` schema
    pub submasks: Option<Vec<SubSchema>>,
    /// Element schema of a `list_of`; takes priority over `subtype`
    pub submask: Option<SubSchema>,
    /// Element coercion of a `list_of`
    pub subtype: Option<TypeSpec>,
    pub parse: Option<ParseFn>,
    pub validate: Option<ValidateFn>,
    pub validate_after: Option<ValidateFn>,
    pub on_invalid: Option<InvalidFn>,
    pub filter: Option<FilterFn>,
}

impl MaskConfig {
    /// Create a configuration with the given type
    pub fn new(type_spec: impl Into<TypeSpec>) -> Self {
        Self {
            type_spec: Some(type_spec.into()),
            ..Self::default()
        }
    }

    /// Name of the configured type, if it is a named type
    pub fn type_name(&self) -> Option<&str> {
        self.type_spec.as_ref().and_then(TypeSpec::name)
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_values<T: Into<Value>>(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Declare one property, appending to any already declared
    ///
    /// A name list set by `with_property_names` is replaced.
    pub fn with_property(mut self, name: impl Into<String>, schema: impl Into<SubSchema>) -> Self {
        let entry = (name.into(), schema.into());
        match &mut self.properties {
            Some(Properties::Fields(fields)) => fields.push(entry),
            _ => self.properties = Some(Properties::Fields(vec![entry])),
        }
        self
    }

    /// Declare properties by name only; each passes through as `any`
    pub fn with_property_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.properties = Some(Properties::Names(names.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_keep_properties(mut self, keep: bool) -> Self {
        self.keep_properties = Some(keep);
        self
    }

    pub fn with_submasks<S: Into<SubSchema>>(mut self, submasks: impl IntoIterator<Item = S>) -> Self {
        self.submasks = Some(submasks.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_submask(mut self, submask: impl Into<SubSchema>) -> Self {
        self.submask = Some(submask.into());
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<TypeSpec>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_parse(mut self, f: impl Fn(Value, &Value) -> Value + Send + Sync + 'static) -> Self {
        self.parse = Some(Arc::new(f));
        self
    }

    pub fn with_validate(mut self, f: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static) -> Self {
        self.validate = Some(Arc::new(f));
        self
    }

    pub fn with_validate_after(
        mut self,
        f: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validate_after = Some(Arc::new(f));
        self
    }

    pub fn with_on_invalid(mut self, f: impl Fn(&Value, &Value) + Send + Sync + 'static) -> Self {
        self.on_invalid = Some(Arc::new(f));
        self
    }

    pub fn with_filter(mut self, f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(f));
        self
    }

    /// Shallow merge: every field set in `patch` replaces the current one
    ///
    /// Nested configurations, masks and hooks are moved or shared as they
    /// are, never deep-copied.
    pub fn merge(&mut self, patch: MaskConfig) {
        let MaskConfig {
            type_spec,
            default,
            values,
            properties,
            keep_properties,
            submasks,
            submask,
            subtype,
            parse,
            validate,
            validate_after,
            on_invalid,
            filter,
        } = patch;

        self.type_spec = type_spec.or(self.type_spec.take());
        self.default = default.or(self.default.take());
        self.values = values.or(self.values.take());
        self.properties = properties.or(self.properties.take());
        self.keep_properties = keep_properties.or(self.keep_properties.take());
        self.submasks = submasks.or(self.submasks.take());
        self.submask = submask.or(self.submask.take());
        self.subtype = subtype.or(self.subtype.take());
        self.parse = parse.or(self.parse.take());
        self.validate = validate.or(self.validate.take());
        self.validate_after = validate_after.or(self.validate_after.take());
        self.on_invalid = on_invalid.or(self.on_invalid.take());
        self.filter = filter.or(self.filter.take());
    }

    /// Copy of this configuration with `patch` merged in
    pub fn merged(&self, patch: MaskConfig) -> MaskConfig {
        let mut config = self.clone();
        config.merge(patch);
        config
    }

    // ─── JSON authoring ──────────────────────────────────────────

    /// Load a configuration from its plain-data JSON form
    ///
    /// Nested schemas may be objects or bare type strings. Hooks and custom
    /// coercion tables cannot be expressed in JSON and are rejected; unknown
    /// fields are ignored.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        RawSchema::deserialize(json)?.into_config("$")
    }

    /// Parse JSON text and load it like [`MaskConfig::from_json`]
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str::<RawSchema>(text)?.into_config("$")
    }

    // ─── Schema check ────────────────────────────────────────────

    /// Check the schema tree for authoring mistakes
    ///
    /// Sanitation never calls this; a schema that fails the check still
    /// sanitizes, it just cannot produce useful values everywhere.
    pub fn check(&self) -> Result<()> {
        self.check_at("$")
    }

    pub(crate) fn check_at(&self, path: &str) -> Result<()> {
        let name = match &self.type_spec {
            None => return Err(MaskError::schema(path, "missing `type`")),
            Some(TypeSpec::Custom(_)) => return Ok(()),
            Some(TypeSpec::Named(name)) => name.as_str(),
        };

        match name {
            "set" => match &self.values {
                None => Err(MaskError::schema(path, "`set` requires `values`")),
                Some(values) if values.is_empty() && self.default.is_none() => Err(
                    MaskError::schema(path, "`set` with empty `values` needs a `default`"),
                ),
                Some(_) => Ok(()),
            },
            "list" if self.values.is_none() => {
                Err(MaskError::schema(path, "`list` requires `values`"))
            }
            "object" => match &self.properties {
                Some(Properties::Fields(fields)) => fields.iter().try_for_each(|(key, schema)| {
                    schema.check_at(&format!("{}.properties.{}", path, key))
                }),
                _ => Ok(()),
            },
            "combined" => match &self.submasks {
                None => Err(MaskError::schema(path, "`combined` requires `submasks`")),
                Some(submasks) => submasks.iter().enumerate().try_for_each(|(i, schema)| {
                    schema.check_at(&format!("{}.submasks[{}]", path, i))
                }),
            },
            "list_of" => match &self.submask {
                Some(schema) => schema.check_at(&format!("{}.submask", path)),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl SubSchema {
    fn check_at(&self, path: &str) -> Result<()> {
        match self {
            SubSchema::Config(config) => config.check_at(path),
            SubSchema::Mask(mask) => mask.options().check_at(path),
            SubSchema::Kind(_) => Ok(()),
        }
    }
}

impl TryFrom<&serde_json::Value> for MaskConfig {
    type Error = MaskError;

    fn try_from(json: &serde_json::Value) -> Result<Self> {
        MaskConfig::from_json(json)
    }
}

impl fmt::Debug for MaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskConfig")
            .field("type_spec", &self.type_spec)
            .field("default", &self.default)
            .field("values", &self.values)
            .field("properties", &self.properties)
            .field("keep_properties", &self.keep_properties)
            .field("submasks", &self.submasks)
            .field("submask", &self.submask)
            .field("subtype", &self.subtype)
            .field("parse", &self.parse.is_some())
            .field("validate", &self.validate.is_some())
            .field("validate_after", &self.validate_after.is_some())
            .field("on_invalid", &self.on_invalid.is_some())
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let config = MaskConfig::new("set")
            .with_values(["px", "%"])
            .with_default("px");

        assert_eq!(config.type_name(), Some("set"));
        assert_eq!(config.values, Some(vec![Value::from("px"), Value::from("%")]));
        assert_eq!(config.default, Some(Value::from("px")));
        assert!(config.parse.is_none());
    }

    #[test]
    fn test_with_property_appends() {
        let config = MaskConfig::new("object")
            .with_property("value", MaskConfig::new("number"))
            .with_property("unit", "string");

        match config.properties {
            Some(Properties::Fields(fields)) => {
                let names: Vec<_> = fields.iter().map(|(name, _)| name.as_str()).collect();
                assert_eq!(names, vec!["value", "unit"]);
                assert!(matches!(fields[1].1, SubSchema::Kind(ref kind) if kind == "string"));
            }
            other => panic!("unexpected properties: {:?}", other),
        }
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut config = MaskConfig::new("boolean:strict").with_default(true);
        config.merge(MaskConfig::default().with_default(false));

        assert_eq!(config.type_name(), Some("boolean:strict"));
        assert_eq!(config.default, Some(Value::from(false)));
    }

    #[test]
    fn test_merged_leaves_original_untouched() {
        let original = MaskConfig::new("text").with_default("a");
        let copy = original.merged(MaskConfig::new("number"));

        assert_eq!(original.type_name(), Some("text"));
        assert_eq!(copy.type_name(), Some("number"));
        assert_eq!(copy.default, Some(Value::from("a")));
    }

    #[test]
    fn test_from_json() {
        let config = MaskConfig::from_json(&json!({
            "type": "object",
            "keep_properties": true,
            "properties": {
                "unit": {"type": "set", "values": ["px", "%"], "default": "px"},
                "value": "number"
            }
        }))
        .unwrap();

        assert_eq!(config.type_name(), Some("object"));
        assert_eq!(config.keep_properties, Some(true));
        let Some(Properties::Fields(fields)) = &config.properties else {
            panic!("expected declared fields");
        };
        assert_eq!(fields.len(), 2);
        let unit = fields.iter().find(|(name, _)| name == "unit").unwrap();
        match &unit.1 {
            SubSchema::Config(unit) => {
                assert_eq!(unit.values.as_ref().map(Vec::len), Some(2));
                assert_eq!(unit.default, Some(Value::from("px")));
            }
            other => panic!("unexpected schema: {:?}", other),
        }
    }

    #[test]
    fn test_from_json_property_names() {
        let config = MaskConfig::from_json(&json!({
            "type": "object",
            "properties": ["aaa", "bbb"]
        }))
        .unwrap();
        assert!(matches!(
            config.properties,
            Some(Properties::Names(ref names)) if names == &["aaa", "bbb"]
        ));
    }

    #[test]
    fn test_from_json_submasks() {
        let config = MaskConfig::from_json_str(
            r#"{"type": "combined", "submasks": ["function", {"type": "string"}], "default": "x"}"#,
        )
        .unwrap();
        let submasks = config.submasks.unwrap();
        assert!(matches!(submasks[0], SubSchema::Kind(ref kind) if kind == "function"));
        assert!(matches!(submasks[1], SubSchema::Config(_)));
    }

    #[test]
    fn test_from_json_rejects_hooks() {
        let err = MaskConfig::from_json(&json!({"type": "text", "validate": "x"})).unwrap_err();
        assert!(err.to_string().contains("$.validate"), "unexpected error: {}", err);
    }

    #[test]
    fn test_from_json_rejects_custom_type_table() {
        let err = MaskConfig::from_json(&json!({"type": {"string": null}})).unwrap_err();
        assert!(matches!(err, MaskError::InvalidConfig { .. }));
    }

    #[test]
    fn test_from_json_reports_nested_path() {
        let err = MaskConfig::from_json(&json!({
            "type": "object",
            "properties": {"size": {"type": "list", "values": "px"}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("$.properties.size.values"), "{}", err);
    }

    #[test]
    fn test_from_json_str_invalid_text() {
        let err = MaskConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, MaskError::Json(_)));
    }

    #[test]
    fn test_from_json_ignores_unknown_fields() {
        let config = MaskConfig::from_json(&json!({"type": "any", "comment": "x"})).unwrap();
        assert_eq!(config.type_name(), Some("any"));
    }

    #[test]
    fn test_check_accepts_valid_tree() {
        let config = MaskConfig::new("object")
            .with_property("unit", MaskConfig::new("set").with_values(["px"]))
            .with_property(
                "sizes",
                MaskConfig::new("list_of").with_submask(MaskConfig::new("number")),
            );
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_check_set_without_values() {
        let err = MaskConfig::new("set").check().unwrap_err();
        assert!(err.to_string().contains("requires `values`"));
    }

    #[test]
    fn test_check_empty_set_needs_default() {
        let empty: Vec<Value> = Vec::new();
        assert!(MaskConfig::new("set").with_values(empty.clone()).check().is_err());
        assert!(MaskConfig::new("set")
            .with_values(empty)
            .with_default(Value::Null)
            .check()
            .is_ok());
    }

    #[test]
    fn test_check_reports_nested_path() {
        let config = MaskConfig::new("combined").with_submasks(vec![
            SubSchema::from("string"),
            SubSchema::from(MaskConfig::new("list")),
        ]);
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("$.submasks[1]"), "{}", err);
    }

    #[test]
    fn test_check_missing_type() {
        assert!(MaskConfig::default().check().is_err());
    }

    #[test]
    fn test_debug_shows_hook_presence() {
        let config = MaskConfig::new("text").with_parse(|input, _| input);
        let text = format!("{:?}", config);
        assert!(text.contains("parse: true"));
        assert!(text.contains("filter: false"));
    }
}
