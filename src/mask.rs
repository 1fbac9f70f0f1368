//! Mask: a schema node that sanitizes values
//!
//! `sanitize` runs a fixed pipeline on every call:
//!
//! 1. resolve the default value
//! 2. `parse` the input
//! 3. `validate` it; on failure the raw default replaces the input
//! 4. run the type strategy
//! 5. `validate_after` the result; on failure the result becomes `null`
//! 6. return the result, or the default when the result is `null`
//!
//! Configuration is compiled into a plan when the mask is built and again
//! after every `set_options` / `update_options`, so nested schemas are
//! resolved once rather than on every call.

use crate::coerce::{CoercionProvider, StandardCoercion};
use crate::config::{MaskConfig, ValidateFn};
use crate::handlers::Plan;
use crate::normalize;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Schema node
///
/// Cloning a mask (or calling [`Mask::clone_with`]) copies its configuration
/// record; nested masks and hooks stay shared between the copies.
#[derive(Clone)]
pub struct Mask {
    options: MaskConfig,
    plan: Plan,
    default_value: Value,
    provider: Arc<dyn CoercionProvider>,
}

impl Mask {
    /// Build a mask using [`StandardCoercion`] for primitive types
    pub fn new(config: MaskConfig) -> Self {
        Self::with_provider(config, Arc::new(StandardCoercion))
    }

    /// Build a mask with a custom coercion provider
    ///
    /// Nested schemas given as raw configuration inherit the provider.
    pub fn with_provider(config: MaskConfig, provider: Arc<dyn CoercionProvider>) -> Self {
        let plan = normalize::compile(&config, &provider);
        let default_value = normalize::default_value(&config);
        Self {
            options: config,
            plan,
            default_value,
            provider,
        }
    }

    /// Current configuration record
    pub fn options(&self) -> &MaskConfig {
        &self.options
    }

    /// Value substituted for missing or invalid input
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// Replace the whole configuration
    pub fn set_options(&mut self, config: MaskConfig) {
        self.options = config;
        self.rebuild();
    }

    /// Shallow-merge `patch` into the configuration
    pub fn update_options(&mut self, patch: MaskConfig) {
        self.options.merge(patch);
        self.rebuild();
    }

    /// New mask whose configuration is this one merged with `overrides`
    pub fn clone_with(&self, overrides: MaskConfig) -> Mask {
        Mask::with_provider(self.options.merged(overrides), Arc::clone(&self.provider))
    }

    fn rebuild(&mut self) {
        self.plan = normalize::compile(&self.options, &self.provider);
        self.default_value = normalize::default_value(&self.options);
    }

    /// Sanitize without a context parameter
    pub fn sanitize(&self, input: impl Into<Value>) -> Value {
        self.sanitize_with(input, &Value::Undefined)
    }

    /// Sanitize, passing `param` to every hook and nested mask
    pub fn sanitize_with(&self, input: impl Into<Value>, param: &Value) -> Value {
        let default_value = &self.default_value;

        let mut input = self.parse(input.into(), param);
        if !self.validate(&input, param) {
            tracing::trace!(strategy = self.plan.name(), "Input rejected, using default");
            input = default_value.clone();
        }

        let mut result = self.plan.apply(input, default_value, param);
        if !self.validate_after(&result, param) {
            tracing::trace!(strategy = self.plan.name(), "Result rejected, using default");
            result = Value::Null;
        }

        if result.is_null() {
            default_value.clone()
        } else {
            result
        }
    }

    /// Apply the `parse` hook, or return the input unchanged
    pub fn parse(&self, input: Value, param: &Value) -> Value {
        match &self.options.parse {
            Some(parse) => parse(input, param),
            None => input,
        }
    }

    /// Run the `validate` hook; `true` when none is configured
    ///
    /// Calls `on_invalid` when the check fails.
    pub fn validate(&self, input: &Value, param: &Value) -> bool {
        self.validate_using(input, param, self.options.validate.as_ref())
    }

    /// Run the `validate_after` hook; `true` when none is configured
    ///
    /// Calls `on_invalid` when the check fails.
    pub fn validate_after(&self, result: &Value, param: &Value) -> bool {
        self.validate_using(result, param, self.options.validate_after.as_ref())
    }

    /// Run any validator against `value`, notifying `on_invalid` on failure
    ///
    /// `None` always passes. [`Mask::validate`] and [`Mask::validate_after`]
    /// call this with the configured hooks.
    pub fn validate_using(
        &self,
        value: &Value,
        param: &Value,
        validator: Option<&ValidateFn>,
    ) -> bool {
        let valid = validator.map_or(true, |validate| validate(value, param));
        if !valid {
            if let Some(on_invalid) = &self.options.on_invalid {
                on_invalid(value, param);
            }
        }
        valid
    }
}

impl Default for Mask {
    fn default() -> Self {
        Self::new(MaskConfig::default())
    }
}

impl From<MaskConfig> for Mask {
    fn from(config: MaskConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mask")
            .field("strategy", &self.plan.name())
            .field("default_value", &self.default_value)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{Coercer, CoercionMap};
    use crate::value::Kind;
    use std::sync::Mutex;

    fn number_mask() -> Mask {
        Mask::new(MaskConfig::new("number").with_default(0))
    }

    #[test]
    fn test_mask_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Mask>();
    }

    #[test]
    fn test_sanitize_primitive() {
        let mask = number_mask();
        assert_eq!(mask.sanitize(Value::Undefined), Value::from(0));
        assert_eq!(mask.sanitize(100), Value::from(100));
        assert_eq!(mask.sanitize("100"), Value::from(100));
        assert_eq!(mask.sanitize("xxx"), Value::from(0));
    }

    #[test]
    fn test_default_value_accessor() {
        let mask = Mask::new(MaskConfig::new("set").with_values(["a", "b"]));
        assert_eq!(mask.default_value(), &Value::from("a"));
    }

    #[test]
    fn test_validate_failure_uses_raw_default() {
        let mask = Mask::new(
            MaskConfig::new("set")
                .with_values(["aaa"])
                .with_default("not-a-member")
                .with_validate(|_, _| false),
        );
        assert_eq!(mask.sanitize("aaa"), Value::from("not-a-member"));
    }

    #[test]
    fn test_validate_after_forces_default() {
        let mask = Mask::new(
            MaskConfig::new("text")
                .with_default("fallback")
                .with_validate_after(|result, _| result.as_str() != Some("bad")),
        );
        assert_eq!(mask.sanitize("good"), Value::from("good"));
        assert_eq!(mask.sanitize("bad"), Value::from("fallback"));
    }

    #[test]
    fn test_on_invalid_receives_rejected_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mask = Mask::new(
            MaskConfig::new("text")
                .with_validate(|input, _| input.as_str().map_or(false, |s| s.len() <= 3))
                .with_validate_after(|result, _| result.as_str() != Some(""))
                .with_on_invalid(move |input, _| sink.lock().unwrap().push(input.clone())),
        );

        assert_eq!(mask.sanitize("abc"), Value::from("abc"));
        assert!(mask.sanitize("abcdef").is_undefined());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[Value::from("abcdef"), Value::from("")]);
    }

    #[test]
    fn test_validate_without_hook_is_true() {
        let mask = number_mask();
        assert!(mask.validate(&Value::from("anything"), &Value::Undefined));
        assert!(mask.validate_after(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn test_validate_using_external_validator() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mask = Mask::new(
            MaskConfig::new("text")
                .with_on_invalid(move |input, param| {
                    sink.lock().unwrap().push((input.clone(), param.clone()))
                }),
        );
        let short: ValidateFn = Arc::new(|value: &Value, _: &Value| {
            value.as_str().map_or(false, |s| s.len() <= 3)
        });
        let param = Value::from("ctx");

        assert!(mask.validate_using(&Value::from("abc"), &param, Some(&short)));
        assert!(!mask.validate_using(&Value::from("abcdef"), &param, Some(&short)));
        assert!(mask.validate_using(&Value::from("abcdef"), &param, None));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(Value::from("abcdef"), param.clone())]);
    }

    #[test]
    fn test_parse_without_hook_is_identity() {
        let mask = number_mask();
        assert_eq!(mask.parse(Value::from("x"), &Value::Undefined), Value::from("x"));
    }

    #[test]
    fn test_set_options_replaces_configuration() {
        let mut mask = number_mask();
        mask.set_options(MaskConfig::new("boolean").with_default(false));
        assert_eq!(mask.sanitize(Value::Undefined), Value::from(false));
        assert_eq!(mask.sanitize("aaa"), Value::from(true));
        assert!(mask.options().values.is_none());
    }

    #[test]
    fn test_update_options_merges() {
        let mut mask = Mask::new(
            MaskConfig::new("text")
                .with_default("bbb")
                .with_validate(|input, _| input.as_str().map_or(false, |s| s.len() == 6)),
        );
        assert_eq!(mask.sanitize("aaa"), Value::from("bbb"));

        mask.update_options(MaskConfig::default().with_parse(|input, _| match input {
            Value::String(s) => Value::String(s + "bbb"),
            other => other,
        }));
        assert_eq!(mask.sanitize("aaa"), Value::from("aaabbb"));
        assert_eq!(mask.options().default, Some(Value::from("bbb")));
    }

    #[test]
    fn test_clone_with_is_independent() {
        let original = Mask::new(MaskConfig::new("boolean:strict").with_default(true));
        let mut copy = original.clone_with(MaskConfig::default().with_default(false));

        assert_eq!(original.sanitize(Value::Undefined), Value::from(true));
        assert_eq!(copy.sanitize(Value::Undefined), Value::from(false));

        copy.update_options(MaskConfig::new("text"));
        assert_eq!(original.sanitize("x"), Value::from(true));
        assert_eq!(copy.sanitize("x"), Value::from("x"));
    }

    #[test]
    fn test_custom_provider_is_inherited() {
        struct Shouting;
        impl CoercionProvider for Shouting {
            fn named(&self, _kind: &str) -> Coercer {
                Arc::new(|input: &Value| match input {
                    Value::String(s) => Value::String(s.to_uppercase()),
                    _ => Value::Null,
                })
            }
        }

        let mask = Mask::with_provider(
            MaskConfig::new("object").with_property("name", MaskConfig::new("text")),
            Arc::new(Shouting),
        );
        let result = mask.sanitize(Value::from(serde_json::json!({"name": "ada"})));
        assert_eq!(result.get("name"), &Value::from("ADA"));

        let copy = mask.clone_with(MaskConfig::default());
        assert_eq!(copy.sanitize(Value::from(serde_json::json!({"name": "x"}))).get("name"), &Value::from("X"));
    }

    #[test]
    fn test_custom_type_table() {
        let mask = Mask::new(
            MaskConfig::new(
                CoercionMap::new()
                    .with(Kind::String, |input| Value::from(vec![input.clone()]))
                    .with(Kind::Array, |input| {
                        input
                            .as_array()
                            .map(|items| {
                                items
                                    .iter()
                                    .map(|item| match item {
                                        Value::Number(n) => Value::String(n.to_string()),
                                        other => other.clone(),
                                    })
                                    .collect()
                            })
                            .unwrap_or(Value::Null)
                    }),
            )
            .with_default(Vec::<Value>::new()),
        );

        assert_eq!(mask.sanitize(Value::Undefined), Value::Array(Vec::new()));
        assert_eq!(mask.sanitize("aaa"), Value::from(vec!["aaa"]));
        assert_eq!(mask.sanitize(vec!["aaa", "bbb"]), Value::from(vec!["aaa", "bbb"]));
    }

    #[test]
    fn test_mask_without_type_yields_default() {
        let mask = Mask::new(MaskConfig::default().with_default("d"));
        assert_eq!(mask.sanitize("anything"), Value::from("d"));
        assert!(Mask::default().sanitize(1).is_undefined());
    }

    #[test]
    fn test_debug_names_strategy() {
        let text = format!("{:?}", Mask::new(MaskConfig::new("list_of")));
        assert!(text.contains("list_of"));
    }
}
