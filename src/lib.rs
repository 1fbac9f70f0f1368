//! # config-mask
//!
//! Schema-driven sanitizer for untrusted, configuration-like data.
//!
//! ## Overview
//!
//! A [`Mask`] is built from a declarative [`MaskConfig`] describing the
//! expected shape of a value. `sanitize` always returns a value of that
//! shape: missing or invalid input is replaced by defaults, unknown object
//! properties are dropped, list members are filtered and primitives are
//! coerced. It never fails and never panics on malformed input.
//!
//! ## Quick Start
//!
//! ```rust
//! use config_mask::{Mask, MaskConfig, Value};
//! use serde_json::json;
//!
//! let size = Mask::new(
//!     MaskConfig::new("object")
//!         .with_property("value", MaskConfig::new("number").with_default(0))
//!         .with_property(
//!             "unit",
//!             MaskConfig::new("set").with_values(["px", "%"]).with_default("px"),
//!         ),
//! );
//!
//! let clean = size.sanitize(Value::from(json!({"value": "100", "extra": true})));
//! assert_eq!(serde_json::Value::from(clean), json!({"value": 100, "unit": "px"}));
//! ```
//!
//! ## Schema types
//!
//! - **any** — pass input through, default only when undefined
//! - **object** — sanitize declared properties with nested masks
//! - **set** — input must be one of `values`
//! - **list** — keep only the input items found in `values`
//! - **combined** — ordered alternatives, first non-null result wins
//! - **list_of** — sanitize every item with one element schema or coercion
//! - anything else — primitive coercion (`"number"`, `"text"`,
//!   `"string:strict"`, or a custom [`CoercionMap`])
//!
//! ## Architecture
//!
//! - **MaskConfig** — plain configuration record, built in code or loaded
//!   from JSON
//! - **Mask** — compiles a configuration into an evaluation plan and runs
//!   the parse → validate → sanitize → validate-after pipeline
//! - **CoercionProvider** trait — pluggable primitive coercion, with
//!   [`StandardCoercion`] as the default

pub mod coerce;
pub mod config;
pub mod error;
mod handlers;
mod json;
pub mod mask;
mod normalize;
pub mod value;

// Re-export core types
pub use coerce::{Coercer, CoercionMap, CoercionProvider, StandardCoercion, TypeSpec};
pub use config::{FilterFn, InvalidFn, MaskConfig, ParseFn, Properties, SubSchema, ValidateFn};
pub use error::{MaskError, Result};
pub use mask::Mask;
pub use value::{Function, Kind, Map, Value};
