//! gotgen - render text templates against a key-value inventory
//!
//! Templates use Go template syntax with configurable delimiters and a fixed
//! set of functions: `var`, `getenv`, `getenvRequired`, `yaml`,
//! `indentWithSpaces` and the arithmetic functions `add`, `subtract`,
//! `multiply`, `divide` and `modulo`.
//!
//! # Example
//!
//! ```rust
//! use gotgen::{render, Value};
//!
//! let inventory: Value = [("KeyOne", Value::from("v1")), ("KeyTwo", Value::Int(2))]
//!     .into_iter()
//!     .collect();
//! let out = render(r#"{{ var "KeyOne" }}-{{ .KeyTwo }}"#, &inventory, "{{", "}}").unwrap();
//! assert_eq!(out, "v1-2");
//! ```

pub mod batch;
pub mod config;
pub mod env;
pub mod error;
pub mod functions;
pub mod inventory;
pub mod numeric;
pub mod template;
pub mod value;
pub mod yaml;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

pub use config::{ConfigError, GenConfig};
pub use env::{Environment, MapEnvironment, ProcessEnvironment};
pub use error::{RenderError, TemplateSyntaxError};
pub use functions::FunctionRegistry;
pub use inventory::Inventory;
pub use template::{DelimiterPair, Template};
pub use value::{Mapping, Value, ValueKind};

/// Configuration for one render call
#[derive(Clone)]
pub struct RenderConfig {
    /// Action delimiters
    pub delimiters: DelimiterPair,
    /// Source for `getenv` and `getenvRequired`
    pub environment: Arc<dyn Environment>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            delimiters: DelimiterPair::default(),
            environment: Arc::new(ProcessEnvironment),
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("delimiters", &self.delimiters)
            .finish_non_exhaustive()
    }
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(mut self, delimiters: DelimiterPair) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Replace the process environment, e.g. with a [`MapEnvironment`]
    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Arc::new(environment);
        self
    }
}

/// Render `template` against `inventory` with the given delimiters
///
/// Environment functions read the process environment.
pub fn render(template: &str, inventory: &Value, left: &str, right: &str) -> Result<String, RenderError> {
    let config = RenderConfig::new().with_delimiters(DelimiterPair::new(left, right));
    render_with_config(template, inventory, &config)
}

/// Render `template` against `inventory` with custom configuration
///
/// The inventory must be a mapping. Output is only returned when the whole
/// template renders; the first error aborts the render.
///
/// # Example
///
/// ```rust
/// use gotgen::{render_with_config, DelimiterPair, MapEnvironment, RenderConfig, Value};
///
/// let config = RenderConfig::new()
///     .with_delimiters(DelimiterPair::new("[[", "]]"))
///     .with_environment(MapEnvironment::new().with("REGION", "eu-west-1"));
/// let inventory = Value::Mapping(Default::default());
///
/// let out = render_with_config(r#"{{ raw }} [[ getenv "REGION" ]]"#, &inventory, &config).unwrap();
/// assert_eq!(out, "{{ raw }} eu-west-1");
/// ```
pub fn render_with_config(
    template: &str,
    inventory: &Value,
    config: &RenderConfig,
) -> Result<String, RenderError> {
    let inventory = Inventory::new(inventory)?;
    let registry = FunctionRegistry::new(inventory, config.environment.as_ref());

    let parsed = Template::parse(template, &config.delimiters)?;
    parsed.validate(&registry)?;

    let output = parsed.execute(inventory.root(), &registry)?;
    debug!(bytes = output.len(), "rendered template");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Value {
        [("KeyOne", Value::from("v1")), ("KeyTwo", Value::Int(2))]
            .into_iter()
            .collect()
    }

    fn config() -> RenderConfig {
        RenderConfig::new().with_environment(MapEnvironment::new().with("SET_VAR", "set"))
    }

    #[test]
    fn test_render_var_and_field() {
        let out = render(r#"{{ var "KeyOne" }}-{{ .KeyTwo }}"#, &inventory(), "{{", "}}").unwrap();
        assert_eq!(out, "v1-2");
    }

    #[test]
    fn test_render_missing_key() {
        assert_eq!(
            render(r#"{{ var "Missing" }}"#, &inventory(), "{{", "}}"),
            Err(RenderError::MissingKey("Missing".into()))
        );
    }

    #[test]
    fn test_render_missing_environment_variable() {
        assert_eq!(
            render_with_config(r#"{{ getenvRequired "UNSET_VAR" }}"#, &inventory(), &config()),
            Err(RenderError::MissingEnvironmentVariable("UNSET_VAR".into()))
        );
        assert_eq!(
            render_with_config(r#"{{ getenv "SET_VAR" }}"#, &inventory(), &config()).unwrap(),
            "set"
        );
    }

    #[test]
    fn test_render_arithmetic_pipeline() {
        let out = render_with_config(
            "{{ 6 | subtract 2 }} {{ 6 | divide 2 }} {{ .KeyTwo | multiply 2.5 }}",
            &inventory(),
            &config(),
        )
        .unwrap();
        assert_eq!(out, "4 3 5");
    }

    #[test]
    fn test_render_unknown_function_is_syntax_error() {
        let err = render(r#"{{ printf "x" }}"#, &inventory(), "{{", "}}").unwrap_err();
        assert!(matches!(err, RenderError::TemplateSyntax(_)));
    }

    #[test]
    fn test_render_requires_mapping_inventory() {
        assert_eq!(
            render("x", &Value::Int(1), "{{", "}}"),
            Err(RenderError::TypeMismatch {
                expected: "mapping",
                actual: ValueKind::Int
            })
        );
    }

    #[test]
    fn test_render_custom_delimiters() {
        let out = render("<% .KeyTwo %> {{ .KeyTwo }}", &inventory(), "<%", "%>").unwrap();
        assert_eq!(out, "2 {{ .KeyTwo }}");
    }
}
