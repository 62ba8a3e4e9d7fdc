//! Environment variable access for `getenv` and `getenvRequired`

use std::collections::HashMap;

use crate::error::RenderError;

/// Read-only source of environment variables
pub trait Environment: Send + Sync {
    /// Value of `key`, or `None` if it is not set
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the running process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }
}

/// A fixed set of variables, independent of the process environment
#[derive(Debug, Default, Clone)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Environment for MapEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Value of `key`, or an empty string if unset
pub fn getenv(env: &dyn Environment, key: &str) -> String {
    env.var(key).unwrap_or_default()
}

/// Value of `key`; unset and empty are both errors
pub fn getenv_required(env: &dyn Environment, key: &str) -> Result<String, RenderError> {
    match env.var(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RenderError::MissingEnvironmentVariable(key.to_string())),
    }
}
