//! Built-in template functions
//!
//! The registry binds the inventory and an environment source for one render
//! call and exposes the functions by their template names (`var`, `getenv`,
//! `getenvRequired`, `yaml`, `indentWithSpaces`, `add`, `subtract`,
//! `multiply`, `divide`, `modulo`).

mod indent;
mod registry;

pub use indent::{indent_with_spaces, MAX_INDENT};
pub use registry::{
    FunctionRegistry, FunctionSignature, Param, ParamKind, ReturnKind, SIGNATURES,
};
