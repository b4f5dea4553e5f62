//! Turning a memoize target into a function and its identity

use memora_domain::{qualify_name, FunctionId};

use super::table::FunctionTable;
use super::value::Function;
use crate::errors::MemoizeError;

/// What memoize and unmemoize operate on: a name or a function value
#[derive(Debug, Clone)]
pub enum Target {
    /// A name, qualified with the caller's scope when it has none
    Name(String),
    /// A function value, identified by its address
    Function(Function),
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Function> for Target {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<&Function> for Target {
    fn from(function: &Function) -> Self {
        Self::Function(function.clone())
    }
}

/// A resolved target
#[derive(Debug, Clone)]
pub struct ResolvedFunction {
    /// Fully qualified name, for named targets
    pub name: Option<String>,
    /// The function currently behind the target
    pub function: Function,
    pub id: FunctionId,
}

/// Resolve a target against the table, qualifying bare names with `scope`
///
/// Has no side effects.
pub fn resolve(
    table: &FunctionTable,
    target: &Target,
    scope: &str,
) -> Result<ResolvedFunction, MemoizeError> {
    match target {
        Target::Function(function) => Ok(ResolvedFunction {
            name: None,
            function: function.clone(),
            id: FunctionId::Anonymous(function.address()),
        }),
        Target::Name(name) => {
            let unresolved = || MemoizeError::UnresolvedFunction { name: name.clone() };
            let qualified = qualify_name(name, scope).ok_or_else(unresolved)?;
            let function = table.get(&qualified).ok_or_else(|| {
                MemoizeError::UnresolvedFunction { name: qualified.clone() }
            })?;
            Ok(ResolvedFunction {
                id: FunctionId::Named(qualified.clone()),
                name: Some(qualified),
                function,
            })
        }
    }
}
