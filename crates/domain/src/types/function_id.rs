//! Function identity

use std::fmt;

use crate::constants::{KEY_PREFIX_ROOT, SCOPE_SEPARATOR};

/// Stable identity of a memoized function
///
/// Named functions are identified by their fully qualified name; anonymous
/// ones by the address of their shared allocation, which is stable for as
/// long as the value is kept alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionId {
    Named(String),
    Anonymous(usize),
}

impl FunctionId {
    /// Prefix mixed into every cache key of this function
    ///
    /// ```
    /// use memora_domain::FunctionId;
    ///
    /// let id = FunctionId::Named("math::fib".to_string());
    /// assert_eq!(id.key_prefix(), "memoize::math::fib");
    /// ```
    pub fn key_prefix(&self) -> String {
        format!("{KEY_PREFIX_ROOT}{SCOPE_SEPARATOR}{self}")
    }

    /// The qualified name, for named functions
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Anonymous(_) => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Anonymous(address) => write!(f, "anon/{address:#x}"),
        }
    }
}

/// Qualify `name` with `scope` unless it already carries one
///
/// Returns `None` when the result would contain an empty segment, which
/// covers empty names, leading or trailing separators and `a::::b`.
///
/// ```
/// use memora_domain::qualify_name;
///
/// assert_eq!(qualify_name("fib", "math").as_deref(), Some("math::fib"));
/// assert_eq!(qualify_name("util::fib", "math").as_deref(), Some("util::fib"));
/// assert_eq!(qualify_name("", "math"), None);
/// ```
pub fn qualify_name(name: &str, scope: &str) -> Option<String> {
    let qualified = if name.contains(SCOPE_SEPARATOR) {
        name.to_string()
    } else {
        format!("{scope}{SCOPE_SEPARATOR}{name}")
    };

    let well_formed = qualified.split(SCOPE_SEPARATOR).all(|segment| {
        !segment.is_empty() && !segment.chars().any(|c| c.is_whitespace() || c == ':')
    });
    well_formed.then_some(qualified)
}
