//! Calling context and the shape of returned values

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{LIST_CONTEXT_TAG, SCALAR_CONTEXT_TAG};

/// Whether the caller wants a list of values or a single value
///
/// The context is part of every cache key, so the same arguments called in
/// different contexts are cached separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallContext {
    List,
    Scalar,
}

impl CallContext {
    /// Tag mixed into cache keys
    pub const fn tag(self) -> &'static str {
        match self {
            Self::List => LIST_CONTEXT_TAG,
            Self::Scalar => SCALAR_CONTEXT_TAG,
        }
    }
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A function result, shaped by the context it was produced in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value", rename_all = "lowercase")]
pub enum ReturnValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl ReturnValue {
    /// The context this value's shape corresponds to
    pub fn context(&self) -> CallContext {
        match self {
            Self::Scalar(_) => CallContext::Scalar,
            Self::List(_) => CallContext::List,
        }
    }

    /// Fit this value to the caller's context
    ///
    /// A scalar produced for a list caller becomes a one-element list. A list
    /// cannot be narrowed to a scalar, so that case yields `None`.
    ///
    /// ```
    /// use memora_domain::{CallContext, ReturnValue};
    /// use serde_json::json;
    ///
    /// let widened = ReturnValue::Scalar(json!(5)).conform(CallContext::List);
    /// assert_eq!(widened, Some(ReturnValue::List(vec![json!(5)])));
    /// assert_eq!(ReturnValue::List(vec![]).conform(CallContext::Scalar), None);
    /// ```
    pub fn conform(self, context: CallContext) -> Option<Self> {
        match (self, context) {
            (value @ Self::Scalar(_), CallContext::Scalar) => Some(value),
            (value @ Self::List(_), CallContext::List) => Some(value),
            (Self::Scalar(value), CallContext::List) => Some(Self::List(vec![value])),
            (Self::List(_), CallContext::Scalar) => None,
        }
    }

    /// Borrow the scalar payload
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }

    /// Take the scalar payload
    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }

    /// Take the values as a list; a scalar becomes a one-element list
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::List(values) => values,
        }
    }
}

impl From<Value> for ReturnValue {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Value>> for ReturnValue {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}
