//! Callable function values

use std::fmt;
use std::sync::Arc;

use memora_domain::{CallContext, ReturnValue};
use serde_json::Value;

use crate::errors::{CallError, CallResult};

type DynFunction = dyn Fn(CallContext, &[Value]) -> CallResult + Send + Sync;

/// A shareable function taking JSON arguments and a calling context
///
/// Clones share one allocation, and that allocation's address is the
/// function's identity when it is memoized without a name.
#[derive(Clone)]
pub struct Function {
    inner: Arc<DynFunction>,
}

impl Function {
    /// Wrap a context-aware function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(CallContext, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Wrap a function that always yields one value
    ///
    /// ```
    /// use memora_core::Function;
    /// use serde_json::json;
    ///
    /// let double = Function::scalar(|args| Ok(json!(args[0].as_i64().unwrap_or(0) * 2)));
    /// assert_eq!(double.call_scalar(&[json!(21)]).unwrap(), json!(42));
    /// ```
    pub fn scalar<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self::new(move |_, args| f(args).map(ReturnValue::Scalar))
    }

    /// Invoke in the given context
    pub fn call(&self, context: CallContext, args: &[Value]) -> CallResult {
        (self.inner)(context, args)
    }

    /// Invoke in scalar context
    pub fn call_scalar(&self, args: &[Value]) -> Result<Value, CallError> {
        self.call(CallContext::Scalar, args)?.into_scalar().ok_or(CallError::ShapeMismatch)
    }

    /// Invoke in list context
    pub fn call_list(&self, args: &[Value]) -> Result<Vec<Value>, CallError> {
        self.call(CallContext::List, args).map(ReturnValue::into_list)
    }

    /// Address of the shared allocation
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Whether both values are the same function
    pub fn ptr_eq(&self, other: &Function) -> bool {
        self.address() == other.address()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:#x})", self.address())
    }
}
