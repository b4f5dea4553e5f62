//! Name-to-function indirection table

use std::collections::HashMap;

use parking_lot::RwLock;

use super::value::Function;

/// The current callable behind each fully qualified name
///
/// Memoizing a named function rebinds its name here to the wrapper;
/// unmemoizing binds it back to the original. Readers clone the current
/// binding under a shared lock and call it after the lock is released.
#[derive(Debug, Default)]
pub struct FunctionTable {
    entries: RwLock<HashMap<String, Function>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current binding of a qualified name
    pub fn get(&self, qualified_name: &str) -> Option<Function> {
        self.entries.read().get(qualified_name).cloned()
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.entries.read().contains_key(qualified_name)
    }

    /// Qualified names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Bind a name, returning the previous binding
    pub(crate) fn bind(&self, qualified_name: &str, function: Function) -> Option<Function> {
        self.entries.write().insert(qualified_name.to_string(), function)
    }
}
