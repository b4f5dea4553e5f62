//! Memoization lifecycle service - memoize, inspect and unmemoize functions

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use memora_domain::constants::DEFAULT_SCOPE;
use memora_domain::{qualify_name, CallContext, FunctionId, MemoizeConfig, OptionSet};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::options::MemoizeOptions;
use super::wrapper::build_wrapper;
use crate::cache::ports::CacheFactory;
use crate::errors::{CallError, CallResult, MemoizeError};
use crate::function::{resolve, Function, FunctionTable, Target};
use crate::registry::{FunctionRegistry, MemoInfo};

struct Shared {
    table: FunctionTable,
    registry: FunctionRegistry,
    factory: Arc<dyn CacheFactory>,
    /// Serializes memoize, unmemoize, define and teardown
    admin: Mutex<()>,
    config: RwLock<MemoizeConfig>,
}

/// Memoization service
///
/// Owns the function table, the registry and the cache factory. Clones and
/// [`Memoizer::scoped`] handles share all three; a handle only adds the
/// scope used to qualify bare names.
///
/// Every administrative operation either completes or changes nothing.
/// Wrapped calls never touch the registry.
#[derive(Clone)]
pub struct Memoizer {
    shared: Arc<Shared>,
    scope: String,
}

impl Memoizer {
    /// Create a memoizer that builds caches with `factory`
    pub fn new(factory: Arc<dyn CacheFactory>) -> Self {
        Self {
            shared: Arc::new(Shared {
                table: FunctionTable::new(),
                registry: FunctionRegistry::new(),
                factory,
                admin: Mutex::new(()),
                config: RwLock::new(MemoizeConfig::default()),
            }),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Create a memoizer with file-level configuration
    pub fn with_config(
        factory: Arc<dyn CacheFactory>,
        config: MemoizeConfig,
    ) -> Result<Self, MemoizeError> {
        let memoizer = Self::new(factory);
        memoizer.set_config(config)?;
        Ok(memoizer)
    }

    /// Replace the configuration used by [`Memoizer::memoize_configured`]
    ///
    /// Already memoized functions keep the options they were built with.
    pub fn set_config(&self, config: MemoizeConfig) -> Result<(), MemoizeError> {
        config.validate()?;
        *self.shared.config.write() = config;
        Ok(())
    }

    pub fn config(&self) -> MemoizeConfig {
        self.shared.config.read().clone()
    }

    /// A handle on the same state resolving bare names in `scope`
    pub fn scoped(&self, scope: impl Into<String>) -> Self {
        Self { shared: Arc::clone(&self.shared), scope: scope.into() }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.shared.registry
    }

    pub fn table(&self) -> &FunctionTable {
        &self.shared.table
    }

    /// Bind `name` to `function`, returning the previous binding
    ///
    /// Fails with `AlreadyMemoized` while the name is memoized, so a wrapper
    /// is never replaced behind the registry's back.
    pub fn define(
        &self,
        name: &str,
        function: Function,
    ) -> Result<Option<Function>, MemoizeError> {
        let qualified = self.qualify(name)?;
        let _admin = self.shared.admin.lock();

        let id = FunctionId::Named(qualified.clone());
        if self.shared.registry.contains(&id) {
            return Err(MemoizeError::AlreadyMemoized { id });
        }
        debug!(function = %qualified, "defined function");
        Ok(self.shared.table.bind(&qualified, function))
    }

    /// Current binding of a name: the wrapper while memoized
    pub fn function(&self, name: &str) -> Option<Function> {
        let qualified = qualify_name(name, &self.scope)?;
        self.shared.table.get(&qualified)
    }

    /// Call a function by name through the table
    pub fn call(&self, name: &str, context: CallContext, args: &[Value]) -> CallResult {
        let function = self
            .function(name)
            .ok_or_else(|| CallError::UnresolvedFunction { name: name.to_string() })?;
        function.call(context, args)
    }

    pub fn call_scalar(&self, name: &str, args: &[Value]) -> Result<Value, CallError> {
        self.call(name, CallContext::Scalar, args)?.into_scalar().ok_or(CallError::ShapeMismatch)
    }

    pub fn call_list(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, CallError> {
        self.call(name, CallContext::List, args).map(|value| value.into_list())
    }

    /// Memoize a named function or a function value
    ///
    /// Without an explicit cache, one is built by the factory with the
    /// construction options, its namespace defaulting to the function's key
    /// prefix. A named target is rebound to the returned wrapper.
    pub fn memoize(
        &self,
        target: impl Into<Target>,
        options: MemoizeOptions,
    ) -> Result<Function, MemoizeError> {
        let target = target.into();
        let _admin = self.shared.admin.lock();

        let resolved = resolve(&self.shared.table, &target, &self.scope)?;
        if self.shared.registry.contains(&resolved.id) {
            return Err(MemoizeError::AlreadyMemoized { id: resolved.id });
        }

        let (extractor, cache, call_options, construction) = options.into_parts();
        call_options.validate()?;

        let key_prefix = resolved.id.key_prefix();
        let cache = match cache {
            Some(cache) => cache,
            None => {
                let construction = construction.with_default_namespace(key_prefix.as_str());
                debug!(
                    function = %resolved.id,
                    driver = %construction.driver_or_default(),
                    namespace = construction.namespace.as_deref().unwrap_or_default(),
                    "building cache"
                );
                self.shared.factory.build(&construction).map_err(MemoizeError::CacheConstruction)?
            }
        };

        let wrapper = build_wrapper(
            resolved.function.clone(),
            Arc::clone(&cache),
            key_prefix.clone(),
            call_options.clone(),
            extractor,
        );
        let record = MemoInfo::new(
            resolved.id.clone(),
            resolved.name.clone(),
            resolved.function,
            wrapper.clone(),
            Arc::clone(&cache),
            key_prefix,
            call_options,
            SystemTime::now(),
        );

        let previous = resolved
            .name
            .as_deref()
            .map(|name| (name, self.shared.table.bind(name, wrapper.clone())));
        if let Err(err) = self.shared.registry.register(record) {
            if let Some((name, Some(original))) = previous {
                self.shared.table.bind(name, original);
            }
            return Err(err);
        }

        info!(
            function = %resolved.id,
            backend = cache.backend(),
            namespace = cache.namespace(),
            "memoized function"
        );
        Ok(wrapper)
    }

    /// Memoize with untyped options, e.g. taken from a config file
    pub fn memoize_with(
        &self,
        target: impl Into<Target>,
        options: &OptionSet,
    ) -> Result<Function, MemoizeError> {
        self.memoize(target, MemoizeOptions::from_option_set(options)?)
    }

    /// Memoize with the configured options for the target
    ///
    /// Named targets get `[defaults]` overlaid with their own
    /// `[functions."<qualified name>"]` section; function values get the
    /// defaults only.
    pub fn memoize_configured(&self, target: impl Into<Target>) -> Result<Function, MemoizeError> {
        let target = target.into();
        let options = {
            let config = self.shared.config.read();
            match &target {
                Target::Name(name) => match qualify_name(name, &self.scope) {
                    Some(qualified) => config.options_for(&qualified),
                    None => config.defaults.clone(),
                },
                Target::Function(_) => config.defaults.clone(),
            }
        };
        self.memoize_with(target, &options)
    }

    /// Record of a memoized target, if any
    ///
    /// Never fails: a target that does not resolve is simply not memoized.
    pub fn memoized(&self, target: impl Into<Target>) -> Option<Arc<MemoInfo>> {
        let resolved = resolve(&self.shared.table, &target.into(), &self.scope).ok()?;
        self.shared.registry.lookup(&resolved.id)
    }

    /// Undo a memoization and return the original function
    ///
    /// The cache is cleared best-effort; a failing clear is logged and
    /// ignored.
    pub fn unmemoize(&self, target: impl Into<Target>) -> Result<Function, MemoizeError> {
        let target = target.into();
        let _admin = self.shared.admin.lock();

        let resolved = resolve(&self.shared.table, &target, &self.scope)?;
        let record = self.shared.registry.remove(&resolved.id)?;
        self.release(&record);

        info!(function = %record.id(), "unmemoized function");
        Ok(record.original().clone())
    }

    /// Unmemoize everything; returns how many functions were released
    pub fn unmemoize_all(&self) -> usize {
        let _admin = self.shared.admin.lock();

        let records = self.shared.registry.clear();
        for record in &records {
            self.release(record);
        }
        if !records.is_empty() {
            info!(count = records.len(), "unmemoized all functions");
        }
        records.len()
    }

    /// Identifiers currently memoized, sorted
    pub fn memoized_ids(&self) -> Vec<FunctionId> {
        self.shared.registry.ids()
    }

    fn release(&self, record: &MemoInfo) {
        if let Err(err) = record.cache().clear() {
            warn!(function = %record.id(), error = %err, "cache clear failed; entries left in place");
        }
        if let Some(name) = record.name() {
            self.shared.table.bind(name, record.original().clone());
        }
    }

    fn qualify(&self, name: &str) -> Result<String, MemoizeError> {
        qualify_name(name, &self.scope)
            .ok_or_else(|| MemoizeError::UnresolvedFunction { name: name.to_string() })
    }
}

impl fmt::Debug for Memoizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoizer")
            .field("scope", &self.scope)
            .field("functions", &self.shared.table.len())
            .field("memoized", &self.shared.registry.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for memoize::service.
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use memora_domain::{Driver, KeyParts};
    use serde_json::json;

    use super::*;
    use crate::errors::CacheError;
    use crate::testing::{counting_add, RecordingCache, StaticFactory};

    fn memoizer() -> (Memoizer, Arc<StaticFactory>) {
        let factory = Arc::new(StaticFactory::new());
        (Memoizer::new(factory.clone()), factory)
    }

    /// Validates the add scenario through a named binding.
    ///
    /// Assertions:
    /// - `(2,3)` computes once and is then served from cache.
    /// - `(3,2)` is a different key and computes again.
    #[test]
    fn test_memoize_add_by_name() {
        let (memoizer, _) = memoizer();
        let (add, count) = counting_add();
        memoizer.define("add", add).unwrap();

        memoizer.memoize("add", MemoizeOptions::new()).unwrap();

        assert_eq!(memoizer.call_scalar("add", &[json!(2), json!(3)]).unwrap(), json!(5));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(memoizer.call_scalar("add", &[json!(2), json!(3)]).unwrap(), json!(5));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(memoizer.call_scalar("add", &[json!(3), json!(2)]).unwrap(), json!(5));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    /// Validates at-most-one registration and re-memoize after unmemoize.
    ///
    /// Assertions:
    /// - A second memoize fails with `AlreadyMemoized` and keeps the first wrapper.
    /// - After unmemoize the function can be memoized again.
    #[test]
    fn test_double_memoize() {
        let (memoizer, _) = memoizer();
        let (add, _) = counting_add();
        memoizer.define("add", add).unwrap();

        let wrapper = memoizer.memoize("add", MemoizeOptions::new()).unwrap();
        let err = memoizer.memoize("main::add", MemoizeOptions::new()).unwrap_err();

        assert_eq!(err, MemoizeError::AlreadyMemoized { id: FunctionId::Named("main::add".into()) });
        assert!(memoizer.function("add").unwrap().ptr_eq(&wrapper));

        memoizer.unmemoize("add").unwrap();
        assert!(memoizer.memoize("add", MemoizeOptions::new()).is_ok());
    }

    /// Validates unmemoize on a function that was never memoized.
    ///
    /// Assertions:
    /// - Fails with `NotMemoized` and the binding is unchanged.
    #[test]
    fn test_unmemoize_not_memoized() {
        let (memoizer, _) = memoizer();
        let (add, _) = counting_add();
        memoizer.define("add", add.clone()).unwrap();

        let err = memoizer.unmemoize("add").unwrap_err();
        assert_eq!(err, MemoizeError::NotMemoized { id: FunctionId::Named("main::add".into()) });
        assert!(memoizer.function("add").unwrap().ptr_eq(&add));
    }

    /// Validates the round trip on a named function.
    ///
    /// Assertions:
    /// - Unmemoize returns the original and rebinds the name to it.
    /// - The identifier leaves the registry and the cache is cleared.
    #[test]
    fn test_round_trip_named() {
        let (memoizer, factory) = memoizer();
        let (add, count) = counting_add();
        memoizer.define("add", add.clone()).unwrap();
        memoizer.memoize("add", MemoizeOptions::new()).unwrap();
        memoizer.call_scalar("add", &[json!(1)]).unwrap();

        let original = memoizer.unmemoize("add").unwrap();

        assert!(original.ptr_eq(&add));
        assert!(memoizer.function("add").unwrap().ptr_eq(&add));
        assert!(memoizer.memoized("add").is_none());
        assert_eq!(factory.caches()[0].clears(), 1);

        memoizer.call_scalar("add", &[json!(1)]).unwrap();
        memoizer.call_scalar("add", &[json!(1)]).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    /// Validates memoizing a function value.
    ///
    /// Assertions:
    /// - The record is anonymous and keyed by the function's address.
    /// - The wrapper caches; unmemoize by value returns the original.
    #[test]
    fn test_memoize_function_value() {
        let (memoizer, factory) = memoizer();
        let (add, count) = counting_add();

        let wrapper = memoizer.memoize(&add, MemoizeOptions::new()).unwrap();
        wrapper.call_scalar(&[json!(4)]).unwrap();
        wrapper.call_scalar(&[json!(4)]).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let record = memoizer.memoized(&add).unwrap();
        assert_eq!(record.id(), &FunctionId::Anonymous(add.address()));
        assert_eq!(record.name(), None);
        assert_eq!(
            factory.built()[0].namespace.as_deref(),
            Some(format!("memoize::anon/{:#x}", add.address()).as_str())
        );

        assert!(memoizer.unmemoize(&add).unwrap().ptr_eq(&add));
        assert!(memoizer.memoized_ids().is_empty());
    }

    /// Validates `memoized` leniency.
    ///
    /// Assertions:
    /// - Undefined and malformed names yield `None` rather than an error.
    #[test]
    fn test_memoized_never_fails() {
        let (memoizer, _) = memoizer();
        assert!(memoizer.memoized("nope").is_none());
        assert!(memoizer.memoized("a b").is_none());
        assert!(memoizer.memoize("nope", MemoizeOptions::new()).is_err());
    }

    /// Validates construction options passed to the factory.
    ///
    /// Assertions:
    /// - The namespace defaults to the key prefix, an explicit one is kept.
    /// - No driver given means the factory picks the memory default.
    #[test]
    fn test_cache_construction_options() {
        let (memoizer, factory) = memoizer();
        memoizer.define("f", counting_add().0).unwrap();
        memoizer.define("g", counting_add().0).unwrap();

        memoizer.memoize("f", MemoizeOptions::new()).unwrap();
        memoizer
            .memoize("g", MemoizeOptions::new().namespace("shared").driver(Driver::Null))
            .unwrap();

        let built = factory.built();
        assert_eq!(built[0].namespace.as_deref(), Some("memoize::main::f"));
        assert_eq!(built[0].driver_or_default(), Driver::Memory);
        assert_eq!(built[1].namespace.as_deref(), Some("shared"));
        assert_eq!(built[1].driver, Some(Driver::Null));
    }

    /// Validates that failed memoize calls change nothing.
    ///
    /// Assertions:
    /// - A factory failure and invalid options both leave the name bound
    ///   to the original and the registry empty.
    #[test]
    fn test_memoize_failures_are_atomic() {
        let refusing = Memoizer::new(Arc::new(StaticFactory::refusing("no backend")));
        let (add, _) = counting_add();
        refusing.define("add", add.clone()).unwrap();

        let err = refusing.memoize("add", MemoizeOptions::new()).unwrap_err();
        assert!(matches!(err, MemoizeError::CacheConstruction(CacheError::Construction { .. })));
        assert!(refusing.function("add").unwrap().ptr_eq(&add));
        assert!(refusing.registry().is_empty());

        let (memoizer, factory) = memoizer();
        memoizer.define("add", add.clone()).unwrap();
        let err = memoizer
            .memoize_with("add", &OptionSet::new().with("expires_variance", 3.0))
            .unwrap_err();
        assert!(matches!(err, MemoizeError::InvalidOptions(_)));
        assert!(memoizer.function("add").unwrap().ptr_eq(&add));
        assert!(factory.built().is_empty());
    }

    /// Validates that a failing clear does not fail unmemoize.
    ///
    /// Assertions:
    /// - Unmemoize succeeds and the original is restored.
    #[test]
    fn test_clear_failure_swallowed() {
        let (memoizer, _) = memoizer();
        let (add, _) = counting_add();
        memoizer.define("add", add.clone()).unwrap();
        let cache = Arc::new(RecordingCache::without_clear("t"));

        memoizer.memoize("add", MemoizeOptions::new().cache(cache.clone())).unwrap();
        memoizer.call_scalar("add", &[json!(1)]).unwrap();

        assert!(memoizer.unmemoize("add").unwrap().ptr_eq(&add));
        assert_eq!(cache.len(), 1);
        assert!(memoizer.function("add").unwrap().ptr_eq(&add));
    }

    /// Validates that a memoized name cannot be redefined.
    ///
    /// Assertions:
    /// - `define` fails with `AlreadyMemoized` and the wrapper stays bound.
    #[test]
    fn test_define_memoized_name() {
        let (memoizer, _) = memoizer();
        memoizer.define("add", counting_add().0).unwrap();
        let wrapper = memoizer.memoize("add", MemoizeOptions::new()).unwrap();

        let err = memoizer.define("add", counting_add().0).unwrap_err();
        assert!(matches!(err, MemoizeError::AlreadyMemoized { .. }));
        assert!(memoizer.function("add").unwrap().ptr_eq(&wrapper));
    }

    /// Validates scoped handles over shared state.
    ///
    /// Assertions:
    /// - Bare names resolve in the handle's scope.
    /// - Registrations are visible through every handle.
    #[test]
    fn test_scoped_handles() {
        let (memoizer, _) = memoizer();
        let math = memoizer.scoped("math");
        math.define("sum", counting_add().0).unwrap();

        assert!(memoizer.function("sum").is_none());
        assert!(memoizer.function("math::sum").is_some());

        math.memoize("sum", MemoizeOptions::new()).unwrap();
        assert!(memoizer.memoized("math::sum").is_some());
        assert_eq!(memoizer.memoized_ids(), vec![FunctionId::Named("math::sum".into())]);
        assert_eq!(memoizer.call_scalar("math::sum", &[json!(1), json!(1)]).unwrap(), json!(2));
    }

    /// Validates configured memoization.
    ///
    /// Assertions:
    /// - Function sections override defaults; per-call options reach the record.
    /// - Invalid configuration is refused up front.
    #[test]
    fn test_memoize_configured() {
        let mut config = MemoizeConfig::default();
        config.defaults.insert("expires_in", "1h");
        config.defaults.insert("max_size", 10);
        config.functions.insert("main::add".into(), OptionSet::new().with("expires_in", 30));

        let factory = Arc::new(StaticFactory::new());
        let memoizer = Memoizer::with_config(factory.clone(), config).unwrap();
        memoizer.define("add", counting_add().0).unwrap();
        memoizer.define("other", counting_add().0).unwrap();

        memoizer.memoize_configured("add").unwrap();
        memoizer.memoize_configured("other").unwrap();

        let add = memoizer.memoized("add").unwrap();
        assert_eq!(add.call_options().expires_in, Some(Duration::from_secs(30)));
        let other = memoizer.memoized("other").unwrap();
        assert_eq!(other.call_options().expires_in, Some(Duration::from_secs(3600)));
        assert!(factory.built().iter().all(|options| options.max_size == Some(10)));

        let mut bad = MemoizeConfig::default();
        bad.defaults.insert("ttl", 1);
        assert!(memoizer.set_config(bad).is_err());
    }

    /// Validates teardown.
    ///
    /// Assertions:
    /// - Every record is released and every name restored.
    #[test]
    fn test_unmemoize_all() {
        let (memoizer, _) = memoizer();
        let (add, _) = counting_add();
        memoizer.define("add", add.clone()).unwrap();
        memoizer.memoize("add", MemoizeOptions::new()).unwrap();
        memoizer
            .memoize(counting_add().0, MemoizeOptions::new().key(|_| KeyParts::Sequence(vec![])))
            .unwrap();

        assert_eq!(memoizer.unmemoize_all(), 2);
        assert!(memoizer.registry().is_empty());
        assert!(memoizer.function("add").unwrap().ptr_eq(&add));
        assert_eq!(memoizer.unmemoize_all(), 0);
    }

    /// Validates by-name calls to unknown functions.
    #[test]
    fn test_call_unresolved() {
        let (memoizer, _) = memoizer();
        assert_eq!(
            memoizer.call_scalar("missing", &[]),
            Err(CallError::UnresolvedFunction { name: "missing".into() })
        );
    }
}
