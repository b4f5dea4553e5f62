//! Domain constants
//!
//! Option names, context tags and key layout shared by every crate.

/// Root segment of every function key prefix (`memoize::<function>`)
pub const KEY_PREFIX_ROOT: &str = "memoize";

/// Separator between name segments
pub const SCOPE_SEPARATOR: &str = "::";

/// Scope used to qualify bare names when no other scope is chosen
pub const DEFAULT_SCOPE: &str = "main";

/// Context tag for list-context calls
pub const LIST_CONTEXT_TAG: &str = "L";

/// Context tag for scalar-context calls
pub const SCALAR_CONTEXT_TAG: &str = "S";

// Per-call options, forwarded on every compute-or-fetch
pub const OPT_EXPIRES_IN: &str = "expires_in";
pub const OPT_EXPIRES_AT: &str = "expires_at";
pub const OPT_EXPIRES_VARIANCE: &str = "expires_variance";
pub const OPT_BUSY_LOCK: &str = "busy_lock";
pub const OPT_EXPIRE_IF: &str = "expire_if";

// Cache-construction options
pub const OPT_DRIVER: &str = "driver";
pub const OPT_NAMESPACE: &str = "namespace";
pub const OPT_GLOBAL: &str = "global";
pub const OPT_MAX_SIZE: &str = "max_size";
pub const OPT_EVICTION: &str = "eviction";
pub const OPT_DEFAULT_EXPIRES_IN: &str = "default_expires_in";
pub const OPT_MAX_KEY_LENGTH: &str = "max_key_length";
pub const OPT_TRACK_METRICS: &str = "track_metrics";

// Memoize-level options that only make sense in code
pub const OPT_KEY: &str = "key";
pub const OPT_CACHE: &str = "cache";

/// Options forwarded unchanged to every compute-or-fetch call
pub const PER_CALL_OPTIONS: &[&str] =
    &[OPT_EXPIRES_IN, OPT_EXPIRES_AT, OPT_EXPIRES_VARIANCE, OPT_BUSY_LOCK, OPT_EXPIRE_IF];

/// Options consumed when a backend is built
pub const CONSTRUCTION_OPTIONS: &[&str] = &[
    OPT_DRIVER,
    OPT_NAMESPACE,
    OPT_GLOBAL,
    OPT_MAX_SIZE,
    OPT_EVICTION,
    OPT_DEFAULT_EXPIRES_IN,
    OPT_MAX_KEY_LENGTH,
    OPT_TRACK_METRICS,
];

/// Options carrying closures or instances; never accepted from data
pub const PROGRAMMATIC_OPTIONS: &[&str] = &[OPT_EXPIRE_IF, OPT_KEY, OPT_CACHE];
