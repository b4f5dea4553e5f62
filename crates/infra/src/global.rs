//! Process-wide memoizer
//!
//! Applications that memoize from many places can install one
//! [`Memoizer`] for the whole process and fetch handles to it anywhere.
//! Handles are cheap clones sharing the same function table and registry.

use std::sync::{Arc, OnceLock};

use memora_core::Memoizer;
use memora_domain::MemoizeConfig;
use parking_lot::RwLock;
use tracing::info;

use crate::config;
use crate::errors::{InfraError, InfraResult};
use crate::factory::DefaultCacheFactory;

static GLOBAL: OnceLock<RwLock<Option<Memoizer>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Memoizer>> {
    GLOBAL.get_or_init(|| RwLock::new(None))
}

/// Install the process-wide memoizer with the default backends
///
/// # Errors
/// `AlreadyInitialized` if a memoizer is installed, or a memoize error if
/// the configuration is rejected.
pub fn init(config: MemoizeConfig) -> InfraResult<Memoizer> {
    let mut slot = slot().write();
    if slot.is_some() {
        return Err(InfraError::AlreadyInitialized);
    }

    let memoizer = Memoizer::with_config(Arc::new(DefaultCacheFactory::new()), config)?;
    info!(
        configured_functions = memoizer.config().functions.len(),
        "global memoizer initialized"
    );
    *slot = Some(memoizer.clone());
    Ok(memoizer)
}

/// Install the process-wide memoizer from environment variables or files
///
/// See [`config::load`] for the lookup order.
pub fn init_from_env_or_files() -> InfraResult<Memoizer> {
    init(config::load()?)
}

/// Handle to the process-wide memoizer
///
/// # Errors
/// `NotInitialized` before [`init`] or after [`shutdown`].
pub fn get() -> InfraResult<Memoizer> {
    slot().read().clone().ok_or(InfraError::NotInitialized)
}

pub fn is_initialized() -> bool {
    slot().read().is_some()
}

/// Unmemoize everything and remove the process-wide memoizer
///
/// Returns how many functions were restored. Handles obtained earlier keep
/// working with an empty registry.
///
/// # Errors
/// `NotInitialized` if no memoizer is installed.
pub fn shutdown() -> InfraResult<usize> {
    let mut slot = slot().write();
    let memoizer = slot.take().ok_or(InfraError::NotInitialized)?;
    let restored = memoizer.unmemoize_all();
    info!(restored, "global memoizer shut down");
    Ok(restored)
}
