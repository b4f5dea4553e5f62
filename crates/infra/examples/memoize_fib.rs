//! Example: Memoizing a recursive function
//!
//! Defines a naive Fibonacci, memoizes it by name on the process-wide
//! memoizer and compares call counts before and after.
//!
//! Run with: ```bash RUST_LOG=memora=debug cargo run --example memoize_fib
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use memora_core::{CallError, Function, MemoizeOptions};
use memora_domain::MemoizeConfig;
use memora_infra::global;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn fib(calls: Arc<AtomicUsize>) -> Function {
    Function::scalar(move |args| {
        calls.fetch_add(1, Ordering::Relaxed);
        let n = args.first().and_then(|v| v.as_u64()).unwrap_or(0);
        if n < 2 {
            return Ok(json!(n));
        }
        // Recurse through the table so memoized calls hit the cache
        let memoizer = global::get().map_err(|e| CallError::function(e.to_string()))?;
        let a = memoizer.call_scalar("fib", &[json!(n - 1)])?;
        let b = memoizer.call_scalar("fib", &[json!(n - 2)])?;
        Ok(json!(a.as_u64().unwrap_or(0) + b.as_u64().unwrap_or(0)))
    })
}

fn timed(n: u64, calls: &AtomicUsize) -> anyhow::Result<()> {
    calls.store(0, Ordering::Relaxed);
    let memoizer = global::get()?;
    let started = Instant::now();
    let value = memoizer.call_scalar("fib", &[json!(n)])?;
    println!(
        "  fib({n}) = {value} in {:?} with {} invocations",
        started.elapsed(),
        calls.load(Ordering::Relaxed)
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Memoized Fibonacci Example");
    println!("==========================\n");

    let memoizer = global::init(MemoizeConfig::default()).context("installing memoizer")?;
    let calls = Arc::new(AtomicUsize::new(0));
    memoizer.define("fib", fib(Arc::clone(&calls)))?;

    println!("Plain:");
    timed(22, &calls)?;

    memoizer.memoize("fib", MemoizeOptions::new().expires_in(Duration::from_secs(300)))?;
    println!("Memoized:");
    timed(22, &calls)?;
    timed(22, &calls)?;

    if let Some(info) = memoizer.memoized("fib") {
        println!("\n  cache {} ({}): {:?}", info.cache().namespace(), info.cache().backend(), info.cache().stats());
    }

    let restored = global::shutdown()?;
    println!("\nRestored {restored} function(s)");
    Ok(())
}
