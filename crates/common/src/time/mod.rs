//! Time utilities and abstractions
//!
//! - **[`clock`]**: real and mock clocks so expiry logic can be tested
//!   without sleeping
//! - **[`duration`]**: parsing of human-written durations used by option
//!   files (`"10m"`, `"1h 30m"`, `"2 hours"`, `"never"`)
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use memora_common::time::{parse_duration, Clock, MockClock};
//!
//! let duration = parse_duration("2h 30m").unwrap();
//! assert_eq!(duration, Duration::from_secs(9000));
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

pub mod clock;
pub mod duration;

// Re-export commonly used items
pub use clock::{Clock, MockClock, SharedClock, SystemClock};
pub use duration::{parse_duration, parse_expiry, DurationParseError};
