//! Blacklist Module
//!
//! This module provides the time-to-live membership set used to remember
//! revoked tokens until they would have expired anyway.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ExpiringSet                            │
//! │  ┌────────────────────┐   ┌──────────────────────────────┐  │
//! │  │ membership index   │   │ expiry heap (earliest first) │  │
//! │  │ HashSet<K>         │   │ PriorityQueue<HeapEntry>     │  │
//! │  └────────────────────┘   └──────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │        Sweeper            │
//!              │  (Background Tokio Task,  │
//!              │   armed while non-empty)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **O(1) membership**: `contains` never touches the heap
//! - **Bounded sweeps**: each tick only pops entries that have expired
//! - **Self-managing timer**: armed on first insert, disarmed when drained
//! - **Injectable clock**: [`ManualClock`] makes expiry deterministic in tests
//!
//! ## Example
//!
//! ```
//! use ttlset::blacklist::{ExpiringSet, ManualClock};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = Arc::new(ManualClock::new(1_000));
//! let set: ExpiringSet<&str> =
//!     ExpiringSet::with_clock(Duration::from_secs(15), clock.clone()).unwrap();
//!
//! set.insert("revoked", 1_500, None);
//! assert!(set.contains(&"revoked"));
//!
//! clock.set(2_000);
//! assert_eq!(set.sweep(), 1);
//! assert!(!set.contains(&"revoked"));
//! ```

pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod set;
mod sweeper;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BlacklistConfig, DEFAULT_SWEEP_INTERVAL, SWEEP_INTERVAL_ENV};
pub use entry::{ByExpiry, HeapEntry};
pub use error::{BlacklistError, BlacklistResult};
pub use set::{BlacklistStats, ExpiringSet};
