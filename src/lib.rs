//! # ttlset - A Time-To-Live Membership Set for Revoked Tokens
//!
//! ttlset keeps track of revoked authentication tokens until they would have
//! expired on their own. Lookups are O(1), and expired entries are evicted by
//! a single background sweep instead of one timer per token.
//!
//! ## Features
//!
//! - **Generic Binary Heap**: [`queue::PriorityQueue`] ordered by a pluggable strategy
//! - **O(1) Membership**: `contains` only touches a hash set
//! - **Self-Managing Sweeper**: a Tokio task armed on first insert, gone once drained
//! - **Thread Safe**: one mutex guards the heap and index together
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               ttlset                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────────────────┐ │
//! │  │ Revocations │───>│             │    │        ExpiringSet           │ │
//! │  │ (auth)      │    │  insert /   │───>│  ┌──────────┐ ┌───────────┐  │ │
//! │  └─────────────┘    │  contains   │    │  │ HashSet  │ │ Priority  │  │ │
//! │  ┌─────────────┐    │             │    │  │ (index)  │ │ Queue     │  │ │
//! │  │ Command     │───>│             │    │  └──────────┘ └───────────┘  │ │
//! │  │ Handler     │    └─────────────┘    └──────────────────────────────┘ │
//! │  └─────────────┘                                      ▲                 │
//! │                                                       │                 │
//! │                     ┌─────────────────────────────────┴───────────────┐ │
//! │                     │              Sweeper                            │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use ttlset::auth::Revocations;
//! use ttlset::blacklist::{BlacklistConfig, ExpiringSet};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BlacklistConfig::from_env()?;
//!     let revocations = Revocations::new(ExpiringSet::from_config(&config)?);
//!
//!     // On logout
//!     revocations.revoke(claims.jti, claims.exp * 1000);
//!
//!     // On every authenticated request
//!     revocations.check(&claims.jti)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`queue`]: Array-backed binary heap
//! - [`blacklist`]: The expiring set, its sweeper, clock and configuration
//! - [`auth`]: Revocation facade for the authentication layer
//! - [`commands`]: Admin console commands

pub mod auth;
pub mod blacklist;
pub mod commands;
pub mod queue;

// Re-export commonly used types for convenience
pub use auth::{AuthError, Revocations};
pub use blacklist::{BlacklistConfig, BlacklistError, ExpiringSet};
pub use commands::{CommandHandler, Reply};
pub use queue::PriorityQueue;

/// Version of ttlset
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
