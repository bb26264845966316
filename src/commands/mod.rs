//! Command Handler Module
//!
//! This module implements the admin console for a running blacklist. It takes
//! one line of text, executes it against the [`ExpiringSet`](crate::blacklist::ExpiringSet),
//! and returns a [`Reply`].
//!
//! ## Architecture
//!
//! ```text
//! stdin line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Tokenize     │
//! │  - Dispatch     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  ExpiringSet    │  (blacklist module)
//! └─────────────────┘
//! ```

pub mod handler;
pub mod reply;

// Re-export the main command handler
pub use handler::CommandHandler;
pub use reply::Reply;
