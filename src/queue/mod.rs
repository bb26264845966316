//! Priority Queue Module
//!
//! This module provides the binary heap that the blacklist uses to find
//! "what expires next" without scanning every entry.
//!
//! ## Layout
//!
//! The heap is stored as an implicit binary tree inside a dense `Vec`:
//!
//! ```text
//!                 [0]
//!               /     \
//!            [1]       [2]
//!           /   \     /   \
//!         [3]   [4] [5]   [6]
//!
//!   parent(i) = (i - 1) / 2
//!   left(i)   = 2i + 1
//!   right(i)  = 2i + 2
//! ```
//!
//! Ordering is supplied by a [`Priority`] strategy rather than by `Ord`, so
//! the same element type can be used as a min-heap or a max-heap.
//!
//! ## Example
//!
//! ```
//! use ttlset::queue::{MinFirst, PriorityQueue};
//!
//! let mut queue = PriorityQueue::new(MinFirst);
//! queue.push([5, 1, 3]);
//!
//! assert_eq!(queue.pop(), Some(1));
//! assert_eq!(queue.pop(), Some(3));
//! assert_eq!(queue.pop(), Some(5));
//! assert_eq!(queue.pop(), None);
//! ```

pub mod heap;

// Re-export commonly used types
pub use heap::{ByFn, MaxFirst, MinFirst, Priority, PriorityQueue};
