//! Array-Backed Binary Heap
//!
//! A generic priority queue ordered by a caller-supplied [`Priority`]
//! strategy. The heap knows nothing about time or expiry.
//!
//! ## Invariant
//!
//! For every non-root index `i`, the element at `i` does not outrank the
//! element at `parent(i)`. Nothing is guaranteed about siblings or about
//! elements of equal priority.

use std::fmt;

/// Ordering strategy for a [`PriorityQueue`].
///
/// `outranks(a, b)` returns `true` when `a` should sit above `b`. The
/// predicate must be a strict, consistent ordering; the queue does not
/// check this.
pub trait Priority<T> {
    /// Returns `true` if `a` has strictly higher priority than `b`.
    fn outranks(&self, a: &T, b: &T) -> bool;
}

/// Smallest element first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinFirst;

impl<T: Ord> Priority<T> for MinFirst {
    #[inline]
    fn outranks(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Largest element first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxFirst;

impl<T: Ord> Priority<T> for MaxFirst {
    #[inline]
    fn outranks(&self, a: &T, b: &T) -> bool {
        a > b
    }
}

/// Adapts a plain predicate closure into a [`Priority`] strategy.
///
/// ```
/// use ttlset::queue::{ByFn, PriorityQueue};
///
/// let mut longest_first = PriorityQueue::new(ByFn(|a: &&str, b: &&str| a.len() > b.len()));
/// longest_first.push(["ab", "abcd", "a"]);
/// assert_eq!(longest_first.pop(), Some("abcd"));
/// ```
#[derive(Clone, Copy)]
pub struct ByFn<F>(pub F);

impl<T, F> Priority<T> for ByFn<F>
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn outranks(&self, a: &T, b: &T) -> bool {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for ByFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ByFn(..)")
    }
}

/// A binary heap stored in a dense `Vec`.
///
/// # Example
///
/// ```
/// use ttlset::queue::{MaxFirst, PriorityQueue};
///
/// let mut queue = PriorityQueue::new(MaxFirst);
/// queue.push_one(2);
/// queue.push_one(7);
///
/// assert_eq!(queue.peek(), Some(&7));
/// assert_eq!(queue.len(), 2);
/// ```
#[derive(Clone)]
pub struct PriorityQueue<T, P> {
    /// Implicit binary tree, root at index 0
    nodes: Vec<T>,
    /// Decides which of two elements sits higher
    priority: P,
}

impl<T: fmt::Debug, P> fmt::Debug for PriorityQueue<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.nodes.len())
            .field("top", &self.nodes.first())
            .finish()
    }
}

impl<T, P: Priority<T> + Default> Default for PriorityQueue<T, P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<T, P: Priority<T>> PriorityQueue<T, P> {
    /// Creates an empty queue ordered by `priority`.
    pub fn new(priority: P) -> Self {
        Self {
            nodes: Vec::new(),
            priority,
        }
    }

    /// Creates an empty queue with room for `capacity` elements.
    pub fn with_capacity(priority: P, capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            priority,
        }
    }

    /// Inserts a single element.
    pub fn push_one(&mut self, value: T) {
        self.nodes.push(value);
        self.sift_up(self.nodes.len() - 1);
    }

    /// Inserts every element of `values` and returns how many were inserted.
    pub fn push<I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut count = 0;
        for value in values {
            self.push_one(value);
            count += 1;
        }
        count
    }

    /// Removes and returns the highest-priority element.
    ///
    /// Returns `None` when the queue is empty.
    pub fn pop(&mut self) -> Option<T> {
        let last = self.nodes.pop()?;

        if self.nodes.is_empty() {
            return Some(last);
        }

        let top = std::mem::replace(&mut self.nodes[0], last);
        self.sift_down(0);
        Some(top)
    }

    /// Returns the highest-priority element without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.nodes.first()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the queue holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over the elements in storage order (not sorted).
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.nodes.iter()
    }

    /// Moves the node at `index` toward the root while it outranks its parent.
    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = parent_of(index);
            if !self.priority.outranks(&self.nodes[index], &self.nodes[parent]) {
                break;
            }
            self.nodes.swap(index, parent);
            index = parent;
        }
    }

    /// Moves the node at `index` down until neither child outranks it.
    fn sift_down(&mut self, mut index: usize) {
        let count = self.nodes.len();

        loop {
            let left = left_child_of(index);
            if left >= count {
                break;
            }

            // Ties go to the left child
            let right = left + 1;
            let target = if right < count
                && self.priority.outranks(&self.nodes[right], &self.nodes[left])
            {
                right
            } else {
                left
            };

            if !self.priority.outranks(&self.nodes[target], &self.nodes[index]) {
                break;
            }

            self.nodes.swap(index, target);
            index = target;
        }
    }
}

#[inline]
fn parent_of(index: usize) -> usize {
    (index - 1) >> 1
}

#[inline]
fn left_child_of(index: usize) -> usize {
    2 * index + 1
}
