//! Binary heap ordered by a caller-supplied comparator.
//!
//! `std::collections::BinaryHeap` needs `Ord` on the element, which forces a
//! newtype per ordering. Layer search keeps two heaps over the same element
//! type with opposite orderings, so the comparator is a value here instead.
//! The element for which the comparator answers `Greater` sits on top.

use std::cmp::Ordering;

/// Buffer-backed max-heap under `comparer`.
pub struct BinaryHeap<E, C> {
    buffer: Vec<E>,
    comparer: C,
}

impl<E, C> BinaryHeap<E, C>
where
    C: Fn(&E, &E) -> Ordering,
{
    pub fn new(comparer: C) -> Self {
        Self::with_capacity(0, comparer)
    }

    pub fn with_capacity(capacity: usize, comparer: C) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            comparer,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Top element without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&E> {
        self.buffer.first()
    }

    /// Elements in heap order.
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.buffer.iter()
    }

    pub fn push(&mut self, element: E) {
        self.buffer.push(element);
        self.sift_up(self.buffer.len() - 1);
    }

    pub fn pop(&mut self) -> Option<E> {
        if self.buffer.is_empty() {
            return None;
        }
        let last = self.buffer.len() - 1;
        self.buffer.swap(0, last);
        let top = self.buffer.pop();
        if !self.buffer.is_empty() {
            self.sift_down(0);
        }
        top
    }

    /// Keeps only the elements matching `keep`, then restores heap order.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&E) -> bool,
    {
        let before = self.buffer.len();
        self.buffer.retain(keep);
        if self.buffer.len() != before {
            self.rebuild();
        }
    }

    /// Empties the heap, keeping the allocation.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Moves all elements out in heap order, keeping the allocation.
    pub fn drain(&mut self) -> std::vec::Drain<'_, E> {
        self.buffer.drain(..)
    }

    /// Consumes the heap, returning elements in heap order.
    pub fn into_vec(self) -> Vec<E> {
        self.buffer
    }

    fn rebuild(&mut self) {
        let len = self.buffer.len();
        for i in (0..len / 2).rev() {
            self.sift_down(i);
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if (self.comparer)(&self.buffer[i], &self.buffer[parent]) != Ordering::Greater {
                break;
            }
            self.buffer.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.buffer.len();
        loop {
            let left = 2 * i + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut top = left;
            if right < len
                && (self.comparer)(&self.buffer[right], &self.buffer[left]) == Ordering::Greater
            {
                top = right;
            }
            if (self.comparer)(&self.buffer[top], &self.buffer[i]) != Ordering::Greater {
                break;
            }
            self.buffer.swap(i, top);
            i = top;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_first(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    fn min_first(a: &i32, b: &i32) -> Ordering {
        b.cmp(a)
    }

    fn drain_sorted<C: Fn(&i32, &i32) -> Ordering>(mut heap: BinaryHeap<i32, C>) -> Vec<i32> {
        let mut out = Vec::new();
        while let Some(x) = heap.pop() {
            out.push(x);
        }
        out
    }

    #[test]
    fn test_orders_by_comparator() {
        let mut max_heap = BinaryHeap::new(max_first);
        let mut min_heap = BinaryHeap::new(min_first);
        for x in [5, 1, 9, 3, 7, 3, 0] {
            max_heap.push(x);
            min_heap.push(x);
        }
        assert_eq!(max_heap.peek(), Some(&9));
        assert_eq!(min_heap.peek(), Some(&0));
        assert_eq!(drain_sorted(max_heap), vec![9, 7, 5, 3, 3, 1, 0]);
        assert_eq!(drain_sorted(min_heap), vec![0, 1, 3, 3, 5, 7, 9]);
    }

    #[test]
    fn test_retain_keeps_heap_order() {
        let mut heap = BinaryHeap::new(max_first);
        for x in 0..20 {
            heap.push(x);
        }
        heap.retain(|x| x % 3 == 0);
        assert_eq!(heap.len(), 7);
        assert_eq!(drain_sorted(heap), vec![18, 15, 12, 9, 6, 3, 0]);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut heap = BinaryHeap::with_capacity(16, max_first);
        for x in 0..16 {
            heap.push(x);
        }
        heap.clear();
        assert!(heap.is_empty());
        assert!(heap.pop().is_none());
        assert!(heap.into_vec().capacity() >= 16);
    }
}
