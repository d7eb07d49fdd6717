use std::cmp::Ordering;
use std::collections::BinaryHeap;

/*
Clock-Keyed Deferred Work
=========================

Some things must happen LATER, at a known audio-clock time: tearing down a
voice once its release tail has rendered, flipping a note's "sounding" flag
when its scheduled start actually arrives. Rather than arming a timer per item,
every such item goes into a queue keyed by its due time, and the same poll that
drives scheduling drains whatever is due:

    push(0.62, voice 3)
    push(0.48, voice 1)
    push(0.48, voice 2)

    pop_due(0.50) → voice 1, voice 2     (due order, then insertion order)
    pop_due(0.50) → None
    pop_due(0.70) → voice 3

Items due at the same time come out in insertion order, so two marks scheduled
for one instant apply in the order they were decided.
*/

struct Entry<T> {
    due: f64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed: BinaryHeap is a max-heap, we want the earliest due first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct DeferredQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    seq: u64,
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn push(&mut self, due: f64, item: T) {
        self.seq += 1;
        self.heap.push(Entry {
            due,
            seq: self.seq,
            item,
        });
    }

    /// Remove and return the earliest item due at or before `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<T> {
        if self.heap.peek()?.due <= now {
            self.heap.pop().map(|e| e.item)
        } else {
            None
        }
    }

    /// Remove and return the earliest item regardless of its due time.
    pub fn pop_next(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|e| (e.due, e.item))
    }

    pub fn next_due(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.due)
    }

    /// Keep only items for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.heap.retain(|e| keep(&e.item));
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
