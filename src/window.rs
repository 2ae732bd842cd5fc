//! Sliding context window
//!
//! The window is one FIFO of `left + 1 + right` slots kept in a ring. The middle slot is the
//! center; items enter on the far right and fall off the far left. `None` marks a slot with no
//! item in it, which is how segment starts and flushes look.

pub struct Window<T> {
    left_span: usize,
    right_span: usize,
    slots: Vec<Option<T>>,
    /// Ring index of the oldest (leftmost) slot
    head: usize,
}

impl<T> Window<T> {
    /// An empty window
    pub fn new(left_span: usize, right_span: usize) -> Self {
        let width = left_span + 1 + right_span;
        Window {
            left_span,
            right_span,
            slots: (0..width).map(|_| None).collect(),
            head: 0,
        }
    }

    pub fn left_span(&self) -> usize {
        self.left_span
    }

    pub fn right_span(&self) -> usize {
        self.right_span
    }

    #[inline]
    fn slot(&self, logical: usize) -> Option<&T> {
        self.slots[(self.head + logical) % self.slots.len()].as_ref()
    }

    /// Shift everything one slot left and put `item` in the rightmost slot
    pub fn advance(&mut self, item: Option<T>) {
        // The oldest slot becomes the newest once head moves past it
        self.slots[self.head] = item;
        self.head = (self.head + 1) % self.slots.len();
    }

    pub fn center(&self) -> Option<&T> {
        self.slot(self.left_span)
    }

    /// Left context, farthest first
    pub fn left(&self, i: usize) -> Option<&T> {
        assert!(i < self.left_span);
        self.slot(i)
    }

    /// Right context, nearest first
    pub fn right(&self, i: usize) -> Option<&T> {
        assert!(i < self.right_span);
        self.slot(self.left_span + 1 + i)
    }

    /// Non-empty left slots with their offset from the center (always negative)
    pub fn left_items(&self) -> impl Iterator<Item = (i32, &T)> + '_ {
        let span = self.left_span as i32;
        (0..self.left_span).filter_map(move |i| self.slot(i).map(|t| (i as i32 - span, t)))
    }

    /// Non-empty right slots with their offset from the center (always positive)
    pub fn right_items(&self) -> impl Iterator<Item = (i32, &T)> + '_ {
        let start = self.left_span + 1;
        (0..self.right_span).filter_map(move |i| self.slot(start + i).map(|t| (i as i32 + 1, t)))
    }

    /// Whether anything waits to the right of the center
    pub fn has_pending(&self) -> bool {
        (0..self.right_span).any(|i| self.right(i).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
