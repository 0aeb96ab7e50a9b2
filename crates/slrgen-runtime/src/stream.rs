//! Push-back stream.

/// An iterator adapter that can look at the next item without consuming it
/// and accepts any number of items pushed back in front of the remaining input.
///
/// Pushed-back items are replayed in LIFO order, ahead of the underlying iterator.
pub struct PushBack<I: Iterator> {
    iter: I,
    pending: Vec<I::Item>,
}

impl<I: Iterator> PushBack<I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            pending: Vec::new(),
        }
    }

    /// Return a reference to the next item without consuming it.
    pub fn peek(&mut self) -> Option<&I::Item> {
        if self.pending.is_empty() {
            let item = self.iter.next()?;
            self.pending.push(item);
        }
        self.pending.last()
    }

    /// Put an item in front of the stream; it will be the next one returned.
    pub fn push_back(&mut self, item: I::Item) {
        self.pending.push(item);
    }

    /// The number of buffered items waiting in front of the underlying iterator.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl<I: Iterator> Iterator for PushBack<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.pending.pop().or_else(|| self.iter.next())
    }
}
