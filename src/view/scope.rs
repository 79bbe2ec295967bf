use std::cell::RefCell;

/// Holds a value in a cache slot until dropped, then restores what was there before.
///
/// Nested pins unwind in order, so an inner scope never clears an outer scope's value.
pub(crate) struct Pin<'s, T> {
    slot: &'s RefCell<Option<T>>,
    previous: Option<T>,
}

impl<'s, T> Pin<'s, T> {
    pub(crate) fn new(slot: &'s RefCell<Option<T>>, value: T) -> Self {
        let previous = slot.replace(Some(value));
        log::trace!("pinned view cache (nested: {})", previous.is_some());
        Self { slot, previous }
    }
}

impl<T> Drop for Pin<'_, T> {
    fn drop(&mut self) {
        self.slot.replace(self.previous.take());
        log::trace!("released view cache");
    }
}

#[cfg(test)]
mod tests {
    use super::Pin;
    use std::cell::RefCell;

    #[test]
    fn nested_pins_restore_outer_value() {
        let slot = RefCell::new(None);
        {
            let _outer = Pin::new(&slot, 1);
            {
                let _inner = Pin::new(&slot, 2);
                assert_eq!(*slot.borrow(), Some(2));
            }
            assert_eq!(*slot.borrow(), Some(1));
        }
        assert_eq!(*slot.borrow(), None);
    }
}
