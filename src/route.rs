use std::sync::atomic::{AtomicUsize, Ordering};

const UNSET: usize = usize::MAX;

/// Index of the last endpoint that produced a success.
///
/// Lock-free single cell. A read racing a write may observe the older value;
/// the racer tolerates that by falling back to a full fan-out.
#[derive(Debug)]
pub struct StickyRoute {
    slot: AtomicUsize,
    pool_len: usize,
}

impl StickyRoute {
    pub fn new(pool_len: usize) -> Self {
        Self {
            slot: AtomicUsize::new(UNSET),
            pool_len,
        }
    }

    pub fn get(&self) -> Option<usize> {
        match self.slot.load(Ordering::Acquire) {
            UNSET => None,
            index => Some(index),
        }
    }

    /// Returns false (and leaves the cell untouched) for an index outside the pool.
    pub fn set(&self, index: usize) -> bool {
        if index >= self.pool_len {
            return false;
        }
        self.slot.store(index, Ordering::Release);
        true
    }

    pub fn clear(&self) {
        self.slot.store(UNSET, Ordering::Release);
    }

    pub fn pool_len(&self) -> usize {
        self.pool_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_starts_unset() {
        let route = StickyRoute::new(3);
        assert_eq!(route.get(), None);
    }

    #[test]
    fn test_set_get_clear() {
        let route = StickyRoute::new(3);
        assert!(route.set(2));
        assert_eq!(route.get(), Some(2));

        assert!(route.set(0));
        assert_eq!(route.get(), Some(0));

        route.clear();
        assert_eq!(route.get(), None);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let route = StickyRoute::new(2);
        assert!(route.set(1));
        assert!(!route.set(2));
        assert_eq!(route.get(), Some(1));
    }

    #[test]
    fn test_concurrent_writers_leave_valid_index() {
        let route = Arc::new(StickyRoute::new(4));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let route = Arc::clone(&route);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        route.set(i % 4);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let index = route.get().unwrap();
        assert!(index < 4);
    }
}
