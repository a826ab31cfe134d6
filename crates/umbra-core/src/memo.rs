use std::{fmt, sync::OnceLock};

///
/// Memo
///
/// Compute-once accessor. The first caller runs the initialiser; concurrent
/// callers block until that single result is published.
///

pub struct Memo<T> {
    cell: OnceLock<T>,
}

impl<T> Memo<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(init)
    }

    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Memo").field(value).finish(),
            None => f.write_str("Memo(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Arc, Barrier,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    #[test]
    fn concurrent_callers_share_a_single_initialisation() {
        let memo = Arc::new(Memo::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    *memo.get_or_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        42_u32
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("thread should not panic"), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memo.is_initialized());
    }
}
