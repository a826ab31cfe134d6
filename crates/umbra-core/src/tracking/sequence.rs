use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

///
/// Sequence
///
/// Process-wide monotonic counter shared by every change record.
/// A checkpoint is simply the current value; records created afterwards
/// always carry a strictly larger number.
///

pub struct Sequence;

impl Sequence {
    /// Reserve the next sequence number.
    pub fn next() -> u64 {
        SEQUENCE.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Latest sequence number handed out.
    #[must_use]
    pub fn current() -> u64 {
        SEQUENCE.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_is_strictly_greater_than_any_checkpoint() {
        let checkpoint = Sequence::current();
        let a = Sequence::next();
        let b = Sequence::next();

        assert!(a > checkpoint);
        assert!(b > a);
        assert!(Sequence::current() >= b);
    }
}
