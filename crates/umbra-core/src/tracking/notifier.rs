use crate::{observer::Observer, types::ObserverId};
use std::collections::{HashSet, VecDeque};

///
/// DirtyObjectNotifier
///
/// Walks outward from a changed observer through every observer that
/// transitively contains it. Each containing tracker records the source id
/// in its dirty graph. Walks are cycle-safe.
///

pub struct DirtyObjectNotifier;

impl DirtyObjectNotifier {
    /// Record `source` as dirty in every observer that contains it.
    pub fn object_is_dirty(source: &Observer) {
        if let Some(id) = source.id() {
            Self::propagate(source, id);
        }
    }

    /// Record `dirty` in the dirty graph of every observer containing `from`.
    pub fn propagate(from: &Observer, dirty: ObserverId) {
        let touched = Self::walk_outward(from, |outer| {
            if outer.id() == Some(dirty) {
                return;
            }
            if let Some(tracker) = outer.base_tracker() {
                tracker.add_dirty_object(dirty);
            }
        });
        tracing::trace!(observer = %dirty, touched, "dirty state propagated");
    }

    /// Remove `source` from the dirty graph of every observer that contains it.
    pub fn object_is_no_longer_dirty(source: &Observer) {
        let Some(id) = source.id() else {
            return;
        };

        Self::walk_outward(source, |outer| {
            if let Some(tracker) = outer.base_tracker() {
                tracker.remove_from_dirty_object_graph(id);
            }
        });
    }

    // Breadth-first over outer links; `visit` sees every ancestor once.
    fn walk_outward(source: &Observer, mut visit: impl FnMut(&Observer)) -> usize {
        let mut visited: HashSet<ObserverId> = source.id().into_iter().collect();
        let mut queue: VecDeque<Observer> = source.outer_observers().into();
        let mut touched = 0;

        while let Some(outer) = queue.pop_front() {
            let Some(id) = outer.id() else {
                continue;
            };
            if !visited.insert(id) {
                continue;
            }

            visit(&outer);
            touched += 1;
            queue.extend(outer.outer_observers());
        }

        touched
    }
}
