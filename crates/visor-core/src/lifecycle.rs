// Retirement latch shared by every background loop.
//
// A multi-threaded runtime gives no "one event loop" serialization, so each
// delivery into subscriber state goes through this latch. `retire()` takes
// the same lock, so once it returns no delivery is running and none will
// start. Callbacks run with the lock held: they must not retire the latch
// they were delivered through.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How overlapping results of one loop are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ordering {
    /// Drop a result whose tick was issued before the latest applied one.
    #[default]
    LatestIssued,
    /// Apply every result as it arrives; a slow older tick may overwrite a
    /// newer value.
    ArrivalOrder,
}

#[derive(Debug, Default)]
struct LatchState {
    retired: bool,
    /// Generation of the newest applied result (generations start at 1).
    last_applied: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Liveness {
    inner: Arc<Mutex<LatchState>>,
}

impl Liveness {
    fn lock(&self) -> MutexGuard<'_, LatchState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn retire(&self) {
        self.lock().retired = true;
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.lock().retired
    }

    /// Run `f` unless retired.
    pub(crate) fn run_if_live<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let guard = self.lock();
        if guard.retired {
            return None;
        }
        let out = f();
        drop(guard);
        Some(out)
    }

    /// Apply the result of tick `generation`. Returns whether `apply` ran.
    pub(crate) fn deliver(&self, generation: u64, ordering: Ordering, apply: impl FnOnce()) -> bool {
        let mut guard = self.lock();
        if guard.retired {
            return false;
        }
        if ordering == Ordering::LatestIssued && generation < guard.last_applied {
            return false;
        }
        guard.last_applied = guard.last_applied.max(generation);
        apply();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retired_latch_rejects_everything() {
        let l = Liveness::default();
        l.retire();
        assert!(l.is_retired());
        assert_eq!(l.run_if_live(|| 1), None);
        assert!(!l.deliver(1, Ordering::ArrivalOrder, || unreachable!()));
    }

    #[test]
    fn latest_issued_discards_older_generation() {
        let l = Liveness::default();
        assert!(l.deliver(2, Ordering::LatestIssued, || {}));
        assert!(!l.deliver(1, Ordering::LatestIssued, || unreachable!()));
        assert!(l.deliver(3, Ordering::LatestIssued, || {}));
    }

    #[test]
    fn arrival_order_applies_older_generation() {
        let l = Liveness::default();
        assert!(l.deliver(2, Ordering::ArrivalOrder, || {}));
        assert!(l.deliver(1, Ordering::ArrivalOrder, || {}));
    }
}
