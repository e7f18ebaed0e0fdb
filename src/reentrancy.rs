//! Debug-only fence against reentrant table calls.
//!
//! A table runs caller code (`EntryPolicy::hash`/`equal`) while a chain can
//! be half linked. Each table operation holds the fence for that window; in
//! debug builds a nested entry panics and names both operations. In release
//! builds the fence is a zero-sized no-op.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct Fence {
    #[cfg(debug_assertions)]
    holder: Cell<Option<&'static str>>,
    // No internal synchronisation, so keep the fence !Sync.
    _unsync: PhantomData<Cell<()>>,
}

impl Fence {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            holder: Cell::new(None),
            _unsync: PhantomData,
        }
    }

    /// Hold the fence for `op` until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> FenceGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(running) = self.holder.get() {
                panic!("reentrant call to ChainedTable::{op} while ChainedTable::{running} is running");
            }
            self.holder.set(Some(op));
            FenceGuard { fence: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            FenceGuard { _fence: PhantomData }
        }
    }

    #[cfg(all(test, debug_assertions))]
    fn holder(&self) -> Option<&'static str> {
        self.holder.get()
    }
}

pub(crate) struct FenceGuard<'a> {
    #[cfg(debug_assertions)]
    fence: &'a Fence,
    #[cfg(not(debug_assertions))]
    _fence: PhantomData<&'a Fence>,
}

impl Drop for FenceGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.fence.holder.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::Fence;

    #[test]
    fn sequential_entries_are_fine() {
        let f = Fence::new();
        {
            let _g = f.enter("get");
        }
        let _g = f.enter("set");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn guard_drop_releases_the_fence() {
        let f = Fence::new();
        let g = f.enter("delete");
        assert_eq!(f.holder(), Some("delete"));
        drop(g);
        assert_eq!(f.holder(), None);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_naming_both_ops() {
        let f = Fence::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = f.enter("set");
            let _inner = f.enter("get");
        }));
        let err = res.expect_err("expected reentrancy to panic in debug builds");
        let msg = err
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("ChainedTable::get"), "{msg}");
        assert!(msg.contains("ChainedTable::set"), "{msg}");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_a_noop_in_release() {
        let f = Fence::new();
        let _g1 = f.enter("set");
        let _g2 = f.enter("get");
    }
}
