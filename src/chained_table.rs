//! ChainedTable: the public table over bucket chains.

use crate::chain::{Chains, Locus, Node};
use crate::error::TableError;
use crate::policy::{EntryPolicy, StdPolicy};
use crate::primes;
use crate::reentrancy::Fence;
use core::fmt;
use core::hash::Hash;
use slotmap::DefaultKey;
use tracing::Level;

/// Generational reference to a stored entry.
///
/// Survives rehashing. Goes stale once its entry is replaced, deleted,
/// removed or cleared, and never resolves to a later entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn entry<'a, T, P>(&self, table: &'a ChainedTable<T, P>) -> Option<&'a T>
    where
        P: EntryPolicy<T>,
    {
        table.handle_entry(*self)
    }

    /// The digest cached for this entry when it was inserted.
    pub fn digest<T, P>(&self, table: &ChainedTable<T, P>) -> Option<u32>
    where
        P: EntryPolicy<T>,
    {
        table.chains.get(self.0).map(|n| n.digest)
    }
}

/// A chained hash table storing `T` by the digest its policy computes.
///
/// Entries equal under the policy replace each other. Buckets grow through
/// a fixed prime sequence whenever the entry count reaches the bucket
/// count, up to [`PRIMES`](crate::primes::PRIMES)' last entry; past that
/// chains just lengthen.
pub struct ChainedTable<T, P = StdPolicy>
where
    P: EntryPolicy<T>,
{
    policy: P,
    chains: Chains<T>,
    fence: Fence,
}

impl<T> ChainedTable<T>
where
    T: Hash + Eq,
{
    pub fn new() -> Self {
        Self::with_policy(StdPolicy::new())
    }
}

impl<T> Default for ChainedTable<T>
where
    T: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(Handle, &T)` in no particular order.
pub struct Iter<'a, T> {
    it: slotmap::basic::Iter<'a, DefaultKey, Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, n)| (Handle(k), &n.entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T, P> ChainedTable<T, P>
where
    P: EntryPolicy<T>,
{
    /// Empty table with the smallest bucket count (5).
    pub fn with_policy(policy: P) -> Self {
        Self::from_parts(policy, Chains::new(0))
    }

    /// Empty table starting at the smallest prime bucket count that is at
    /// least `min_buckets`. Aborts if the bucket array cannot be allocated.
    pub fn with_capacity_and_policy(min_buckets: usize, policy: P) -> Self {
        Self::from_parts(policy, Chains::new(primes::tier_for(min_buckets)))
    }

    pub fn try_with_capacity_and_policy(min_buckets: usize, policy: P) -> Result<Self, TableError> {
        let tier = primes::tier_for(min_buckets);
        let chains = Chains::try_new(tier).map_err(|source| TableError::BucketAlloc {
            buckets: primes::bucket_count(tier),
            source,
        })?;
        Ok(Self::from_parts(policy, chains))
    }

    fn from_parts(policy: P, chains: Chains<T>) -> Self {
        Self {
            policy,
            chains,
            fence: Fence::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_ceiling(policy: P, ceiling: usize) -> Self {
        Self::from_parts(policy, Chains::with_ceiling(0, ceiling))
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.len() == 0
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.chains.bucket_count()
    }

    /// Insert `entry`, releasing any stored entry equal to it.
    ///
    /// The replacement takes the old entry's chain position. Returns the
    /// handle of the newly stored entry.
    pub fn set(&mut self, entry: T) -> Handle {
        let (handle, displaced) = self.put(entry, "set");
        if let Some(old) = displaced {
            self.policy.release(old);
        }
        handle
    }

    /// As [`set`](Self::set), but the displaced entry is returned instead
    /// of released.
    pub fn replace(&mut self, entry: T) -> (Handle, Option<T>) {
        self.put(entry, "replace")
    }

    fn put(&mut self, entry: T, op: &'static str) -> (Handle, Option<T>) {
        let _g = self.fence.enter(op);
        let digest = self.policy.hash(&entry);
        if self.chains.needs_growth() {
            self.chains.grow();
        }
        let policy = &self.policy;
        let locus = self
            .chains
            .locate(digest, |stored| policy.equal(stored, &entry));
        match locus {
            Locus::Vacant { tail } => (Handle(self.chains.link(tail, digest, entry)), None),
            Locus::Found { prev, at } => {
                let (k, old) = self.chains.splice(prev, at, entry);
                (Handle(k), Some(old))
            }
        }
    }

    // The query is only read; its digest is computed into a local.
    fn locate(&self, query: &T, op: &'static str) -> Locus {
        let _g = self.fence.enter(op);
        let digest = self.policy.hash(query);
        self.chains
            .locate(digest, |stored| self.policy.equal(stored, query))
    }

    pub fn get(&self, query: &T) -> Option<&T> {
        match self.locate(query, "get") {
            Locus::Found { at, .. } => self.chains.get(at).map(|n| &n.entry),
            Locus::Vacant { .. } => None,
        }
    }

    /// Mutable access to a stored entry.
    ///
    /// Fields read by the policy's `hash` or `equal` must not change: the
    /// entry stays in the bucket of its cached digest and would no longer
    /// be found.
    pub fn get_mut(&mut self, query: &T) -> Option<&mut T> {
        match self.locate(query, "get_mut") {
            Locus::Found { at, .. } => self.chains.get_mut(at).map(|n| &mut n.entry),
            Locus::Vacant { .. } => None,
        }
    }

    pub fn find(&self, query: &T) -> Option<Handle> {
        match self.locate(query, "find") {
            Locus::Found { at, .. } => Some(Handle(at)),
            Locus::Vacant { .. } => None,
        }
    }

    pub fn contains(&self, query: &T) -> bool {
        matches!(self.locate(query, "contains"), Locus::Found { .. })
    }

    /// Look up by a precomputed digest and a predicate, without building a
    /// query entry. `digest` must be what the policy's `hash` returns for
    /// the wanted entry; `pred` only sees entries with that digest.
    pub fn find_with<F>(&self, digest: u32, pred: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        let _g = self.fence.enter("find_with");
        match self.chains.locate(digest, pred) {
            Locus::Found { at, .. } => self.chains.get(at).map(|n| &n.entry),
            Locus::Vacant { .. } => None,
        }
    }

    /// Unlink and release the entry equal to `query`. Returns whether one
    /// was found.
    pub fn delete(&mut self, query: &T) -> bool {
        match self.take(query, "delete") {
            Some(old) => {
                self.policy.release(old);
                true
            }
            None => false,
        }
    }

    /// Unlink the entry equal to `query` and hand it back unreleased.
    pub fn remove(&mut self, query: &T) -> Option<T> {
        self.take(query, "remove")
    }

    fn take(&mut self, query: &T, op: &'static str) -> Option<T> {
        match self.locate(query, op) {
            Locus::Found { prev, at } => Some(self.chains.unlink(prev, at)),
            Locus::Vacant { .. } => None,
        }
    }

    /// Release every entry. The bucket count is kept.
    pub fn clear(&mut self) {
        if tracing::enabled!(Level::TRACE) {
            tracing::trace!(entries = self.len(), buckets = self.capacity(), "clear");
        }
        let policy = &self.policy;
        for entry in self.chains.drain() {
            policy.release(entry);
        }
    }

    /// Release every entry and free the bucket array. Same as dropping the
    /// table.
    pub fn deinit(self) {
        drop(self);
    }

    /// Grow so that `additional` more entries fit without another rehash,
    /// capped at the largest bucket count.
    pub fn reserve(&mut self, additional: usize) {
        let tier = self
            .chains
            .tier_for_len(self.len().saturating_add(additional));
        self.chains.grow_to(tier);
        self.chains.reserve_slots(additional);
    }

    /// As [`reserve`](Self::reserve) for the bucket array, reporting an
    /// allocation failure instead of aborting. On error the table is
    /// unchanged.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let tier = self
            .chains
            .tier_for_len(self.len().saturating_add(additional));
        self.chains
            .try_grow_to(tier)
            .map_err(|source| TableError::BucketAlloc {
                buckets: primes::bucket_count(tier),
                source,
            })
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.chains.iter(),
        }
    }

    pub(crate) fn handle_entry(&self, h: Handle) -> Option<&T> {
        self.chains.get(h.0).map(|n| &n.entry)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.chains.check_invariants();
    }
}

impl<T, P> Drop for ChainedTable<T, P>
where
    P: EntryPolicy<T>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, P> Extend<T> for ChainedTable<T, P>
where
    P: EntryPolicy<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for entry in iter {
            self.set(entry);
        }
    }
}

impl<'a, T, P> IntoIterator for &'a ChainedTable<T, P>
where
    P: EntryPolicy<T>,
{
    type Item = (Handle, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, P> fmt::Debug for ChainedTable<T, P>
where
    T: fmt::Debug,
    P: EntryPolicy<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedTable")
            .field("len", &self.len())
            .field("buckets", &self.capacity())
            .field("entries", &self.iter().map(|(_, e)| e).collect::<Vec<_>>())
            .finish()
    }
}
