//! Bucket chains: entry storage, bucket heads, and the chain walk.
//!
//! Entries live in a `SlotMap`; a chain link is the generational key of the
//! next node. Keys survive rehashing, so handles handed out by the table
//! stay valid while only bucket heads and `next` links move. Nothing in
//! this module calls into caller code except the predicate given to
//! [`Chains::locate`].

use crate::primes;
use slotmap::{DefaultKey, SlotMap};
use std::collections::TryReserveError;
use tracing::Level;

#[derive(Debug)]
pub(crate) struct Node<T> {
    /// Cached `EntryPolicy::hash` of `entry`, computed once on insert.
    pub(crate) digest: u32,
    next: Option<DefaultKey>,
    pub(crate) entry: T,
}

/// Where a chain walk stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Locus {
    /// `at` matched. `prev` is its predecessor, `None` when `at` heads the
    /// bucket.
    Found {
        prev: Option<DefaultKey>,
        at: DefaultKey,
    },
    /// No match. `tail` is the last node walked, `None` for an empty bucket.
    Vacant { tail: Option<DefaultKey> },
}

pub(crate) struct Chains<T> {
    slots: SlotMap<DefaultKey, Node<T>>,
    buckets: Vec<Option<DefaultKey>>,
    tier: usize,
    ceiling: usize,
    ceiling_logged: bool,
}

fn alloc_buckets(len: usize) -> Vec<Option<DefaultKey>> {
    vec![None; len]
}

fn try_alloc_buckets(len: usize) -> Result<Vec<Option<DefaultKey>>, TryReserveError> {
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(len)?;
    buckets.resize(len, None);
    Ok(buckets)
}

impl<T> Chains<T> {
    pub(crate) fn new(tier: usize) -> Self {
        Self::from_buckets(tier, alloc_buckets(primes::bucket_count(tier)))
    }

    pub(crate) fn try_new(tier: usize) -> Result<Self, TryReserveError> {
        Ok(Self::from_buckets(
            tier,
            try_alloc_buckets(primes::bucket_count(tier))?,
        ))
    }

    fn from_buckets(tier: usize, buckets: Vec<Option<DefaultKey>>) -> Self {
        Self {
            slots: SlotMap::with_key(),
            buckets,
            tier,
            ceiling: primes::LAST_TIER,
            ceiling_logged: false,
        }
    }

    /// Caps growth below the real prime ceiling so ceiling behavior is
    /// testable without a multi-gigabyte bucket array.
    #[cfg(test)]
    pub(crate) fn with_ceiling(tier: usize, ceiling: usize) -> Self {
        assert!(tier <= ceiling && ceiling <= primes::LAST_TIER);
        Self {
            ceiling,
            ..Self::new(tier)
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, digest: u32) -> usize {
        digest as usize % self.buckets.len()
    }

    /// Walk the chain `digest` maps to, stopping at the first node whose
    /// cached digest equals `digest` and whose entry satisfies `eq`.
    pub(crate) fn locate(&self, digest: u32, mut eq: impl FnMut(&T) -> bool) -> Locus {
        let mut prev = None;
        let mut cursor = self.buckets[self.bucket_of(digest)];
        while let Some(k) = cursor {
            let node = &self.slots[k];
            if node.digest == digest && eq(&node.entry) {
                return Locus::Found { prev, at: k };
            }
            prev = Some(k);
            cursor = node.next;
        }
        Locus::Vacant { tail: prev }
    }

    pub(crate) fn get(&self, k: DefaultKey) -> Option<&Node<T>> {
        self.slots.get(k)
    }

    pub(crate) fn get_mut(&mut self, k: DefaultKey) -> Option<&mut Node<T>> {
        self.slots.get_mut(k)
    }

    /// Point `prev.next` (or the head of `digest`'s bucket) at `to`.
    fn relink(&mut self, prev: Option<DefaultKey>, digest: u32, to: Option<DefaultKey>) {
        match prev {
            Some(p) => self.slots[p].next = to,
            None => {
                let b = self.bucket_of(digest);
                self.buckets[b] = to;
            }
        }
    }

    /// Append a new node after `tail`, as reported by a `Vacant` locus for
    /// the same digest at the current bucket count.
    pub(crate) fn link(&mut self, tail: Option<DefaultKey>, digest: u32, entry: T) -> DefaultKey {
        let k = self.slots.insert(Node {
            digest,
            next: None,
            entry,
        });
        self.relink(tail, digest, Some(k));
        k
    }

    /// Put `entry` in `at`'s chain position and unlink `at`. The new node
    /// gets a fresh key; `at` goes stale.
    pub(crate) fn splice(&mut self, prev: Option<DefaultKey>, at: DefaultKey, entry: T) -> (DefaultKey, T) {
        let (digest, next) = {
            let old = &self.slots[at];
            (old.digest, old.next)
        };
        let k = self.slots.insert(Node { digest, next, entry });
        self.relink(prev, digest, Some(k));
        let old = self
            .slots
            .remove(at)
            .expect("spliced-out node must be live");
        (k, old.entry)
    }

    pub(crate) fn unlink(&mut self, prev: Option<DefaultKey>, at: DefaultKey) -> T {
        let node = self
            .slots
            .remove(at)
            .expect("unlinked node must be live");
        self.relink(prev, node.digest, node.next);
        node.entry
    }

    #[inline]
    pub(crate) fn needs_growth(&self) -> bool {
        self.slots.len() >= self.buckets.len()
    }

    /// Rehash into the next tier. At the ceiling this does nothing and
    /// returns false.
    pub(crate) fn grow(&mut self) -> bool {
        match primes::next_tier(self.tier).filter(|&t| t <= self.ceiling) {
            Some(tier) => {
                self.rehash_into(tier, alloc_buckets(primes::bucket_count(tier)));
                true
            }
            None => {
                self.note_ceiling();
                false
            }
        }
    }

    /// Smallest tier holding `len` entries at load factor 1, capped at the
    /// ceiling and never below the current tier.
    pub(crate) fn tier_for_len(&self, len: usize) -> usize {
        primes::tier_for(len).min(self.ceiling).max(self.tier)
    }

    pub(crate) fn grow_to(&mut self, tier: usize) {
        if tier > self.tier {
            self.rehash_into(tier, alloc_buckets(primes::bucket_count(tier)));
        }
    }

    /// As [`grow_to`](Self::grow_to), but a failed allocation leaves the
    /// chains untouched.
    pub(crate) fn try_grow_to(&mut self, tier: usize) -> Result<(), TryReserveError> {
        if tier > self.tier {
            let buckets = try_alloc_buckets(primes::bucket_count(tier))?;
            self.rehash_into(tier, buckets);
        }
        Ok(())
    }

    pub(crate) fn reserve_slots(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    // Relinks by cached digest only. Each node is pushed at the head of its
    // new chain, so chain order is not preserved.
    fn rehash_into(&mut self, tier: usize, mut buckets: Vec<Option<DefaultKey>>) {
        let n = buckets.len();
        let old = std::mem::take(&mut self.buckets);
        let from = old.len();
        for head in old {
            let mut cursor = head;
            while let Some(k) = cursor {
                let node = &mut self.slots[k];
                cursor = node.next;
                let b = node.digest as usize % n;
                node.next = buckets[b];
                buckets[b] = Some(k);
            }
        }
        self.buckets = buckets;
        self.tier = tier;

        if tracing::enabled!(Level::DEBUG) {
            tracing::debug!(from, to = n, entries = self.slots.len(), "rehash");
        }
    }

    fn note_ceiling(&mut self) {
        if !self.ceiling_logged {
            self.ceiling_logged = true;
            tracing::warn!(
                buckets = self.buckets.len(),
                entries = self.slots.len(),
                "bucket count at its ceiling; chains will grow past load factor 1"
            );
        }
    }

    /// Empty every bucket and hand back the entries. Buckets are reset
    /// before the first entry is yielded. Slot generations are kept so
    /// handles from before the drain stay stale.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.buckets.fill(None);
        self.slots.drain().map(|(_, node)| node.entry)
    }

    pub(crate) fn iter(&self) -> slotmap::basic::Iter<'_, DefaultKey, Node<T>> {
        self.slots.iter()
    }

    /// Walk every chain and check the structural invariants: each node
    /// sits in the bucket its digest maps to, no node is reachable twice,
    /// and the reachable count equals `len`.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut seen = std::collections::HashSet::new();
        for (b, head) in self.buckets.iter().enumerate() {
            let mut cursor = *head;
            while let Some(k) = cursor {
                let node = self.slots.get(k).expect("chain link to a dead slot");
                assert_eq!(node.digest as usize % self.buckets.len(), b, "node in wrong bucket");
                assert!(seen.insert(k), "node reachable twice");
                cursor = node.next;
            }
        }
        assert_eq!(seen.len(), self.slots.len(), "reachable count != len");
        assert_eq!(self.buckets.len(), primes::bucket_count(self.tier));
    }

    #[cfg(test)]
    pub(crate) fn chain_digests(&self, digest: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cursor = self.buckets[self.bucket_of(digest)];
        while let Some(k) = cursor {
            out.push(self.slots[k].digest);
            cursor = self.slots[k].next;
        }
        out
    }
}
