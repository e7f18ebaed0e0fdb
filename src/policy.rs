//! Entry policies: how a table hashes, compares and releases its entries.

use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Caller-supplied behavior for a [`ChainedTable`](crate::ChainedTable).
///
/// `hash` must be a pure function of the fields `equal` looks at, and
/// `equal(a, b)` must imply `hash(a) == hash(b)`. `release` runs exactly
/// once for every entry the table gives up on its own (replace, delete,
/// clear, drop); entries handed back through `replace`/`remove` skip it.
pub trait EntryPolicy<T> {
    fn hash(&self, entry: &T) -> u32;

    fn equal(&self, a: &T, b: &T) -> bool;

    fn release(&self, entry: T) {
        drop(entry);
    }
}

/// Policy assembled from closures.
///
/// ```
/// use chained_table::{ChainedTable, FnPolicy};
///
/// struct Node { id: u32, name: &'static str }
///
/// let policy = FnPolicy::new(
///     |n: &Node| chained_table::mix::hash32(n.id),
///     |a: &Node, b: &Node| a.id == b.id,
/// );
/// let mut table = ChainedTable::with_policy(policy);
/// table.set(Node { id: 7, name: "seven" });
/// assert_eq!(table.get(&Node { id: 7, name: "" }).map(|n| n.name), Some("seven"));
/// ```
#[derive(Clone)]
pub struct FnPolicy<H, E, R> {
    hash: H,
    equal: E,
    release: R,
}

impl<H, E> FnPolicy<H, E, ()> {
    /// Release is a plain drop until [`with_release`](Self::with_release)
    /// installs a hook.
    pub fn new<T>(hash: H, equal: E) -> FnPolicy<H, E, fn(T)>
    where
        H: Fn(&T) -> u32,
        E: Fn(&T, &T) -> bool,
    {
        FnPolicy {
            hash,
            equal,
            release: drop::<T>,
        }
    }
}

impl<H, E, R> FnPolicy<H, E, R> {
    pub fn with_release<T, R2>(self, release: R2) -> FnPolicy<H, E, R2>
    where
        R2: Fn(T),
    {
        FnPolicy {
            hash: self.hash,
            equal: self.equal,
            release,
        }
    }
}

impl<T, H, E, R> EntryPolicy<T> for FnPolicy<H, E, R>
where
    H: Fn(&T) -> u32,
    E: Fn(&T, &T) -> bool,
    R: Fn(T),
{
    #[inline]
    fn hash(&self, entry: &T) -> u32 {
        (self.hash)(entry)
    }

    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        (self.equal)(a, b)
    }

    #[inline]
    fn release(&self, entry: T) {
        (self.release)(entry)
    }
}

impl<H, E, R> fmt::Debug for FnPolicy<H, E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPolicy").finish_non_exhaustive()
    }
}

/// Policy for `T: Hash + Eq`: the 64-bit `BuildHasher` output folded to
/// 32 bits, and `==`.
#[derive(Clone, Debug, Default)]
pub struct StdPolicy<S = DefaultHashBuilder> {
    hasher: S,
}

impl StdPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> StdPolicy<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self { hasher }
    }
}

impl<T, S> EntryPolicy<T> for StdPolicy<S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, entry: &T) -> u32 {
        let h = self.hasher.hash_one(entry);
        (h ^ (h >> 32)) as u32
    }

    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        a == b
    }
}
