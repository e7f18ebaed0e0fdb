//! chained-table: a single-threaded chained hash table whose hashing,
//! equality and release behavior come from a caller-supplied policy.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a table that maps a caller record to itself by a 32-bit digest,
//!   with replace-on-equal insertion, lookup, deletion and growth through a
//!   fixed prime sequence of bucket counts.
//! - Layers:
//!   - `primes`: the bucket counts a table may take, smallest first.
//!   - `chain::Chains<T>`: entry storage in a `SlotMap`, one optional
//!     chain head per bucket, the chain walk (`locate`) and rehashing.
//!     Never calls caller code except the predicate passed to `locate`.
//!   - `ChainedTable<T, P>`: public API; computes digests with the policy,
//!     decides when to grow, and calls `release` for entries it gives up.
//!   - `mix`: standalone digest mixers for writing `EntryPolicy::hash`.
//!
//! Constraints
//! - Single-threaded: no locks or atomics; the table is `!Sync`.
//! - Equal entries never coexist; inserting an equal entry replaces the
//!   stored one in place in its chain.
//! - Growth happens on insert once `len >= capacity`, one prime tier at a
//!   time. Past the last prime the table stops growing and chains lengthen;
//!   that is logged once and never reported as an error.
//! - Bucket counts never shrink; `clear` keeps the current one.
//!
//! Ownership and release
//! - The table owns every stored `T`. `EntryPolicy::release` runs exactly
//!   once for each entry the table gives up on its own: the displaced
//!   entry of `set`, `delete`, `clear`, and drop. `replace` and `remove`
//!   return the entry instead and skip `release`.
//! - `release` always runs after the chains are consistent again, outside
//!   the reentrancy fence.
//!
//! Digest invariants
//! - Each node caches the digest computed on insert; rehashing relinks by
//!   the cached digest and never calls `hash`, `equal` or `release`.
//! - Lookups compute the query's digest into a local and never write to
//!   the query.
//! - Fields read by `hash`/`equal` must not change while stored. The table
//!   cannot detect this; the entry just becomes unreachable by lookup.
//!
//! Reentrancy
//! - Each operation that runs policy code holds a debug-only fence while it
//!   does. Re-entering the same table from `hash`/`equal` panics in debug
//!   builds; in release builds the fence compiles away.
//!
//! Handles
//! - `set`/`replace`/`find` return generational `Handle`s. They survive
//!   rehashes and go stale when their entry leaves the table; a stale
//!   handle never resolves to a later entry.
//!
//! Allocation failure
//! - `set`, `reserve` and the `with_*` constructors abort if the bucket
//!   array cannot be allocated. `try_reserve` and
//!   `try_with_capacity_and_policy` return `TableError` instead and leave
//!   the table untouched.

mod chain;
pub mod chained_table;
mod chained_table_proptest;
pub mod error;
pub mod mix;
pub mod policy;
pub mod primes;
mod reentrancy;

// Public surface
pub use chained_table::{ChainedTable, Handle, Iter};
pub use error::TableError;
pub use policy::{EntryPolicy, FnPolicy, StdPolicy};
