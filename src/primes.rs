//! Bucket counts a table may grow through, smallest first.
//!
//! Each count is a prime roughly double the one before it. The last entry
//! is the ceiling: a table that reaches it stops growing and its chains
//! simply get longer.

pub const PRIMES: [usize; 29] = [
    5, 13, 23, 53, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613,
    393241, 786433, 1572869, 3145739, 6291469, 12582917, 25165843, 50331653, 100663319,
    201326611, 402653189, 805306457, 1610612741,
];

/// Index of the largest tier.
pub const LAST_TIER: usize = PRIMES.len() - 1;

#[inline]
pub fn bucket_count(tier: usize) -> usize {
    PRIMES[tier]
}

/// The tier after `tier`, or `None` at the ceiling.
#[inline]
pub fn next_tier(tier: usize) -> Option<usize> {
    (tier < LAST_TIER).then_some(tier + 1)
}

/// First tier with at least `min_buckets` buckets, saturating at the
/// ceiling.
pub fn tier_for(min_buckets: usize) -> usize {
    PRIMES.partition_point(|&p| p < min_buckets).min(LAST_TIER)
}
