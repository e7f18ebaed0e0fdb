//! Integer and byte digest mixers for building `EntryPolicy::hash`.
//!
//! None of these are called by the table itself. They are stateless and
//! deterministic across runs and platforms, which `RandomState` is not.

/// Thomas Wang's 64-bit integer hash.
#[inline]
pub fn hash64(key: u64) -> u64 {
    let mut k = (!key).wrapping_add(key << 21);
    k ^= k >> 24;
    k = k.wrapping_add(k << 3).wrapping_add(k << 8); // k * 265
    k ^= k >> 14;
    k = k.wrapping_add(k << 2).wrapping_add(k << 4); // k * 21
    k ^= k >> 28;
    k.wrapping_add(k << 31)
}

/// Bob Jenkins' six-shift 32-bit integer hash.
#[inline]
pub fn hash32(key: u32) -> u32 {
    let mut k = key.wrapping_add(0x7ed5_5d16).wrapping_add(key << 12);
    k = (k ^ 0xc761_c23c) ^ (k >> 19);
    k = k.wrapping_add(0x1656_67b1).wrapping_add(k << 5);
    k = k.wrapping_add(0xd3a2_646c) ^ (k << 9);
    k = k.wrapping_add(0xfd70_46c5).wrapping_add(k << 3);
    (k ^ 0xb55a_4f09) ^ (k >> 16)
}

/// Digest of a byte string: a multiplicative accumulator whose multiplier
/// evolves per byte, finished with [`hash32`].
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut a: u32 = 31415;
    let b: u32 = 27183;
    let mut h: u32 = 0;
    for &byte in bytes {
        h = a.wrapping_mul(h).wrapping_add(u32::from(byte));
        a = a.wrapping_mul(b);
    }
    hash32(h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
        std::iter::from_fn(move || {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            Some(s)
        })
    }

    /// Invariant: outputs are fixed functions of the input.
    #[test]
    fn known_vectors() {
        assert_eq!(hash32(0), 0x6b4e_d927);
        assert_eq!(hash32(1), 0xb486_81b6);
        assert_eq!(hash32(42), 0xc343_bb70);
        assert_eq!(hash32(0xdead_beef), 0x7ff0_eada);

        assert_eq!(hash64(0), 0x77cf_a1ee_f01b_ca90);
        assert_eq!(hash64(1), 0x5bca_7c69_b794_f8ce);
        assert_eq!(hash64(42), 0x0f3d_b82f_1e7b_6f7a);

        assert_eq!(hash_bytes(b""), hash32(0));
        assert_eq!(hash_bytes(b"a"), 0x2d1e_ff97);
        assert_eq!(hash_bytes(b"hello"), 0x9257_d246);
    }

    #[test]
    fn repeated_calls_agree() {
        for x in lcg(3).take(1_000) {
            assert_eq!(hash64(x), hash64(x));
            assert_eq!(hash32(x as u32), hash32(x as u32));
            let bytes = x.to_le_bytes();
            assert_eq!(hash_bytes(&bytes), hash_bytes(&bytes));
        }
    }

    /// Invariant: flipping one input bit flips about half the output bits
    /// on average.
    #[test]
    fn single_bit_flips_avalanche() {
        let mut flipped32 = 0u64;
        let mut flipped64 = 0u64;
        let mut flipped_bytes = 0u64;
        let samples = 500u64;

        for x in lcg(17).take(samples as usize) {
            let x32 = x as u32;
            for bit in 0..32 {
                flipped32 += u64::from((hash32(x32) ^ hash32(x32 ^ (1 << bit))).count_ones());
            }
            for bit in 0..64 {
                flipped64 += u64::from((hash64(x) ^ hash64(x ^ (1 << bit))).count_ones());
            }
            let bytes = x.to_le_bytes();
            for bit in 0..64 {
                let mut other = bytes;
                other[bit / 8] ^= 1 << (bit % 8);
                flipped_bytes +=
                    u64::from((hash_bytes(&bytes) ^ hash_bytes(&other)).count_ones());
            }
        }

        let avg32 = flipped32 as f64 / (samples * 32) as f64;
        let avg64 = flipped64 as f64 / (samples * 64) as f64;
        let avg_bytes = flipped_bytes as f64 / (samples * 64) as f64;
        assert!((13.0..19.0).contains(&avg32), "hash32 avalanche {avg32}");
        assert!((27.0..37.0).contains(&avg64), "hash64 avalanche {avg64}");
        assert!((13.0..19.0).contains(&avg_bytes), "hash_bytes avalanche {avg_bytes}");
    }
}
