//! Number-Theoretic Transform in ZZ_q.

mod native;

pub use native::NttOperator;

/// Returns whether a modulus p is prime and supports the Number Theoretic
/// Transform of size n.
///
/// Aborts if n is not a power of 2 that is >= 8.
pub fn supports_ntt(p: u64, n: usize) -> bool {
    assert!(n >= 8 && n.is_power_of_two());

    p % ((n as u64) << 1) == 1 && dbfv_util::is_prime(p)
}

#[cfg(test)]
mod tests {
    use super::supports_ntt;

    #[test]
    fn supports() {
        assert!(supports_ntt(1153, 8));
        assert!(supports_ntt(1153, 64));
        assert!(!supports_ntt(1153, 128));
        assert!(supports_ntt(36028797018652673, 4096));
        assert!(!supports_ntt(36028797018652673, 16384));
        // 1 mod 16, but not prime.
        assert!(!supports_ntt(1153 * 17, 8));
    }
}
