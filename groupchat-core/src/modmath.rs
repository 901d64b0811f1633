//! Modular arithmetic primitives used by the key exchange.

/// Square-and-multiply modular exponentiation. Uses a `u128` accumulator so
/// the product of two `u64` operands never overflows before reduction.
pub fn mod_exp(base: u64, exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }

    let mut result: u128 = 1;
    let mut base = (base as u128) % (modulus as u128);
    let mut exp = exp;
    let modulus = modulus as u128;

    while exp > 0 {
        if exp & 1 == 1 {
            result = (result * base) % modulus;
        }
        base = (base * base) % modulus;
        exp >>= 1;
    }

    result as u64
}

/// Modular inverse of `n` mod the prime `p`, via Fermat's little theorem:
/// `n^(p-2) mod p`. Requires `p` prime and `n` not a multiple of `p`.
pub fn mod_inverse(n: u64, p: u64) -> u64 {
    mod_exp(n, p - 2, p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::P;

    fn naive_mod_pow(base: u64, exp: u64, modulus: u64) -> u64 {
        let mut acc: u128 = 1;
        let base = base as u128 % modulus as u128;
        for _ in 0..exp {
            acc = (acc * base) % modulus as u128;
        }
        acc as u64
    }

    #[test]
    fn mod_exp_matches_naive_pow_for_small_exponents() {
        for base in [0u64, 1, 2, 3, 5, 17, 4294967295] {
            for exp in [0u64, 1, 2, 3, 10, 97] {
                assert_eq!(
                    mod_exp(base, exp, P),
                    naive_mod_pow(base, exp, P),
                    "base={base} exp={exp}"
                );
            }
        }
    }

    #[test]
    fn mod_exp_zero_exponent_is_one() {
        assert_eq!(mod_exp(12345, 0, P), 1);
    }

    #[test]
    fn mod_exp_never_overflows_near_u64_max() {
        let big = u64::MAX / 3;
        let r = mod_exp(big, big, P);
        assert!(r < P);
    }

    #[test]
    fn mod_inverse_is_correct_for_many_n() {
        for n in [1u64, 2, 3, 7, 12345, 999_999_937, P - 1] {
            let inv = mod_inverse(n, P);
            let product = ((n as u128 * inv as u128) % P as u128) as u64;
            assert_eq!(product, 1, "n={n}");
        }
    }
}
