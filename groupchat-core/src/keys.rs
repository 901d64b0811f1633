//! Private/public key generation for one participant.

use rand::Rng;

use crate::modmath::mod_exp;
use crate::params::{G, P};

/// Draws a private key uniformly from `[2, P-1]` using a cryptographically
/// appropriate source (the thread-local CSPRNG).
pub fn gen_private() -> u64 {
    rand::thread_rng().gen_range(2..P)
}

/// Derives the public key `g^priv mod P`.
pub fn gen_public(private: u64) -> u64 {
    mod_exp(G, private, P)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_private_is_in_range() {
        for _ in 0..1000 {
            let k = gen_private();
            assert!(k >= 2 && k < P);
        }
    }

    #[test]
    fn gen_public_is_deterministic_in_private() {
        let priv_key = 12345;
        assert_eq!(gen_public(priv_key), gen_public(priv_key));
    }
}
