//! Burmester-Desmedt two-round group Diffie-Hellman.
//!
//! Participants are indexed `0..N` in the order given by the server's
//! `S2C_GROUP_MEMBERS_LIST`; "predecessor"/"successor" are that index minus
//! one / plus one, modulo `N`.

use crate::member::GroupMember;
use crate::modmath::{mod_exp, mod_inverse};
use crate::params::P;

/// Round 1 contribution: `X_i = (z_{i+1} * z_{i-1}^-1)^{k_i} mod P`.
pub fn intermediate_value(private: u64, z_before: u64, z_after: u64) -> u64 {
    let inv_before = mod_inverse(z_before, P);
    let base = ((z_after as u128 * inv_before as u128) % P as u128) as u64;
    mod_exp(base, private, P)
}

/// Round 2: the shared group secret, computed locally by participant
/// `my_index` from its own private key, its predecessor's public key, and
/// the ring of Round 1 intermediate values.
///
/// `intermediate_values` must be aligned index-for-index with
/// `ordered_members` (callers reconstruct this alignment by username before
/// calling in, since the server may not preserve submission order).
///
/// `K_i = z_{i-1}^{N*k_i} * X_i^{N-1} * X_{i+1}^{N-2} * ... * X_{i+N-2}^{1}`
pub fn shared_secret(
    private: u64,
    my_index: usize,
    ordered_members: &[GroupMember],
    intermediate_values: &[u64],
) -> u64 {
    let n = ordered_members.len();
    debug_assert_eq!(intermediate_values.len(), n);
    debug_assert!(n >= 2, "shared_secret requires a group of at least 2");

    let z_before = ordered_members[(my_index + n - 1) % n].public_key;
    let mut k = mod_exp(z_before, n as u64 * private, P);

    for j in 0..n - 1 {
        let idx = (my_index + j) % n;
        let exponent = (n - 1 - j) as u64;
        let term = mod_exp(intermediate_values[idx], exponent, P);
        k = ((k as u128 * term as u128) % P as u128) as u64;
    }

    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{gen_private, gen_public};

    /// Runs the full two-round protocol for `n` participants in-process and
    /// returns each participant's computed shared secret.
    fn run_protocol(n: usize) -> Vec<u64> {
        let privs: Vec<u64> = (0..n).map(|_| gen_private()).collect();
        let members: Vec<GroupMember> = privs
            .iter()
            .enumerate()
            .map(|(i, &k)| GroupMember::new(format!("user{i}"), gen_public(k)))
            .collect();

        let intermediates: Vec<u64> = (0..n)
            .map(|i| {
                let z_before = members[(i + n - 1) % n].public_key;
                let z_after = members[(i + 1) % n].public_key;
                intermediate_value(privs[i], z_before, z_after)
            })
            .collect();

        (0..n)
            .map(|i| shared_secret(privs[i], i, &members, &intermediates))
            .collect()
    }

    #[test]
    fn two_party_agreement() {
        let secrets = run_protocol(2);
        assert_eq!(secrets[0], secrets[1]);
    }

    #[test]
    fn three_party_agreement() {
        let secrets = run_protocol(3);
        assert_eq!(secrets[0], secrets[1]);
        assert_eq!(secrets[1], secrets[2]);
    }

    #[test]
    fn larger_group_agreement() {
        for n in 4..8 {
            let secrets = run_protocol(n);
            assert!(secrets.windows(2).all(|w| w[0] == w[1]), "n={n}");
        }
    }

    #[test]
    fn membership_change_changes_the_secret() {
        let secrets_before = run_protocol(3);
        let secrets_after = run_protocol(2);
        // Astronomically unlikely to collide for independently drawn keys.
        assert_ne!(secrets_before[0], secrets_after[0]);
    }
}
