//! Client-side crypto and membership state, kept distinct from the
//! socket/UI plumbing around it, the way the network layer never reaches
//! directly into key-agreement internals.

use std::sync::Mutex;

use groupchat_core::{bd, keys, CoreError, GroupMember};

/// Everything a client needs to know about itself and the current group to
/// take part in the key exchange and to encrypt/decrypt group messages.
pub struct ParticipantState {
    pub username: String,
    private_key: u64,
    pub public_key: u64,
    pub members: Vec<GroupMember>,
    pub shared_secret: Option<u64>,
    round1_value: Option<u64>,
    established: bool,
}

impl ParticipantState {
    pub fn new(username: impl Into<String>) -> Self {
        let private_key = keys::gen_private();
        let public_key = keys::gen_public(private_key);
        Self {
            username: username.into(),
            private_key,
            public_key,
            members: Vec::new(),
            shared_secret: None,
            round1_value: None,
            established: false,
        }
    }

    pub fn set_members(&mut self, members: Vec<GroupMember>) {
        self.members = members;
        self.shared_secret = None;
        self.round1_value = None;
        self.established = false;
    }

    fn my_index(&self) -> Option<usize> {
        self.members.iter().position(|m| m.username == self.username)
    }

    /// Computes this participant's round-1 intermediate value against the
    /// current members list.
    pub fn compute_round1_value(&mut self) -> Result<u64, CoreError> {
        let n = self.members.len();
        let my_index = self
            .my_index()
            .ok_or_else(|| CoreError::SelfNotInGroup(self.username.clone()))?;
        let z_before = self.members[(my_index + n - 1) % n].public_key;
        let z_after = self.members[(my_index + 1) % n].public_key;
        let value = bd::intermediate_value(self.private_key, z_before, z_after);
        self.round1_value = Some(value);
        Ok(value)
    }

    /// Derives the shared secret once round 2's intermediate values arrive.
    /// `intermediate_values` must already be aligned index-for-index with
    /// `self.members` -- callers reconstruct this alignment by username,
    /// since the server's round-2 list order is not guaranteed to match.
    pub fn compute_shared_secret(&mut self, intermediate_values: &[u64]) -> Result<u64, CoreError> {
        if intermediate_values.len() != self.members.len() {
            return Err(CoreError::IncompleteIntermediateValues);
        }
        let my_index = self
            .my_index()
            .ok_or_else(|| CoreError::SelfNotInGroup(self.username.clone()))?;
        let secret = bd::shared_secret(self.private_key, my_index, &self.members, intermediate_values);
        self.shared_secret = Some(secret);
        Ok(secret)
    }

    /// Drops the shared secret and round-1 scratch value; called whenever
    /// the server announces a restarted epoch.
    pub fn reset_key_material(&mut self) {
        self.shared_secret = None;
        self.round1_value = None;
        self.established = false;
    }

    /// Marks the current shared secret as belonging to a completed epoch.
    /// Called on `S2C_KEY_EXCHANGE_COMPLETED`; before this, a secret derived
    /// from round 2 is not yet valid for encrypting or decrypting traffic.
    pub fn mark_established(&mut self) {
        self.established = true;
    }

    /// Handles `S2C_INDIVIDUAL_KEY_RESET`: generates a fresh value and adopts
    /// it as a trivial "shared secret" so a solo participant can still
    /// encrypt its own monologue until the next epoch brings in a real
    /// group. The persistent DH keypair is untouched -- the server still
    /// has our public key on file for whenever the next real epoch starts.
    pub fn individual_key_reset(&mut self) {
        self.shared_secret = Some(keys::gen_private());
        self.round1_value = None;
        self.established = true;
    }

    /// The shared secret, if any, gated on the epoch having been confirmed
    /// complete. A secret derived from round 2 but not yet acknowledged by
    /// `S2C_KEY_EXCHANGE_COMPLETED` must not be used to encrypt or decrypt.
    pub fn established_secret(&self) -> Option<u64> {
        if self.established {
            self.shared_secret
        } else {
            None
        }
    }
}

/// Shared handle used by the reader and writer tasks, each of which only
/// ever holds the lock briefly.
pub type SharedParticipant = std::sync::Arc<Mutex<ParticipantState>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round1_value_requires_membership_in_the_list() {
        let mut state = ParticipantState::new("ghost");
        state.set_members(vec![
            GroupMember::new("alice", 10),
            GroupMember::new("bob", 20),
        ]);
        assert!(matches!(
            state.compute_round1_value(),
            Err(CoreError::SelfNotInGroup(_))
        ));
    }

    #[test]
    fn shared_secret_rejects_mismatched_intermediate_value_count() {
        let mut alice = ParticipantState::new("alice");
        alice.set_members(vec![
            GroupMember::new("alice", alice.public_key),
            GroupMember::new("bob", 20),
        ]);
        assert!(matches!(
            alice.compute_shared_secret(&[1]),
            Err(CoreError::IncompleteIntermediateValues)
        ));
    }

    #[test]
    fn two_party_round_trip_produces_matching_secrets() {
        let mut alice = ParticipantState::new("alice");
        let mut bob = ParticipantState::new("bob");
        let members = vec![
            GroupMember::new("alice", alice.public_key),
            GroupMember::new("bob", bob.public_key),
        ];
        alice.set_members(members.clone());
        bob.set_members(members);

        let a_value = alice.compute_round1_value().unwrap();
        let b_value = bob.compute_round1_value().unwrap();

        let alice_secret = alice.compute_shared_secret(&[a_value, b_value]).unwrap();
        let bob_secret = bob.compute_shared_secret(&[a_value, b_value]).unwrap();
        assert_eq!(alice_secret, bob_secret);
    }
}
