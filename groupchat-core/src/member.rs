//! The public identity of one group chat participant.

use serde::{Deserialize, Serialize};

/// Public identity of one participant within an active group. Unique by
/// `username` within the group; order within the enclosing `Vec<GroupMember>`
/// defines ring neighbors for the Burmester-Desmedt protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub username: String,
    #[serde(rename = "publicKey")]
    pub public_key: u64,
}

impl GroupMember {
    pub fn new(username: impl Into<String>, public_key: u64) -> Self {
        Self {
            username: username.into(),
            public_key,
        }
    }
}
