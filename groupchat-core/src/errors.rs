//! Error types for `groupchat-core`.

use thiserror::Error;

/// Failures from the crypto core (key exchange, symmetric layer).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Ciphertext was not valid lowercase hex, so it cannot have been
    /// produced by [`crate::cipher::encrypt`].
    #[error("ciphertext is not valid hex")]
    InvalidHex(#[from] hex::FromHexError),

    /// Hex decoded fine but the payload is shorter than a nonce, or
    /// authentication under the derived key failed.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Decrypted plaintext was not valid UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The participant's own identifier was not found in the ordered
    /// members list supplied by the server.
    #[error("own username {0:?} not present in group members list")]
    SelfNotInGroup(String),

    /// The Round 2 intermediate-values list did not carry an entry for
    /// every member of the group the participant currently knows about.
    #[error("round 2 intermediate values list is missing entries")]
    IncompleteIntermediateValues,
}
