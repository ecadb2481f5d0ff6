use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// 32-byte BLAKE3 hash.
pub type Hash = [u8; 32];

/// 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// 20-byte party identifier derived from BLAKE3(pubkey)[0..20].
pub type PartyId = [u8; 20];

/// Unique identifier for a transition — BLAKE3 hash of all fields
/// except the collected endorsements.
pub type TransitionId = Hash;

/// Random discriminator that makes otherwise-identical Issue
/// transitions distinct.
pub type Nonce = u64;

/// Serde helper for [u8; 64] fields.
pub mod serde_sig {
    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 64], D::Error>
    where
        D: Deserializer<'de>,
    {
        let v: Vec<u8> = Vec::deserialize(deserializer)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("expected 64 bytes for signature"))
    }
}

/// A reference to the agreement state produced by a committed
/// transition. Exactly one state is produced per transition, so the
/// transition id alone identifies it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct StateRef {
    /// The transition that produced the referenced state.
    pub transition_id: TransitionId,
}
