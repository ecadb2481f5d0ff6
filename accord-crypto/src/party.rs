use accord_types::primitives::{PartyId, PublicKey};

use crate::hash::blake3_hash;

/// Derive a party identifier from a public key: the first 20 bytes of
/// BLAKE3(pubkey).
pub fn pubkey_to_party(pubkey: &PublicKey) -> PartyId {
    let digest = blake3_hash(pubkey);
    let mut party = [0u8; 20];
    party.copy_from_slice(&digest[0..20]);
    party
}
