//! Cryptographic services for the Accord protocol: Ed25519 signing,
//! BLAKE3 content hashing, and party-identifier derivation.

pub mod hash;
pub mod keys;
pub mod party;
