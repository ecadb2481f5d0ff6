//! Per-party ledger storage for the Accord protocol.
//!
//! A [`vault::Vault`] stores agreement states, consumption marks, and
//! committed records over any [`traits::KvStore`] backend. Superseded
//! states are marked consumed but never deleted; they remain as
//! history.

pub mod error;
pub mod memory;
pub mod traits;
pub mod vault;
