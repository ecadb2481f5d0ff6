//! Shared value types for the Accord bilateral-agreement protocol.
//!
//! Defines the ledger state ([`agreement::Agreement`]), the proposed
//! state change ([`transition::Transition`]), the handshake wire
//! messages, and the protocol-wide error taxonomy.

pub mod agreement;
pub mod error;
pub mod message;
pub mod primitives;
pub mod transition;
