//! The Accord bilateral-agreement protocol core.
//!
//! An agreement-modifying flow runs in four stages: the
//! [`builder::TransitionBuilder`] assembles a candidate transition,
//! the [`rules`] engine pre-checks it, the [`handshake`] collects the
//! counterparty's endorsement (the responder runs the same rule
//! engine on its side), and [`commit::finalize`] re-validates and
//! hands the fully-signed transition to the commit service.
//!
//! The [`local`] module provides in-process transport and notary
//! implementations for tests and simulation.

pub mod builder;
pub mod commit;
pub mod flows;
pub mod handshake;
pub mod local;
pub mod party;
pub mod rules;
