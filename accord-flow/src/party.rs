use std::sync::Arc;

use accord_crypto::keys::Keypair;
use accord_crypto::party::pubkey_to_party;
use accord_ledger::traits::KvStore;
use accord_ledger::vault::Vault;
use accord_types::primitives::PartyId;

use crate::commit::CommitService;
use crate::handshake::Transport;

/// One party's service hub: its identity, vault, and handles to the
/// external collaborators the flows consume.
pub struct PartyNode<S: KvStore> {
    keypair: Arc<Keypair>,
    party_id: PartyId,
    vault: Arc<Vault<S>>,
    transport: Arc<dyn Transport>,
    notary: Arc<dyn CommitService>,
}

impl<S: KvStore> PartyNode<S> {
    /// Assemble a node from its keypair, vault, and service handles.
    pub fn new(
        keypair: Arc<Keypair>,
        vault: Arc<Vault<S>>,
        transport: Arc<dyn Transport>,
        notary: Arc<dyn CommitService>,
    ) -> Self {
        let party_id = pubkey_to_party(&keypair.public_key());
        Self {
            keypair,
            party_id,
            vault,
            transport,
            notary,
        }
    }

    /// This party's identifier.
    pub fn party_id(&self) -> PartyId {
        self.party_id
    }

    /// This party's signing keypair.
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// This party's ledger vault.
    pub fn vault(&self) -> &Vault<S> {
        &self.vault
    }

    /// The transport used to reach counterparties.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// The commit/consensus service designated for this party.
    pub fn notary(&self) -> &dyn CommitService {
        self.notary.as_ref()
    }
}
