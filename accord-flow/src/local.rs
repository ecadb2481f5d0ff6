//! In-process implementations of the external collaborators: a
//! transport that dispatches directly to registered responders, and a
//! notary that enforces single-spend and writes every participant's
//! vault. Used by tests and local simulation; production deployments
//! substitute real services behind the same traits.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::debug;

use accord_crypto::keys::Keypair;
use accord_crypto::party::pubkey_to_party;
use accord_ledger::memory::MemoryStore;
use accord_ledger::traits::KvStore;
use accord_ledger::vault::Vault;
use accord_types::error::AccordError;
use accord_types::message::{SignatureRequest, SignatureResponse};
use accord_types::primitives::{PartyId, StateRef, TransitionId};
use accord_types::transition::{CommittedRecord, Transition};

use crate::commit::CommitService;
use crate::flows::partnership_responder;
use crate::handshake::{ResponderService, Transport};
use crate::party::PartyNode;

/// In-process notary: the commit/consensus collaborator for a set of
/// co-resident parties. Tracks consumed prior states and persists
/// committed transitions into every registered participant vault.
pub struct LocalNotary<S: KvStore> {
    party_id: PartyId,
    vaults: RwLock<HashMap<PartyId, Arc<Vault<S>>>>,
    consumed: Mutex<BTreeMap<StateRef, TransitionId>>,
}

impl<S: KvStore> LocalNotary<S> {
    /// Create a notary with a fresh identity.
    pub fn new() -> Self {
        let keypair = Keypair::generate();
        Self {
            party_id: pubkey_to_party(&keypair.public_key()),
            vaults: RwLock::new(HashMap::new()),
            consumed: Mutex::new(BTreeMap::new()),
        }
    }

    /// The notary's own identity.
    pub fn party_id(&self) -> PartyId {
        self.party_id
    }

    /// Register a party's vault for commit distribution.
    pub fn register_vault(&self, party: PartyId, vault: Arc<Vault<S>>) {
        if let Ok(mut vaults) = self.vaults.write() {
            vaults.insert(party, vault);
        }
    }
}

impl<S: KvStore> Default for LocalNotary<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S: KvStore> CommitService for LocalNotary<S> {
    async fn commit(&self, transition: Transition) -> Result<CommittedRecord, AccordError> {
        if !transition.is_fully_signed() {
            return Err(AccordError::Commit {
                reason: "transition is not fully signed".to_string(),
            });
        }

        let mut consumed = self.consumed.lock().map_err(|e| AccordError::Commit {
            reason: e.to_string(),
        })?;
        if let Some(prior) = &transition.prior {
            if consumed.contains_key(&prior.state_ref) {
                return Err(AccordError::Commit {
                    reason: "prior state already consumed".to_string(),
                });
            }
        }

        let record = CommittedRecord {
            transition,
            notary: self.party_id,
        };
        let new_ref = record.state_ref();

        // All checks passed; now distribute to every participant's
        // vault and record the consumption.
        let vaults = self.vaults.read().map_err(|e| AccordError::Commit {
            reason: e.to_string(),
        })?;
        for party in &record.transition.new_state.partners {
            if let Some(vault) = vaults.get(party) {
                vault.save_state(&new_ref, record.state())?;
                if let Some(prior) = &record.transition.prior {
                    vault.mark_consumed(&prior.state_ref, record.transition.id)?;
                }
                vault.save_record(&record)?;
            }
        }
        if let Some(prior) = &record.transition.prior {
            consumed.insert(prior.state_ref, record.transition.id);
        }

        debug!(id = ?record.transition.id, "notary committed transition");
        Ok(record)
    }
}

/// In-process transport: a registry of responder peers, dispatched to
/// directly. Delivery is trivially ordered and exactly-once. Also
/// stands in for identity resolution by owning the notary handle.
pub struct LocalNetwork<S: KvStore> {
    peers: RwLock<HashMap<PartyId, Arc<dyn ResponderService>>>,
    notary: Arc<LocalNotary<S>>,
}

impl<S: KvStore + 'static> LocalNetwork<S> {
    /// Create a network with its own notary.
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            notary: Arc::new(LocalNotary::new()),
        }
    }

    /// Resolve the notary designated for commits on this network.
    pub fn resolve_notary(&self) -> Arc<LocalNotary<S>> {
        self.notary.clone()
    }

    /// Register a responder to serve signature requests for a party.
    pub fn register_peer(&self, party: PartyId, responder: Arc<dyn ResponderService>) {
        if let Ok(mut peers) = self.peers.write() {
            peers.insert(party, responder);
        }
    }
}

impl<S: KvStore + 'static> Default for LocalNetwork<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S: KvStore> Transport for LocalNetwork<S> {
    async fn request_signature(
        &self,
        to: &PartyId,
        request: SignatureRequest,
    ) -> Result<SignatureResponse, AccordError> {
        let peer = {
            let peers = self.peers.read().map_err(|e| AccordError::Protocol {
                reason: e.to_string(),
            })?;
            peers.get(to).cloned()
        };
        let peer = peer.ok_or_else(|| AccordError::Protocol {
            reason: format!("unknown counterparty {to:?}"),
        })?;
        Ok(peer.handle(request).await)
    }
}

/// Enroll a new party on a local network: generate its keypair,
/// create an empty vault, register the standard partnership
/// responder, and hand back the assembled node.
pub fn enroll_party(network: &Arc<LocalNetwork<MemoryStore>>) -> PartyNode<MemoryStore> {
    let keypair = Arc::new(Keypair::generate());
    let party_id = pubkey_to_party(&keypair.public_key());
    let vault = Arc::new(Vault::new(MemoryStore::new()));

    let responder = Arc::new(partnership_responder(keypair.clone()));
    network.register_peer(party_id, responder);
    network.notary.register_vault(party_id, vault.clone());

    debug!(party = ?party_id, "enrolled party on local network");
    PartyNode::new(
        keypair,
        vault,
        network.clone() as Arc<dyn Transport>,
        network.notary.clone() as Arc<dyn CommitService>,
    )
}
