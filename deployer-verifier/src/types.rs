use crate::{codec::Address, ChainId};
use chrono::{DateTime, Utc};
use ethers_core::types::TxHash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Discovered,
    Manual,
}

/// Uniqueness key of a contract within one deployer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractKey {
    pub address: Address,
    pub chain_id: ChainId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub address: Address,
    pub chain_id: ChainId,
    /// Excluded contracts are kept but do not count as eligibility evidence.
    pub excluded: bool,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl Contract {
    /// Indexer results have to be explicitly accepted, so they start excluded.
    pub fn discovered(address: Address, chain_id: ChainId) -> Self {
        Self {
            address,
            chain_id,
            excluded: true,
            provenance: Provenance::Discovered,
            tx_hash: None,
        }
    }

    pub fn manual(address: Address, chain_id: ChainId, tx_hash: TxHash) -> Self {
        Self {
            address,
            chain_id,
            excluded: false,
            provenance: Provenance::Manual,
            tx_hash: Some(tx_hash),
        }
    }

    pub fn key(&self) -> ContractKey {
        ContractKey {
            address: self.address,
            chain_id: self.chain_id.clone(),
        }
    }

    pub fn is_on_supported_chain(&self) -> bool {
        self.chain_id.is_supported()
    }

    /// Folds another record with the same key into this one.
    ///
    /// The result is excluded only if both records are excluded, and a
    /// `manual` provenance is never replaced.
    pub fn merge(&mut self, other: Contract) {
        debug_assert_eq!(self.key(), other.key());
        self.excluded = self.excluded && other.excluded;
        if other.provenance == Provenance::Manual {
            self.provenance = Provenance::Manual;
        }
        if self.tx_hash.is_none() {
            self.tx_hash = other.tx_hash;
        }
    }
}

/// Contract as reported by the indexer, before any normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDiscoveredContract {
    pub contract_address: String,
    pub namespace: String,
}

impl RawDiscoveredContract {
    pub fn new(contract_address: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            namespace: namespace.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    #[default]
    Unverified,
    PendingSignature,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployer {
    pub address: Address,
    pub state: VerificationState,
    /// Network the ownership signature was produced on. Display only.
    pub signature_chain_id: Option<u64>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl Deployer {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: VerificationState::Unverified,
            signature_chain_id: None,
            verified_at: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.state == VerificationState::Verified
    }

    pub(crate) fn mark_verified(&mut self, signature_chain_id: u64) {
        self.state = VerificationState::Verified;
        self.signature_chain_id = Some(signature_chain_id);
        self.verified_at.get_or_insert_with(Utc::now);
    }
}
