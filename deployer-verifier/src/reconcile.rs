//! Merges persisted and freshly discovered contracts of a single deployer.
//!
//! The merge is a pure function of its inputs: output is ordered by
//! (address, chain) so reconciling the same inputs twice gives identical results.

use crate::{
    codec::canonicalize, metrics, resolve_chain, Contract, ContractKey, RawDiscoveredContract,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub contracts: Vec<Contract>,
    /// Indexer entries whose address could not be canonicalized.
    pub dropped: Vec<RawDiscoveredContract>,
}

pub fn reconcile(
    persisted: impl IntoIterator<Item = Contract>,
    discovered: impl IntoIterator<Item = RawDiscoveredContract>,
) -> Reconciliation {
    let mut contracts: BTreeMap<ContractKey, Contract> = BTreeMap::new();
    for contract in persisted {
        insert_or_merge(&mut contracts, contract);
    }

    let mut dropped = Vec::new();
    for raw in discovered {
        let address = match canonicalize(&raw.contract_address) {
            Ok(address) => address,
            Err(err) => {
                tracing::warn!(
                    err = %err,
                    namespace = %raw.namespace,
                    "dropping discovered contract with malformed address"
                );
                metrics::DROPPED_DISCOVERED_CONTRACTS.inc();
                dropped.push(raw);
                continue;
            }
        };
        let chain_id = resolve_chain(&raw.namespace);
        if !chain_id.is_supported() {
            tracing::debug!(
                address = %address,
                namespace = %raw.namespace,
                "discovered contract is on an unsupported chain"
            );
        }
        insert_or_merge(&mut contracts, Contract::discovered(address, chain_id));
    }

    Reconciliation {
        contracts: contracts.into_values().collect(),
        dropped,
    }
}

fn insert_or_merge(contracts: &mut BTreeMap<ContractKey, Contract>, contract: Contract) {
    match contracts.get_mut(&contract.key()) {
        Some(existing) => existing.merge(contract),
        None => {
            contracts.insert(contract.key(), contract);
        }
    }
}
