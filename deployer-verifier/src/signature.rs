//! Challenge messages and EIP-191 (`personal_sign`) signature checks.
//!
//! Challenges are derived from their inputs only, so the exact signed bytes can be
//! recomputed at confirmation time without storing anything.

use crate::codec::Address;
use ethers_core::types::{Signature, TxHash};

/// Message a deployer signs to prove control of its address for a project.
pub fn challenge(project_id: &str) -> String {
    format!("I verify that I control this deployer address for project {project_id}")
}

/// Message bound to one specific deployment, accepted as an alternative proof
/// when a contract is added manually.
pub fn deployment_challenge(
    project_id: &str,
    contract: &Address,
    chain_id: u64,
    tx_hash: &TxHash,
) -> String {
    format!(
        "I verify that I deployed contract {contract} on chain {chain_id} in transaction {tx_hash:#x} for project {project_id}"
    )
}

/// Returns `true` iff `signature` over `message` recovers to `address`.
///
/// Malformed signatures and signatures of another signer are both reported as
/// `false`.
pub fn verify(address: &Address, message: &str, signature: &[u8]) -> bool {
    let signature = match Signature::try_from(signature) {
        Ok(signature) => signature,
        Err(err) => {
            tracing::debug!(err = %err, "malformed signature");
            return false;
        }
    };
    match signature.recover(message) {
        Ok(signer) => Address::from(signer) == *address,
        Err(err) => {
            tracing::debug!(err = %err, "signature recovery failed");
            false
        }
    }
}
