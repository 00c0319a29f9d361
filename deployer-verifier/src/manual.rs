//! Manual contract entry for deployments the indexer does not know about
//! (too recent, or deployed through a factory or relayer).

use crate::{
    codec::{canonicalize, parse_tx_hash, Address},
    signature, supported_chain, ChainId, Error, TxHash,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualContractRequest {
    pub project_id: String,
    pub deployer_address: String,
    pub contract_address: String,
    pub tx_hash: String,
    pub chain_id: u64,
    /// Ownership signature previously produced by the deployer.
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedManualContract {
    pub project_id: String,
    pub deployer: Address,
    pub contract: Address,
    pub tx_hash: TxHash,
    pub chain_id: u64,
}

impl ManualContractRequest {
    /// Checks every input that has to be valid before the request may be submitted.
    /// Does not touch the signature.
    pub fn validate(&self) -> Result<ValidatedManualContract, Error> {
        let deployer = canonicalize(&self.deployer_address)?;
        let contract = canonicalize(&self.contract_address)?;
        let tx_hash = parse_tx_hash(&self.tx_hash)?;
        let chain = supported_chain(self.chain_id)
            .ok_or_else(|| Error::UnsupportedChain(self.chain_id.to_string()))?;

        Ok(ValidatedManualContract {
            project_id: self.project_id.clone(),
            deployer,
            contract,
            tx_hash,
            chain_id: chain.id,
        })
    }
}

impl ValidatedManualContract {
    pub fn chain(&self) -> ChainId {
        ChainId::Supported(self.chain_id)
    }

    /// The signature has to prove control of the deployer either through the
    /// project challenge or through the challenge bound to this deployment.
    pub fn signature_is_valid(&self, signature: &[u8]) -> bool {
        let project_challenge = signature::challenge(&self.project_id);
        if signature::verify(&self.deployer, &project_challenge, signature) {
            return true;
        }
        let deployment_challenge = signature::deployment_challenge(
            &self.project_id,
            &self.contract,
            self.chain_id,
            &self.tx_hash,
        );
        signature::verify(&self.deployer, &deployment_challenge, signature)
    }
}
