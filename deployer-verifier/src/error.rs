use crate::{
    codec::{Address, InvalidAddressError, InvalidHashError},
    ChainId,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddressError),
    #[error(transparent)]
    InvalidHash(#[from] InvalidHashError),
    #[error("chain {0} is not supported")]
    UnsupportedChain(String),
    /// Intentionally does not say whether the signature was malformed
    /// or recovered to another signer.
    #[error("could not verify deployer ownership")]
    VerificationFailed,
    #[error("deployer signature is no longer valid")]
    StaleSignature,
    #[error("contract {address} on chain {chain_id} is already added")]
    DuplicateContract { address: Address, chain_id: ChainId },
    #[error("contract {address} on chain {chain_id} was not found")]
    ContractNotFound { address: Address, chain_id: ChainId },
    #[error("deployer {0} is not verified")]
    DeployerNotVerified(Address),
    #[error("record store failure: {0:#}")]
    Store(anyhow::Error),
}
