pub mod chains;
pub mod codec;
pub mod discovery;
pub mod manual;
pub mod reconcile;
pub mod signature;
pub mod store;

mod error;
mod metrics;
mod service;
mod types;

pub use chains::{resolve_chain, supported_chain, ChainId, SupportedChain, SUPPORTED_CHAINS};
pub use codec::{
    canonicalize, equal_address, parse_tx_hash, Address, InvalidAddressError, InvalidHashError,
};
pub use discovery::{ContractDiscoveryClient, DiscoveryError, OsoClient, StaticDiscoveryClient};
pub use error::Error;
pub use manual::{ManualContractRequest, ValidatedManualContract};
pub use reconcile::{reconcile, Reconciliation};
pub use service::{
    DeployerVerificationService, DeployerView, DiscoveryStatus, VerificationChallenge,
    VerifiedDeployer,
};
pub use store::{ContractRecordStore, InMemoryRecordStore};
pub use types::{
    Contract, ContractKey, Deployer, Provenance, RawDiscoveredContract, VerificationState,
};

pub use ethers_core::types::TxHash;
