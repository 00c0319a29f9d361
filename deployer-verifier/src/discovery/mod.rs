mod fixture;
mod oso;

pub use fixture::StaticDiscoveryClient;
pub use oso::{OsoClient, DEFAULT_OSO_URL};

use crate::{Address, RawDiscoveredContract};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("indexer request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("indexer responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("indexer returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("indexer did not respond within {0:?}")]
    Timeout(Duration),
    #[error("discovery was cancelled")]
    Cancelled,
    #[error("discovery is unavailable: {0}")]
    Unavailable(String),
}

/// Source of contracts deployed by an address.
///
/// An empty result is a valid answer meaning the deployer has no discoverable
/// contracts. Implementations return raw indexer data; normalization happens
/// during reconciliation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContractDiscoveryClient: Send + Sync {
    async fn fetch_deployed_contracts(
        &self,
        deployer: &Address,
    ) -> Result<Vec<RawDiscoveredContract>, DiscoveryError>;
}
