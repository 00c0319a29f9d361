use super::{ContractDiscoveryClient, DiscoveryError};
use crate::{Address, RawDiscoveredContract};
use async_trait::async_trait;
use std::collections::HashMap;

/// Discovery client answering from a fixed set of deployments.
///
/// Used for local runs and tests instead of a real indexer.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscoveryClient {
    deployments: HashMap<Address, Vec<RawDiscoveredContract>>,
    unavailable: Option<String>,
}

impl StaticDiscoveryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client for which every request fails, as if the indexer were down.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            deployments: HashMap::new(),
            unavailable: Some(reason.into()),
        }
    }

    pub fn with_deployer(
        mut self,
        deployer: Address,
        contracts: impl IntoIterator<Item = RawDiscoveredContract>,
    ) -> Self {
        self.deployments
            .entry(deployer)
            .or_default()
            .extend(contracts);
        self
    }
}

#[async_trait]
impl ContractDiscoveryClient for StaticDiscoveryClient {
    async fn fetch_deployed_contracts(
        &self,
        deployer: &Address,
    ) -> Result<Vec<RawDiscoveredContract>, DiscoveryError> {
        if let Some(reason) = &self.unavailable {
            return Err(DiscoveryError::Unavailable(reason.clone()));
        }
        Ok(self
            .deployments
            .get(deployer)
            .cloned()
            .unwrap_or_default())
    }
}
