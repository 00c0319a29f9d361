use super::{ContractDiscoveryClient, DiscoveryError};
use crate::{Address, RawDiscoveredContract};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;
use url::Url;

pub const DEFAULT_OSO_URL: &str = "https://www.opensource.observer/api/v1/graphql";

const DEPLOYED_CONTRACTS_QUERY: &str = r#"query DeployedContracts($deployer: String!) {
  oso_contractsV0(where: { deployerAddress: { _eq: $deployer } }) {
    contractAddress
    contractNamespace
  }
}"#;

/// Discovers deployed contracts through the Open Source Observer GraphQL API.
pub struct OsoClient {
    url: Url,
    api_key: Option<String>,
    client: ClientWithMiddleware,
}

impl OsoClient {
    pub fn new(
        url: Url,
        api_key: Option<String>,
        request_timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, reqwest::Error> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl ContractDiscoveryClient for OsoClient {
    async fn fetch_deployed_contracts(
        &self,
        deployer: &Address,
    ) -> Result<Vec<RawDiscoveredContract>, DiscoveryError> {
        let request = json::GraphQlRequest {
            query: DEPLOYED_CONTRACTS_QUERY,
            variables: json::Variables {
                deployer: deployer.to_lowercase_hex(),
            },
        };
        let mut builder = self.client.post(self.url.clone()).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(DiscoveryError::Status(response.status()));
        }
        let response: json::GraphQlResponse = response
            .json()
            .await
            .map_err(|err| DiscoveryError::InvalidResponse(err.to_string()))?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<_> = errors.into_iter().map(|err| err.message).collect();
            return Err(DiscoveryError::InvalidResponse(messages.join("; ")));
        }
        let contracts = response
            .data
            .ok_or_else(|| DiscoveryError::InvalidResponse("response has no data".into()))?
            .contracts
            .into_iter()
            .map(|contract| {
                RawDiscoveredContract::new(contract.contract_address, contract.contract_namespace)
            })
            .collect();

        Ok(contracts)
    }
}

mod json {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct GraphQlRequest {
        pub query: &'static str,
        pub variables: Variables,
    }

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub deployer: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct GraphQlResponse {
        pub data: Option<Data>,
        pub errors: Option<Vec<GraphQlError>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Data {
        #[serde(rename = "oso_contractsV0")]
        pub contracts: Vec<DeployedContract>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DeployedContract {
        pub contract_address: String,
        pub contract_namespace: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct GraphQlError {
        pub message: String,
    }
}
