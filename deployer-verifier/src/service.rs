use crate::{
    codec::{canonicalize, Address},
    discovery::{ContractDiscoveryClient, DiscoveryError},
    manual::ManualContractRequest,
    metrics,
    reconcile::{reconcile, Reconciliation},
    signature, supported_chain, ChainId, Contract, ContractRecordStore, Deployer, Error,
    RawDiscoveredContract, VerificationState,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Message the deployer has to sign, together with what it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationChallenge {
    pub project_id: String,
    pub address: Address,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Available { discovered: usize, dropped: usize },
    /// Contracts are the persisted ones only; the caller may retry later.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedDeployer {
    pub deployer: Deployer,
    pub contracts: Vec<Contract>,
    pub discovery: DiscoveryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployerView {
    pub deployer: Deployer,
    pub contracts: Vec<Contract>,
}

/// Deployer ownership verification and contract reconciliation.
///
/// Holds no per-request state: everything is loaded from and written to the
/// record store within a single call.
pub struct DeployerVerificationService {
    discovery: Arc<dyn ContractDiscoveryClient>,
    store: Arc<dyn ContractRecordStore>,
    discovery_timeout: Duration,
}

impl DeployerVerificationService {
    pub fn new(
        discovery: Arc<dyn ContractDiscoveryClient>,
        store: Arc<dyn ContractRecordStore>,
    ) -> Self {
        Self {
            discovery,
            store,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn begin_verification(
        &self,
        project_id: &str,
        address: &str,
    ) -> Result<VerificationChallenge, Error> {
        let address = canonicalize(address)?;
        let mut deployer = self.load_deployer(project_id, &address).await?;
        if !deployer.is_verified() {
            deployer.state = VerificationState::PendingSignature;
            self.save_deployer(project_id, &deployer).await?;
        }

        Ok(VerificationChallenge {
            project_id: project_id.to_string(),
            address,
            message: signature::challenge(project_id),
        })
    }

    pub async fn confirm_verification(
        &self,
        project_id: &str,
        address: &str,
        signature: &[u8],
        chain_id: u64,
    ) -> Result<VerifiedDeployer, Error> {
        self.confirm_verification_with_cancellation(
            project_id,
            address,
            signature,
            chain_id,
            &CancellationToken::new(),
        )
        .await
    }

    /// Checks the deployer signed the project challenge and, on success, runs
    /// discovery. Any rejection leaves a not yet verified deployer `Unverified`.
    #[instrument(skip(self, signature, cancel), level = "debug")]
    pub async fn confirm_verification_with_cancellation(
        &self,
        project_id: &str,
        address: &str,
        signature: &[u8],
        chain_id: u64,
        cancel: &CancellationToken,
    ) -> Result<VerifiedDeployer, Error> {
        let address = canonicalize(address)?;
        let mut deployer = self.load_deployer(project_id, &address).await?;

        let checked = match supported_chain(chain_id) {
            None => Err(Error::UnsupportedChain(chain_id.to_string())),
            Some(chain) => {
                let message = signature::challenge(project_id);
                if signature::verify(&address, &message, signature) {
                    Ok(chain.id)
                } else {
                    Err(Error::VerificationFailed)
                }
            }
        };
        let chain_id = match checked {
            Ok(chain_id) => chain_id,
            Err(err) => {
                metrics::count_verification(false);
                tracing::info!(
                    project_id,
                    deployer = %address,
                    err = %err,
                    "deployer verification failed"
                );
                if !deployer.is_verified() {
                    deployer.state = VerificationState::Unverified;
                    self.save_deployer(project_id, &deployer).await?;
                }
                return Err(err);
            }
        };

        metrics::count_verification(true);
        tracing::info!(project_id, deployer = %address, chain_id, "deployer verified");
        deployer.mark_verified(chain_id);
        self.save_deployer(project_id, &deployer).await?;

        self.discover_and_merge(project_id, deployer, cancel).await
    }

    pub async fn reconcile(
        &self,
        project_id: &str,
        deployer: &str,
    ) -> Result<VerifiedDeployer, Error> {
        self.reconcile_with_cancellation(project_id, deployer, &CancellationToken::new())
            .await
    }

    /// Re-runs discovery for a verified deployer and merges the result with
    /// its persisted contracts.
    #[instrument(skip(self, cancel), level = "debug")]
    pub async fn reconcile_with_cancellation(
        &self,
        project_id: &str,
        deployer: &str,
        cancel: &CancellationToken,
    ) -> Result<VerifiedDeployer, Error> {
        let address = canonicalize(deployer)?;
        let deployer = self.load_deployer(project_id, &address).await?;
        if !deployer.is_verified() {
            return Err(Error::DeployerNotVerified(address));
        }
        self.discover_and_merge(project_id, deployer, cancel).await
    }

    #[instrument(skip(self, request), fields(project_id = %request.project_id), level = "debug")]
    pub async fn add_manual_contract(
        &self,
        request: ManualContractRequest,
    ) -> Result<Contract, Error> {
        let validated = request.validate()?;
        if !validated.signature_is_valid(&request.signature) {
            tracing::info!(
                deployer = %validated.deployer,
                "stale deployer signature on manual contract submission"
            );
            return Err(Error::StaleSignature);
        }

        let project_id = validated.project_id.as_str();
        let contract = Contract::manual(validated.contract, validated.chain(), validated.tx_hash);
        let persisted = self.load_contracts(project_id, &validated.deployer).await?;
        if persisted.iter().any(|existing| existing.key() == contract.key()) {
            return Err(Error::DuplicateContract {
                address: contract.address,
                chain_id: contract.chain_id,
            });
        }

        let mut deployer = self.load_deployer(project_id, &validated.deployer).await?;
        if !deployer.is_verified() {
            deployer.mark_verified(validated.chain_id);
            self.save_deployer(project_id, &deployer).await?;
        }

        self.store
            .upsert(project_id, &validated.deployer, std::slice::from_ref(&contract))
            .await
            .map_err(Error::Store)?;

        tracing::info!(
            deployer = %validated.deployer,
            contract = %contract.address,
            chain_id = %contract.chain_id,
            "manual contract added"
        );
        Ok(contract)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn toggle_exclusion(
        &self,
        project_id: &str,
        deployer: &str,
        contract: &str,
        chain_id: ChainId,
    ) -> Result<Contract, Error> {
        let deployer = canonicalize(deployer)?;
        let address = canonicalize(contract)?;
        let mut contract = self
            .load_contracts(project_id, &deployer)
            .await?
            .into_iter()
            .find(|contract| contract.address == address && contract.chain_id == chain_id)
            .ok_or(Error::ContractNotFound { address, chain_id })?;

        contract.excluded = !contract.excluded;
        self.store
            .upsert(project_id, &deployer, std::slice::from_ref(&contract))
            .await
            .map_err(Error::Store)?;
        Ok(contract)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn remove_deployer(&self, project_id: &str, deployer: &str) -> Result<(), Error> {
        let deployer = canonicalize(deployer)?;
        self.store
            .remove_deployer(project_id, &deployer)
            .await
            .map_err(Error::Store)?;
        tracing::info!(project_id, deployer = %deployer, "deployer removed");
        Ok(())
    }

    pub async fn get_deployer(
        &self,
        project_id: &str,
        deployer: &str,
    ) -> Result<DeployerView, Error> {
        let address = canonicalize(deployer)?;
        Ok(DeployerView {
            deployer: self.load_deployer(project_id, &address).await?,
            contracts: self.load_contracts(project_id, &address).await?,
        })
    }

    /// Persisted contracts are read only after discovery returns, and the
    /// discovered ones are merged into the store in a single write, so toggles
    /// and removals made while the indexer is queried are not overwritten.
    async fn discover_and_merge(
        &self,
        project_id: &str,
        deployer: Deployer,
        cancel: &CancellationToken,
    ) -> Result<VerifiedDeployer, Error> {
        let discovered = match self.discover(&deployer.address, cancel).await {
            Ok(discovered) => discovered,
            Err(err) => {
                tracing::warn!(
                    project_id,
                    deployer = %deployer.address,
                    err = %err,
                    "contract discovery failed, returning persisted contracts"
                );
                return Ok(VerifiedDeployer {
                    contracts: self.load_contracts(project_id, &deployer.address).await?,
                    deployer,
                    discovery: DiscoveryStatus::Unavailable {
                        reason: err.to_string(),
                    },
                });
            }
        };

        let discovered_count = discovered.len();
        let Reconciliation { contracts, dropped } = reconcile(Vec::new(), discovered);
        let contracts = self
            .store
            .merge(project_id, &deployer.address, contracts)
            .await
            .map_err(Error::Store)?
            .ok_or(Error::DeployerNotVerified(deployer.address))?;

        Ok(VerifiedDeployer {
            deployer,
            contracts,
            discovery: DiscoveryStatus::Available {
                discovered: discovered_count,
                dropped: dropped.len(),
            },
        })
    }

    async fn discover(
        &self,
        deployer: &Address,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawDiscoveredContract>, DiscoveryError> {
        let fetch = tokio::time::timeout(
            self.discovery_timeout,
            self.discovery.fetch_deployed_contracts(deployer),
        );
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DiscoveryError::Cancelled),
            result = fetch => {
                result.unwrap_or(Err(DiscoveryError::Timeout(self.discovery_timeout)))
            }
        };

        let status = match &result {
            Ok(_) => "ok",
            Err(DiscoveryError::Cancelled) => "cancelled",
            Err(DiscoveryError::Timeout(_)) => "timeout",
            Err(_) => "fail",
        };
        metrics::count_discovery(status);
        result
    }

    async fn load_deployer(&self, project_id: &str, address: &Address) -> Result<Deployer, Error> {
        Ok(self
            .store
            .load_deployer(project_id, address)
            .await
            .map_err(Error::Store)?
            .unwrap_or_else(|| Deployer::new(*address)))
    }

    async fn save_deployer(&self, project_id: &str, deployer: &Deployer) -> Result<(), Error> {
        self.store
            .save_deployer(project_id, deployer)
            .await
            .map_err(Error::Store)
    }

    async fn load_contracts(
        &self,
        project_id: &str,
        deployer: &Address,
    ) -> Result<Vec<Contract>, Error> {
        self.store
            .load(project_id, deployer)
            .await
            .map_err(Error::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{discovery::MockContractDiscoveryClient, InMemoryRecordStore};
    use async_trait::async_trait;
    use ethers::signers::{LocalWallet, Signer};
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    const PRIVATE_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const PROJECT: &str = "project";
    const CONTRACT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    struct Stalled;

    #[async_trait]
    impl ContractDiscoveryClient for Stalled {
        async fn fetch_deployed_contracts(
            &self,
            _deployer: &Address,
        ) -> Result<Vec<RawDiscoveredContract>, DiscoveryError> {
            std::future::pending().await
        }
    }

    /// Reports `entered` once queried and answers only after `release`.
    #[derive(Default)]
    struct Gated {
        entered: Arc<Notify>,
        release: Arc<Notify>,
        contracts: Vec<RawDiscoveredContract>,
    }

    #[async_trait]
    impl ContractDiscoveryClient for Gated {
        async fn fetch_deployed_contracts(
            &self,
            _deployer: &Address,
        ) -> Result<Vec<RawDiscoveredContract>, DiscoveryError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.contracts.clone())
        }
    }

    fn wallet() -> LocalWallet {
        PRIVATE_KEY.parse().unwrap()
    }

    async fn project_signature(wallet: &LocalWallet) -> Vec<u8> {
        wallet
            .sign_message(signature::challenge(PROJECT))
            .await
            .unwrap()
            .to_vec()
    }

    async fn store_with(deployer: &Deployer, contracts: &[Contract]) -> Arc<InMemoryRecordStore> {
        let store = Arc::new(InMemoryRecordStore::new());
        store.save_deployer(PROJECT, deployer).await.unwrap();
        store
            .upsert(PROJECT, &deployer.address, contracts)
            .await
            .unwrap();
        store
    }

    fn verified_deployer() -> Deployer {
        let mut deployer = Deployer::new(Address::from(wallet().address()));
        deployer.mark_verified(10);
        deployer
    }

    #[tokio::test]
    async fn discovery_runs_on_every_confirmation_without_duplicates() {
        let wallet = wallet();
        let deployer = Address::from(wallet.address()).to_checksum();
        let mut discovery = MockContractDiscoveryClient::new();
        discovery
            .expect_fetch_deployed_contracts()
            .times(2)
            .returning(|_| Ok(vec![RawDiscoveredContract::new(CONTRACT, "BASE")]));
        let store = Arc::new(InMemoryRecordStore::new());
        let service = DeployerVerificationService::new(Arc::new(discovery), store.clone());
        let signature = project_signature(&wallet).await;

        let first = service
            .confirm_verification(PROJECT, &deployer, &signature, 10)
            .await
            .unwrap();
        let second = service
            .confirm_verification(PROJECT, &deployer, &signature, 10)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.contracts.len(), 1);
        assert_eq!(
            store
                .load(PROJECT, &canonicalize(&deployer).unwrap())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn failed_confirmation_does_not_call_discovery() {
        let wallet = wallet();
        let deployer = Address::from(wallet.address()).to_checksum();
        let mut discovery = MockContractDiscoveryClient::new();
        discovery.expect_fetch_deployed_contracts().never();
        let service = DeployerVerificationService::new(
            Arc::new(discovery),
            Arc::new(InMemoryRecordStore::new()),
        );

        let err = service
            .confirm_verification(PROJECT, &deployer, &[1, 2, 3], 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VerificationFailed));
        assert_eq!(err.to_string(), "could not verify deployer ownership");
    }

    #[tokio::test]
    async fn unsupported_signature_chain_resets_pending_deployer() {
        let wallet = wallet();
        let deployer = Address::from(wallet.address()).to_checksum();
        let mut discovery = MockContractDiscoveryClient::new();
        discovery.expect_fetch_deployed_contracts().never();
        let service = DeployerVerificationService::new(
            Arc::new(discovery),
            Arc::new(InMemoryRecordStore::new()),
        );
        let signature = project_signature(&wallet).await;

        service.begin_verification(PROJECT, &deployer).await.unwrap();
        let err = service
            .confirm_verification(PROJECT, &deployer, &signature, 424242)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedChain(_)));
        let view = service.get_deployer(PROJECT, &deployer).await.unwrap();
        assert_eq!(view.deployer.state, VerificationState::Unverified);
        assert_eq!(view.deployer.signature_chain_id, None);
    }

    #[tokio::test]
    async fn unsupported_signature_chain_keeps_verified_deployer() {
        let deployer = verified_deployer();
        let service = DeployerVerificationService::new(
            Arc::new(MockContractDiscoveryClient::new()),
            store_with(&deployer, &[]).await,
        );
        let signature = project_signature(&wallet()).await;

        let err = service
            .confirm_verification(PROJECT, &deployer.address.to_checksum(), &signature, 424242)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedChain(_)));
        let view = service
            .get_deployer(PROJECT, &deployer.address.to_checksum())
            .await
            .unwrap();
        assert_eq!(view.deployer, deployer);
    }

    #[tokio::test]
    async fn slow_discovery_degrades_to_persisted_contracts() {
        let wallet = wallet();
        let deployer = Deployer::new(Address::from(wallet.address()));
        let persisted = Contract::manual(
            canonicalize("0xcccccccccccccccccccccccccccccccccccccccc").unwrap(),
            ChainId::Supported(10),
            crate::TxHash::repeat_byte(7),
        );
        let store = store_with(&deployer, &[persisted.clone()]).await;
        let service = DeployerVerificationService::new(Arc::new(Stalled), store)
            .with_discovery_timeout(Duration::from_millis(50));

        let result = service
            .confirm_verification(
                PROJECT,
                &deployer.address.to_checksum(),
                &project_signature(&wallet).await,
                10,
            )
            .await
            .unwrap();

        assert_eq!(result.contracts, vec![persisted]);
        assert!(result.deployer.is_verified());
        assert!(matches!(
            result.discovery,
            DiscoveryStatus::Unavailable { reason } if reason.starts_with("indexer did not respond")
        ));
    }

    #[tokio::test]
    async fn cancelled_discovery_degrades_to_persisted_contracts() {
        let wallet = wallet();
        let deployer = Address::from(wallet.address()).to_checksum();
        let service = DeployerVerificationService::new(
            Arc::new(Stalled),
            Arc::new(InMemoryRecordStore::new()),
        );
        let cancel = CancellationToken::new();
        let signature = project_signature(&wallet).await;

        let confirmation = service.confirm_verification_with_cancellation(
            PROJECT, &deployer, &signature, 10, &cancel,
        );
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(confirmation, canceller);
        let result = result.unwrap();

        assert!(result.contracts.is_empty());
        assert_eq!(
            result.discovery,
            DiscoveryStatus::Unavailable {
                reason: "discovery was cancelled".into()
            }
        );
    }

    #[tokio::test]
    async fn toggle_during_discovery_is_kept() {
        let deployer = verified_deployer();
        let excluded =
            Contract::discovered(canonicalize(CONTRACT).unwrap(), ChainId::Supported(10));
        let store = store_with(&deployer, &[excluded]).await;
        let discovery = Gated {
            contracts: vec![RawDiscoveredContract::new(CONTRACT, "OPTIMISM")],
            ..Default::default()
        };
        let (entered, release) = (discovery.entered.clone(), discovery.release.clone());
        let service = DeployerVerificationService::new(Arc::new(discovery), store.clone());
        let address = deployer.address.to_checksum();

        let toggle = async {
            entered.notified().await;
            let toggled = service
                .toggle_exclusion(PROJECT, &address, CONTRACT, ChainId::Supported(10))
                .await
                .unwrap();
            release.notify_one();
            toggled
        };
        let (reconciled, toggled) = tokio::join!(service.reconcile(PROJECT, &address), toggle);
        let reconciled = reconciled.unwrap();

        assert!(!toggled.excluded);
        assert_eq!(reconciled.contracts, vec![toggled]);
        assert_eq!(
            store.load(PROJECT, &deployer.address).await.unwrap(),
            reconciled.contracts
        );
    }

    #[tokio::test]
    async fn removal_during_discovery_is_kept() {
        let deployer = verified_deployer();
        let store = store_with(&deployer, &[]).await;
        let discovery = Gated {
            contracts: vec![RawDiscoveredContract::new(CONTRACT, "OPTIMISM")],
            ..Default::default()
        };
        let (entered, release) = (discovery.entered.clone(), discovery.release.clone());
        let service = DeployerVerificationService::new(Arc::new(discovery), store.clone());
        let address = deployer.address.to_checksum();

        let removal = async {
            entered.notified().await;
            service.remove_deployer(PROJECT, &address).await.unwrap();
            release.notify_one();
        };
        let (reconciled, ()) = tokio::join!(service.reconcile(PROJECT, &address), removal);

        assert!(matches!(
            reconciled.unwrap_err(),
            Error::DeployerNotVerified(removed) if removed == deployer.address
        ));
        assert!(store.load(PROJECT, &deployer.address).await.unwrap().is_empty());
        assert_eq!(
            store.load_deployer(PROJECT, &deployer.address).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn reconcile_requires_verified_deployer() {
        let service = DeployerVerificationService::new(
            Arc::new(MockContractDiscoveryClient::new()),
            Arc::new(InMemoryRecordStore::new()),
        );
        service
            .begin_verification(PROJECT, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
            .await
            .unwrap();

        let err = service
            .reconcile(PROJECT, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeployerNotVerified(_)));
    }
}
