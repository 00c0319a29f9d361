use super::{
    deployers::DeployersRouter,
    router::{configure_router, Router},
};
use crate::{
    handlers::status,
    settings::{DiscoverySettings, Settings},
};
use actix_web::web;
use deployer_verifier::{
    canonicalize, ContractDiscoveryClient, DeployerVerificationService, InMemoryRecordStore,
    OsoClient, RawDiscoveredContract, StaticDiscoveryClient,
};
use std::{sync::Arc, time::Duration};

pub struct AppRouter {
    deployers: DeployersRouter,
}

impl AppRouter {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let discovery = discovery_client(settings.discovery)?;
        let store = Arc::new(InMemoryRecordStore::new());
        let service = DeployerVerificationService::new(discovery, store).with_discovery_timeout(
            Duration::from_secs(settings.reconciliation.discovery_timeout),
        );
        Ok(Self {
            deployers: DeployersRouter::new(service),
        })
    }
}

fn discovery_client(
    settings: DiscoverySettings,
) -> anyhow::Result<Arc<dyn ContractDiscoveryClient>> {
    let client: Arc<dyn ContractDiscoveryClient> = match settings {
        DiscoverySettings::Oso(settings) => Arc::new(OsoClient::new(
            settings.url,
            settings.api_key,
            Duration::from_secs(settings.request_timeout),
            settings.max_retries,
        )?),
        DiscoverySettings::Static(settings) => {
            let mut client = StaticDiscoveryClient::new();
            for (deployer, contracts) in settings.deployers {
                let contracts = contracts.into_iter().map(|contract| {
                    RawDiscoveredContract::new(contract.contract_address, contract.namespace)
                });
                client = client.with_deployer(canonicalize(&deployer)?, contracts);
            }
            Arc::new(client)
        }
    };
    Ok(client)
}

impl Router for AppRouter {
    fn register_routes(&self, service_config: &mut web::ServiceConfig) {
        service_config
            .route("/health", web::get().to(status::status))
            .service(
                web::scope("/api/v1/projects/{project_id}/deployers")
                    .configure(configure_router(&self.deployers)),
            );
    }
}
