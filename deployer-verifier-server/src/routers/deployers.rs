use super::router::Router;
use crate::handlers::deployers;
use actix_web::web;
use deployer_verifier::DeployerVerificationService;

pub struct DeployersRouter {
    service: web::Data<DeployerVerificationService>,
}

impl DeployersRouter {
    pub fn new(service: DeployerVerificationService) -> Self {
        Self {
            service: web::Data::new(service),
        }
    }
}

impl Router for DeployersRouter {
    fn register_routes(&self, service_config: &mut web::ServiceConfig) {
        service_config.app_data(self.service.clone()).service(
            web::scope("/{address}")
                .route("", web::get().to(deployers::get_deployer))
                .route("", web::delete().to(deployers::remove_deployer))
                .route("/challenge", web::post().to(deployers::begin_verification))
                .route("/verify", web::post().to(deployers::confirm_verification))
                .route("/reconcile", web::post().to(deployers::reconcile))
                .route("/contracts", web::post().to(deployers::add_manual_contract))
                .route(
                    "/contracts/{chain_id}/{contract}/toggle-exclusion",
                    web::post().to(deployers::toggle_exclusion),
                ),
        );
    }
}
