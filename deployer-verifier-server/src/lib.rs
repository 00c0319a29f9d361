mod api_error;
mod handlers;
mod metrics;
mod routers;
mod run;
mod settings;
mod tracer;

pub use api_error::{ApiError, ErrorResponse};
pub use routers::{configure_router, AppRouter, Router};
pub use run::run;
pub use settings::{
    DiscoverySettings, MetricsSettings, OsoSettings, ReconciliationSettings, ServerSettings,
    Settings, StaticContractSettings, StaticDiscoverySettings,
};
pub use tracer::init_logs;
