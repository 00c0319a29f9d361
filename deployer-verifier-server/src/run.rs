use crate::{configure_router, metrics::Metrics, AppRouter, Settings};
use actix_web::{App, HttpServer};
use futures::future;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let socket_addr = settings.server.addr;
    let metrics_settings = settings.metrics.clone();

    tracing::info!(addr = %socket_addr, "deployer verifier server is starting");
    let app_router = Arc::new(AppRouter::new(settings)?);
    let metrics = Metrics::new(&metrics_settings.route)?;
    let server_future = {
        let middleware = metrics.middleware().clone();
        HttpServer::new(move || {
            App::new()
                .wrap(TracingLogger::default())
                .wrap(middleware.clone())
                .configure(configure_router(&*app_router))
        })
        .bind(socket_addr)?
        .run()
    };
    let server_future = tokio::spawn(server_future);

    if metrics_settings.enabled {
        tracing::info!(addr = %metrics_settings.addr, "metrics server is starting");
        let metrics_future = tokio::spawn(metrics.run_server(metrics_settings.addr)?);
        let (server_result, metrics_result) =
            future::try_join(server_future, metrics_future).await?;
        server_result?;
        metrics_result?;
    } else {
        server_future.await??;
    }
    Ok(())
}
