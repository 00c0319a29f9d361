use anyhow::Context;
use deployer_verifier_server::{init_logs, run, Settings};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new().context("failed to parse config")?;
    init_logs()?;
    run(settings).await
}
