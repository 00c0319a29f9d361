use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, prelude::*};

pub fn init_logs() -> anyhow::Result<()> {
    let stdout = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy(),
    );
    tracing_subscriber::registry()
        // output logs (tracing) to stdout with log level taken from env (default is INFO)
        .with(stdout)
        .try_init()?;
    Ok(())
}
