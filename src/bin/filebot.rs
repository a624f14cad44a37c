//! filebot -- HTTP service for sandboxed file commands.
//!
//! The allowed root is the working directory. See `FilebotConfig` for the
//! environment variables read at startup.

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let root = std::env::current_dir()
        .and_then(|dir| dir.canonicalize())
        .context("failed to resolve working directory")?;

    let config = filebot::FilebotConfig::from_env(root)?;

    filebot::http::serve(config).await
}
