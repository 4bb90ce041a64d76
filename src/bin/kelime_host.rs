//! Kelime host binary for stdin/stdout JSON communication.
//!
//! Loads settings and the vocabulary store, arms the daily digest alarm, and
//! serves host commands as newline-delimited JSON on stdin/stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use kelime::AppState;
use kelime::host::run_stdio_bridge;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout is reserved for the JSON protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kelime=info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kelime-host starting");

    let app = AppState::bootstrap().map_err(|e| {
        tracing::error!(error = %e, "kelime-host failed to start");
        anyhow::anyhow!("kelime-host failed to start: {e}")
    })?;

    match app.scheduler.ensure_scheduled() {
        Ok(next_fire) => tracing::info!(next_fire = %next_fire, "daily digest scheduled"),
        Err(e) => tracing::warn!(error = %e, "daily digest not scheduled"),
    }

    run_stdio_bridge(app).await.map_err(|e| {
        tracing::error!(error = %e, "kelime-host exited with error");
        anyhow::anyhow!("kelime-host failed: {e}")
    })?;

    tracing::info!("kelime-host shut down cleanly");
    Ok(())
}
