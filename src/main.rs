use anyhow::Result;
use std::sync::Arc;

use sheet_profiler::{build_app, config::Config, logging, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let config = Config::from_env()?;
    let addr = config.bind_addr;

    let state = Arc::new(AppState::new(config)?);
    state.charts.prepare()?;
    tracing::info!(
        "Charts under {}, uploads under {}",
        state.charts.static_root().display(),
        state.charts.upload_dir().display()
    );

    let app = build_app(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
