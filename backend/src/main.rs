use anyhow::Context;
use canvas_chat::{Settings, configure_app, init_environment};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_environment(None);

    let settings = Settings::parse();
    let app = match configure_app(&settings) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "refusing to start");
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    let addr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Server running at http://{}", listener.local_addr()?);
    info!("API endpoint available at http://{}/api/chat", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
